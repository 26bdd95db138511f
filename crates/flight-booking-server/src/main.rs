//! Server implementation

#![warn(missing_docs)]

use flight_booking_core::{Config, RequestHandler};
use flight_booking_server::udp::UdpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the flight booking service
    config: Config,

    /// Port for the UDP server to listen on
    port: u16,
    /// Host for the UDP server to listen on
    host: String,
}

impl Opts {
    fn from_args() -> Self {
        let mut opts = Opts {
            port: 8888,
            host: String::from("0.0.0.0"),
            config: Config::default(),
        };

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option {
                match opt.as_str() {
                    "-port" => opts.port = arg.parse().expect("-port takes a decimal u16"),
                    "-host" => opts.host = arg,
                    "-queue-capacity" => {
                        opts.config.queue_capacity = arg
                            .parse()
                            .expect("-queue-capacity takes a decimal usize")
                    }
                    "-cache-ttl" => {
                        opts.config.cache_ttl_secs =
                            arg.parse().expect("-cache-ttl takes seconds as a decimal u64")
                    }
                    "-cache-capacity" => {
                        opts.config.cache_capacity = arg
                            .parse()
                            .expect("-cache-capacity takes a decimal usize")
                    }
                    "-notifier-threads" => {
                        opts.config.notifier_threads = arg
                            .parse()
                            .expect("-notifier-threads takes a decimal u32")
                    }
                    "-seats" => {
                        opts.config.seat_capacity = arg.parse().expect("-seats takes a decimal u32")
                    }
                    "-seed" => {
                        opts.config.rng_seed = Some(arg.parse().expect("-seed takes a decimal u64"))
                    }
                    _ => {
                        eprintln!("Error: ignoring unknown option {opt}");
                        std::process::exit(1);
                    }
                }
                option = None;
            } else {
                option = Some(arg);
            }
        }
        if let Some(opt) = option {
            eprintln!("Error: ignoring leftover option {opt}");
            std::process::exit(1);
        }

        opts
    }
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::from_args();

    let server = UdpServer::bind((opts.host.as_str(), opts.port), opts.config.queue_capacity)?;
    let balancer = flight_booking_engine::launch(&opts.config)?;
    info!(addr = %server.local_addr()?, "server started");

    server.serve(&balancer)?;
    balancer.shutdown();
    Ok(())
}
