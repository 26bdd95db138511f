use eyre::Result;
use flight_booking_core::Config;
use flight_booking_engine::Balancer;
use project_settings::ProjectSettings;

mod api;
mod project_settings;
pub use api::{parse_response, Api, ApiError, ApiResponse, FlightInfo, UserSession};
pub use project_settings::Transport;

pub struct TestCtxBuilder {
    /// How requests reach the service
    pub transport: Transport,
    /// Seats per seeded flight
    pub seats: u32,
    /// Cached response lifetime in seconds
    pub cache_ttl_secs: u64,
    /// Capacity of the request queue
    pub queue_capacity: usize,
    /// Seed for departure times and prices
    pub seed: u64,
}

impl TestCtxBuilder {
    /// Create a new test context builder initialized with environment defaults
    pub fn from_env() -> Result<Self> {
        let settings = ProjectSettings::load()?;
        let defaults = Config::default();

        Ok(TestCtxBuilder {
            transport: settings.transport,
            seats: defaults.seat_capacity,
            cache_ttl_secs: defaults.cache_ttl_secs,
            queue_capacity: settings.queue_capacity.unwrap_or(64),
            seed: 7,
        })
    }

    /// Set the number of seats on every flight
    pub fn with_seats(mut self, seats: u32) -> Self {
        self.seats = seats;
        self
    }

    /// Set the lifetime of cached responses (in seconds)
    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// Force a transport regardless of settings
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Get the [`Config`] for launching the service
    fn config(&self) -> Config {
        Config {
            queue_capacity: self.queue_capacity,
            cache_ttl_secs: self.cache_ttl_secs,
            seat_capacity: self.seats,
            notifier_threads: 2,
            rng_seed: Some(self.seed),
            ..Config::default()
        }
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let config = self.config();
        let (balancer, api) = match self.transport {
            Transport::Mock => {
                let (balancer, api) = api::mock::start(config).await?;
                (Backend::Mock(balancer), api)
            }
            Transport::Udp => {
                let (balancer, api) = api::udp::start(config).await?;
                (Backend::Udp(balancer), api)
            }
        };

        Ok(TestCtx {
            api,
            backend: balancer,
            transport: self.transport,
            seats: self.seats,
            notification_tag: config.notification_tag,
            drop_bomb: DropBomb,
        })
    }
}

enum Backend {
    Mock(api::mock::MockBalancer),
    Udp(api::udp::UdpBalancer),
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the flight booking service
    pub api: Api,
    backend: Backend,
    /// Transport in use
    pub transport: Transport,
    /// Seats per flight
    pub seats: u32,
    /// Magic word of notification datagrams
    pub notification_tag: u32,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// The service under test
    pub fn balancer(&self) -> &Balancer {
        match &self.backend {
            Backend::Mock(b) => b.balancer(),
            Backend::Udp(b) => b.balancer(),
        }
    }

    /// Whether the cached free seat count of `flight` matches its seat map
    pub fn seat_count_consistent(&self, flight: u32) -> bool {
        let txn = self.balancer().database().read();
        txn.get(flight)
            .is_some_and(|f| f.seats_left() == f.count_free())
    }

    /// Shut the service down and finish the test
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        match self.backend {
            Backend::Mock(b) => b.shutdown().await,
            Backend::Udp(b) => b.shutdown().await,
        }
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the service down");
    }
}
