//! API implementation talking to a real UDP server on localhost

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flight_booking_core::{Config, RequestHandler};
use flight_booking_engine::Balancer;
use flight_booking_server::udp::{ShutdownHandle, UdpServer};
use tokio::task;

use super::{Api, Link};

pub struct UdpBalancer {
    balancer: Arc<Balancer>,
    shutdown: ShutdownHandle,
    server_thread: JoinHandle<io::Result<()>>,
}

pub async fn start(config: Config) -> eyre::Result<(UdpBalancer, Api)> {
    let balancer = Arc::new(
        task::spawn_blocking(move || flight_booking_engine::launch(&config)).await??,
    );

    let server = UdpServer::bind("127.0.0.1:0", config.queue_capacity)?;
    let addr = server.local_addr()?;
    let shutdown = server.shutdown_handle();

    let handler = balancer.clone();
    let server_thread = thread::Builder::new()
        .name("udp_server".into())
        .spawn(move || server.serve(&*handler))?;

    let udp_balancer = UdpBalancer {
        balancer,
        shutdown,
        server_thread,
    };
    Ok((udp_balancer, Api::new(Link::Udp(addr))))
}

impl UdpBalancer {
    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    pub async fn shutdown(self) {
        self.shutdown.shutdown();
        let server_thread = self.server_thread;
        task::spawn_blocking(move || server_thread.join())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        task::spawn_blocking(move || Arc::into_inner(self.balancer).unwrap().shutdown())
            .await
            .unwrap();
    }
}
