//! Mock API implementation directly using the `flight-booking-engine` crate

use std::net::SocketAddr;
use std::sync::Arc;

use flight_booking_core::{Config, RawRequest, Request, RequestHandler};
use flight_booking_engine::Balancer;
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};

use super::{Api, Link, Msg};

pub struct MockBalancer {
    balancer: Arc<Balancer>,
    channel: flume::Sender<Msg>,
    join_handle: JoinHandle<()>,
}

struct MockRawRequest {
    response_channel: oneshot::Sender<Vec<u8>>,
}

pub async fn start(config: Config) -> eyre::Result<(MockBalancer, Api)> {
    let balancer = Arc::new(
        task::spawn_blocking(move || flight_booking_engine::launch(&config)).await??,
    );

    let (sender, receiver) = flume::bounded::<Msg>(config.queue_capacity.max(1));
    let consumer = balancer.clone();
    // One consumer, like the UDP server: requests are handled strictly in order.
    let join_handle = task::spawn_blocking(move || {
        for msg in receiver.iter() {
            let msg = match msg {
                Msg::Request(msg) => msg,
                Msg::Stop => break,
            };
            let raw = Box::new(MockRawRequest {
                response_channel: msg.response_channel,
            });
            consumer.handle(Request::from_raw(msg.sender, msg.payload, raw));
        }
    });

    let mock_balancer = MockBalancer {
        balancer,
        channel: sender.clone(),
        join_handle,
    };
    Ok((mock_balancer, Api::new(Link::Mock(sender))))
}

impl MockBalancer {
    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    pub async fn shutdown(self) {
        let _ = self.channel.send_async(Msg::Stop).await;
        self.join_handle.await.unwrap();
        task::spawn_blocking(move || Arc::into_inner(self.balancer).unwrap().shutdown())
            .await
            .unwrap();
    }
}

impl RawRequest for MockRawRequest {
    fn origin(&self) -> Option<SocketAddr> {
        None
    }

    fn respond(self: Box<Self>, _sender: &str, response: Vec<u8>) {
        // the session may have timed out and gone away
        let _ = self.response_channel.send(response);
    }
}
