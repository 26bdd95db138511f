//! 🏗 Infrastructure for decoding, routing and answering requests
#![warn(missing_docs)]

pub mod codec;
mod error;
mod request;
pub mod wire;

pub use codec::{CodecError, Decoder, Encoder};
pub use error::{ServiceError, Status};
pub use request::{Function, RawRequest, Request, RequestHandler};

/// Configuration of the flight booking service
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Capacity of the queue between the receive loop and the consumer
    pub queue_capacity: usize,
    /// Seconds a cached response stays valid
    pub cache_ttl_secs: u64,
    /// Maximum number of cached responses
    pub cache_capacity: usize,
    /// Number of threads sending seat count notifications
    pub notifier_threads: u32,
    /// Magic word at the start of every notification datagram
    pub notification_tag: u32,
    /// Seats per seeded flight
    pub seat_capacity: u32,
    /// Seed for departure times and prices, random if [`None`]
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            cache_ttl_secs: 5 * 60,
            cache_capacity: 4096,
            notifier_threads: 4,
            notification_tag: 8888,
            seat_capacity: 100,
            rng_seed: None,
        }
    }
}
