//! ✈️ The flight booking service behind the transport.
//!
//! The components of the service are the flight store ([database]), the
//! function routing ([dispatcher]), the idempotency [cache], the [notifier]
//! and the [handlers], tied together by the [balancer].

#![allow(rustdoc::private_intra_doc_links)]
use std::io;
use std::time::Duration;

use flight_booking_core::Config;
use tracing::info;

mod balancer;
pub mod cache;
pub mod database;
pub mod dispatcher;
pub mod flight;
pub mod handlers;
mod notifier;
pub mod seed;

pub use balancer::Balancer;
pub use notifier::Notifier;

use cache::ResponseCache;
use database::Database;
use dispatcher::Dispatcher;

/// Build the service: seed the store, start the notifier and register all
/// handlers.
///
/// Fails only if a notifier socket cannot be bound.
pub fn launch(config: &Config) -> io::Result<Balancer> {
    let database = Database::new(seed::flights(config.seat_capacity, config.rng_seed));
    let notifier = Notifier::new(config.notifier_threads, config.notification_tag)?;
    let cache = ResponseCache::new(
        Duration::from_secs(config.cache_ttl_secs),
        config.cache_capacity,
    );

    let mut dispatcher = Dispatcher::new();
    handlers::register_all(&mut dispatcher);

    info!(
        flights = database.len(),
        seats = config.seat_capacity,
        routes = dispatcher.len(),
        "flight store seeded"
    );
    Ok(Balancer::new(database, dispatcher, cache, notifier))
}
