//! Implementation of the request pipeline
//!
//! Every request passes through [`Balancer::handle`]: the idempotency cache
//! is consulted first and a hit is replayed byte for byte. Only on a miss is
//! the handler run; its response is cached before it is sent.

use flight_booking_core::wire::{self, RequestHeader};
use flight_booking_core::{Decoder, Request, RequestHandler, ServiceError};
use tracing::{debug, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::database::Database;
use crate::dispatcher::Dispatcher;
use crate::handlers::Context;
use crate::notifier::Notifier;

/// Entry point for decoded datagrams
///
/// ⚠️ Exposed from the crate root and driven by the transport through the
/// [`RequestHandler`] trait.
pub struct Balancer {
    database: Database,
    dispatcher: Dispatcher,
    cache: ResponseCache,
    notifier: Notifier,
}

impl Balancer {
    /// Create a new [`Balancer`]
    pub fn new(
        database: Database,
        dispatcher: Dispatcher,
        cache: ResponseCache,
        notifier: Notifier,
    ) -> Self {
        Self {
            database,
            dispatcher,
            cache,
            notifier,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Forget every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run the handler for `header` and build the full response
    fn dispatch(&self, header: RequestHeader, body: &[u8], caller: &str) -> Vec<u8> {
        let RequestHeader {
            request_id,
            function_id,
        } = header;

        let result = match self.dispatcher.route(function_id) {
            Some(handler) => {
                let ctx = Context {
                    database: &self.database,
                    notifier: &self.notifier,
                    caller,
                };
                handler(&mut Decoder::new(body), &ctx)
            }
            None => Err(ServiceError::bad_request(format!(
                "unknown function {function_id}"
            ))),
        };

        match result {
            Ok(reply) => {
                debug!(%caller, request_id, function_id, status = reply.status.code(), "handled request");
                wire::response(request_id, reply.status, &reply.body)
            }
            Err(err) => {
                debug!(%caller, request_id, function_id, %err, "request failed");
                wire::error_response(request_id, &err)
            }
        }
    }
}

impl RequestHandler for Balancer {
    fn handle(&self, rq: Request) {
        let Some(request_id) = rq.request_id() else {
            warn!(sender = rq.sender(), len = rq.payload().len(), "dropping datagram without request id");
            return;
        };

        let key = CacheKey::new(request_id, rq.sender());
        if let Some(cached) = self.cache.lookup(&key) {
            debug!(sender = rq.sender(), request_id, "replaying cached response");
            rq.respond(cached);
            return;
        }

        let header = match rq.header() {
            Ok(header) => header,
            Err(err) => {
                warn!(sender = rq.sender(), request_id, %err, "malformed request header");
                rq.respond(wire::error_response(request_id, &ServiceError::from(err)));
                return;
            }
        };

        let response = self.dispatch(header, rq.body(), rq.sender());
        self.cache.store(key, response.clone());
        rq.respond(response);
    }

    fn shutdown(self) {
        // queued notifications are still sent
        self.notifier.shutdown();
    }
}
