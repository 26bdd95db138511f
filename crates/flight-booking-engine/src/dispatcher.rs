//! Function id routing
use std::collections::HashMap;

use flight_booking_core::Decoder;

use crate::handlers::{Context, HandlerResult};

/// A request handler: decodes the body, runs against the store
pub type Handler = fn(&mut Decoder<'_>, &Context<'_>) -> HandlerResult;

/// Maps function ids to handlers
///
/// Routes are registered before serving starts and never change afterwards.
#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<u32, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `function_id`, replacing any previous one.
    pub fn register(&mut self, function_id: u32, handler: Handler) {
        self.routes.insert(function_id, handler);
    }

    pub fn route(&self, function_id: u32) -> Option<Handler> {
        self.routes.get(&function_id).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use flight_booking_core::Function;

    use super::*;
    use crate::handlers::register_all;

    #[test]
    fn every_function_is_routed() {
        let mut dispatcher = Dispatcher::new();
        register_all(&mut dispatcher);
        assert_eq!(dispatcher.len(), Function::ALL.len());
        for function in Function::ALL {
            assert!(dispatcher.route(function.id()).is_some());
        }
        assert!(dispatcher.route(0).is_none());
        assert!(dispatcher.route(7).is_none());
    }
}
