//! Behavior implementations.
//!
//! ## Basic behaviors
//! - `CloseImmediately`, `CloseAfterPause`, `NeverRespond`: silent connections
//! - `FixedResponse`, `NewlineResponse`, `RandomResponse`: canned responses
//! - `SlowResponse`, `DelugeResponse`: trickle and flood responses
//!
//! ## Composed behaviors
//! - `ForEachLine` wraps a responding behavior to fire once per inbound line
//!
//! ## HTTP behaviors
//! - `HttpResponder` instances serving fixed or randomly-picked status codes

pub mod basic;
pub mod http;
pub mod line_loop;

use crate::behavior::Behavior;
use line_loop::ForEachLine;
use std::sync::Arc;

/// The full builtin catalogue, in registration order.
pub(crate) fn builtin() -> Vec<Arc<dyn Behavior>> {
    let mut catalogue: Vec<Arc<dyn Behavior>> = vec![
        Arc::new(basic::CloseImmediately),
        Arc::new(basic::CloseAfterPause),
        Arc::new(basic::FixedResponse),
        Arc::new(basic::NewlineResponse),
        Arc::new(basic::RandomResponse),
        Arc::new(basic::SlowResponse),
        Arc::new(basic::NeverRespond),
        Arc::new(basic::DelugeResponse),
    ];

    // Each responding behavior gets a per-line variant. The silent ones
    // (CloseImmediately, CloseAfterPause, NeverRespond) do not.
    let responding: [Arc<dyn Behavior>; 5] = [
        Arc::new(basic::FixedResponse),
        Arc::new(basic::NewlineResponse),
        Arc::new(basic::RandomResponse),
        Arc::new(basic::SlowResponse),
        Arc::new(basic::DelugeResponse),
    ];
    for inner in responding {
        catalogue.push(Arc::new(ForEachLine::wrap(inner)));
    }

    for responder in http::builtin_responders() {
        catalogue.push(Arc::new(responder));
    }

    catalogue
}
