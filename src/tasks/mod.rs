//! Background tasks module
//!
//! Tasks the host binary runs alongside the HTTP server.

pub mod countdown_ticker;
pub mod event_router;
pub mod reconciliation;

#[cfg(test)]
mod test_support;

// Re-export main functions
pub use countdown_ticker::countdown_ticker_task;
pub use event_router::event_router_task;
pub use reconciliation::reconciliation_task;
