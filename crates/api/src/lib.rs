//! GaugeWatch API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes) so
//! integration tests, the poller's end-to-end tests and the binary
//! entrypoint all build the same router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
