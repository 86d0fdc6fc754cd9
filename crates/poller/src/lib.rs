//! Resilient dashboard client for the GaugeWatch telemetry API.
//!
//! [`poller::Poller`] keeps a last-known-good copy of the gauge values and the
//! gauge definitions fresh over an unreliable HTTP link. [`view`] turns a
//! [`poller::PollerSnapshot`] into per-gauge display entries and the
//! disconnect banner.

pub mod api;
pub mod backoff;
pub mod config;
pub mod connection;
pub mod poller;
pub mod sequence;
pub mod source;
pub mod view;
