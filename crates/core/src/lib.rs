//! Domain core for the GaugeWatch telemetry service.
//!
//! Owns the three shared server-side resources:
//!
//! - [`derivation::DerivationStore`]: current gauge values plus the
//!   technical-record log, mutated by the derivation rules.
//! - [`definition::DefinitionRegistry`]: gauge metadata and the change token.
//! - [`settings::SettingsStore`]: general dashboard preferences.
//!
//! Nothing here knows about HTTP; the api crate wraps these types.

pub mod definition;
pub mod derivation;
pub mod error;
pub mod jitter;
pub mod metric;
pub mod record;
pub mod settings;
pub mod types;
