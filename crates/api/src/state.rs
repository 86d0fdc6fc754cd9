use std::sync::Arc;

use gaugewatch_core::definition::DefinitionRegistry;
use gaugewatch_core::derivation::DerivationStore;
use gaugewatch_core::jitter::{JitterSource, SeededJitter, ThreadJitter};
use gaugewatch_core::settings::SettingsStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Current gauge values and the technical-record log.
    pub store: Arc<DerivationStore>,
    /// Gauge definitions and the change token.
    pub registry: Arc<DefinitionRegistry>,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Build fresh in-memory state from configuration.
    ///
    /// A configured `jitter_seed` makes the derived `current` reproducible.
    pub fn from_config(config: ServerConfig) -> Self {
        let jitter: Box<dyn JitterSource> = match config.jitter_seed {
            Some(seed) => Box::new(SeededJitter::new(seed)),
            None => Box::new(ThreadJitter),
        };
        let store = DerivationStore::new(jitter).with_retention(config.record_retention);

        Self {
            store: Arc::new(store),
            registry: Arc::new(DefinitionRegistry::default()),
            settings: Arc::new(SettingsStore::default()),
            config: Arc::new(config),
        }
    }
}
