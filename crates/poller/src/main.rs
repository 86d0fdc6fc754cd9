//! `gaugewatch-poller` -- headless dashboard client.
//!
//! Polls a GaugeWatch server, logs the reconciled gauges and the disconnect
//! banner, and can feed the server random technical records.
//!
//! See [`PollerConfig::from_env`] for the environment variables.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gaugewatch_poller::api::TelemetryApi;
use gaugewatch_poller::config::PollerConfig;
use gaugewatch_poller::poller::{Poller, PollerSnapshot};
use gaugewatch_poller::view::DisconnectBanner;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaugewatch_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PollerConfig::from_env();
    tracing::info!(
        base_url = %config.base_url,
        simulate = config.simulate_interval.is_some(),
        "Starting gaugewatch-poller",
    );

    let api = TelemetryApi::with_timeout(config.base_url.clone(), config.request_timeout)
        .expect("Failed to build HTTP client");
    let cancel = CancellationToken::new();

    let simulator = config
        .simulate_interval
        .map(|interval| tokio::spawn(simulate_records(api.clone(), interval, cancel.clone())));

    let poller = Poller::spawn(Arc::new(api), config);
    let mut updates = poller.subscribe();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut config_changed = false;
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    tracing::error!("Poller exited unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                report(&snapshot, &mut config_changed);
            }
        }
    }

    cancel.cancel();
    if let Some(handle) = simulator {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    poller.shutdown().await;
    tracing::info!("Shutdown complete");
}

fn report(snapshot: &PollerSnapshot, config_changed: &mut bool) {
    if snapshot.config_changed != *config_changed {
        *config_changed = snapshot.config_changed;
        if snapshot.config_changed {
            tracing::info!("Gauge configuration changed, reloading definitions");
        }
    }

    if let Some(banner) = DisconnectBanner::from_snapshot(snapshot, Instant::now()) {
        tracing::warn!(%banner, "Telemetry offline");
        return;
    }

    for gauge in snapshot.gauges() {
        tracing::debug!(
            id = %gauge.id,
            value = gauge.value,
            display_value = gauge.display_value,
            unit = %gauge.unit,
            out_of_range = gauge.out_of_range,
            source = ?gauge.source,
            "Gauge",
        );
    }
}

/// Submit a random technical record every `interval` until cancelled.
async fn simulate_records(api: TelemetryApi, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let (temperature, voltage, pressure) = {
            let mut rng = rand::rng();
            (
                rng.random_range(60.0..110.0),
                rng.random_range(180.0..240.0),
                rng.random_range(2.0..6.0),
            )
        };

        let submitted = tokio::select! {
            _ = cancel.cancelled() => return,
            submitted = api.submit_record(temperature, voltage, pressure) => submitted,
        };

        match submitted {
            Ok(submitted) => tracing::info!(
                record_id = %submitted.record.id,
                temperature,
                voltage,
                pressure,
                fuel = submitted.values.fuel,
                battery_level = submitted.values.battery_level,
                "Simulated record submitted",
            ),
            Err(e) => tracing::warn!(error = %e, "Simulated record rejected"),
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
