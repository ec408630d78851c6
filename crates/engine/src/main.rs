//! Plotweave Engine worker - runs the expiry sweep on an interval.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plotweave_engine::infrastructure::clock::SystemClock;
use plotweave_engine::infrastructure::memory::{InMemoryDecisionRepo, InMemoryPredictionRepo};
use plotweave_engine::infrastructure::ports::ClockPort;
use plotweave_engine::use_cases::ExpirySweep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plotweave_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Plotweave Engine worker");

    let interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
        .unwrap_or_else(|_| "60".into())
        .parse()
        .unwrap_or(60);

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let decisions = Arc::new(InMemoryDecisionRepo::new());
    let predictions = Arc::new(InMemoryPredictionRepo::new());
    let sweep = ExpirySweep::new(decisions, predictions, clock);

    tracing::info!(interval_secs, "expiry sweep loop running");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        ticker.tick().await;
        match sweep.run_once().await {
            Ok(report) => {
                tracing::debug!(
                    decisions = report.decisions_expired,
                    predictions = report.predictions_expired,
                    "sweep pass complete"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "sweep pass failed");
            }
        }
    }
}
