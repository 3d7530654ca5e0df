//! Push-based metrics reporter.
//!
//! Periodically outputs strategy and training state as structured JSON to stdout.
//! The process never accepts incoming connections for metrics.

use crate::application::strategies::{AiStrategy, StrategySnapshot};
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub strategies: Vec<StrategyReport>,
}

#[derive(Serialize)]
pub struct StrategyReport {
    #[serde(flatten)]
    pub state: StrategySnapshot,
    pub retrain_queued: u64,
    pub retrain_dropped: u64,
    pub trainings_succeeded: u64,
    pub trainings_failed: u64,
}

pub struct MetricsReporter {
    strategies: Vec<Arc<AiStrategy>>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(strategies: Vec<Arc<AiStrategy>>, metrics: Metrics, interval_seconds: u64) -> Self {
        Self {
            strategies,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;
            self.report();
        }
    }

    pub fn report(&self) {
        let snapshot = self.collect_snapshot();
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                // Prefix keeps the line greppable among regular logs
                println!("METRICS_JSON:{}", json);
                for s in &snapshot.strategies {
                    info!(
                        "{}: {:?} | generation {} | dropped retrains {} | uptime {}s",
                        s.state.name,
                        s.state.phase,
                        s.state.model_generation,
                        s.retrain_dropped,
                        snapshot.uptime_seconds
                    );
                }
            }
            Err(e) => warn!("MetricsReporter: Failed to serialize metrics: {}", e),
        }
    }

    fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        let strategies = self
            .strategies
            .iter()
            .map(|strategy| {
                let id = strategy.id();
                StrategyReport {
                    state: strategy.snapshot(),
                    retrain_queued: self.metrics.retrain_tasks(id, "queued"),
                    retrain_dropped: self.metrics.retrain_tasks(id, "dropped"),
                    trainings_succeeded: self.metrics.trainings(id, "success"),
                    trainings_failed: self.metrics.trainings(id, "failure")
                        + self.metrics.trainings(id, "panic"),
                }
            })
            .collect();

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            strategies,
        }
    }
}
