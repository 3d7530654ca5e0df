//! Prometheus metrics definitions for the AI strategy core
//!
//! All metrics use the `aitrade_` prefix and are read-only.

use prometheus::{
    CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

/// Prometheus metrics for the retrain/serve/decide pipeline
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Retrain task submissions by outcome (queued, dropped, closed)
    pub retrain_tasks_total: CounterVec,
    /// Completed training runs by result (success, failure, panic)
    pub trainings_total: CounterVec,
    /// Wall-clock training duration in seconds
    pub training_duration_seconds: HistogramVec,
    /// Generation of the active model per strategy
    pub model_generation: GenericGaugeVec<AtomicF64>,
    /// Candle cycles by outcome
    pub candle_cycles_total: CounterVec,
    /// Position actions emitted by the decision engine
    pub position_signals_total: CounterVec,
    /// Orders routed to exchange clients by result
    pub orders_total: CounterVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let retrain_tasks_total = CounterVec::new(
            Opts::new(
                "aitrade_retrain_tasks_total",
                "Retrain task submissions by outcome",
            ),
            &["strategy", "outcome"],
        )?;
        registry.register(Box::new(retrain_tasks_total.clone()))?;

        let trainings_total = CounterVec::new(
            Opts::new("aitrade_trainings_total", "Training runs by result"),
            &["strategy", "result"],
        )?;
        registry.register(Box::new(trainings_total.clone()))?;

        let training_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "aitrade_training_duration_seconds",
                "Training duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["strategy"],
        )?;
        registry.register(Box::new(training_duration_seconds.clone()))?;

        let model_generation = GaugeVec::new(
            Opts::new(
                "aitrade_model_generation",
                "Number of models published to the active registry",
            ),
            &["strategy"],
        )?;
        registry.register(Box::new(model_generation.clone()))?;

        let candle_cycles_total = CounterVec::new(
            Opts::new("aitrade_candle_cycles_total", "Candle cycles by outcome"),
            &["strategy", "outcome"],
        )?;
        registry.register(Box::new(candle_cycles_total.clone()))?;

        let position_signals_total = CounterVec::new(
            Opts::new(
                "aitrade_position_signals_total",
                "Position actions emitted by the decision engine",
            ),
            &["strategy", "side", "action"],
        )?;
        registry.register(Box::new(position_signals_total.clone()))?;

        let orders_total = CounterVec::new(
            Opts::new("aitrade_orders_total", "Routed orders by client and result"),
            &["client", "result"],
        )?;
        registry.register(Box::new(orders_total.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "aitrade_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            retrain_tasks_total,
            trainings_total,
            training_duration_seconds,
            model_generation,
            candle_cycles_total,
            position_signals_total,
            orders_total,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_retrain_task(&self, strategy: &str, outcome: &str) {
        self.retrain_tasks_total
            .with_label_values(&[strategy, outcome])
            .inc();
    }

    pub fn retrain_tasks(&self, strategy: &str, outcome: &str) -> u64 {
        self.retrain_tasks_total
            .with_label_values(&[strategy, outcome])
            .get() as u64
    }

    pub fn inc_training(&self, strategy: &str, result: &str) {
        self.trainings_total
            .with_label_values(&[strategy, result])
            .inc();
    }

    pub fn trainings(&self, strategy: &str, result: &str) -> u64 {
        self.trainings_total
            .with_label_values(&[strategy, result])
            .get() as u64
    }

    pub fn observe_training(&self, strategy: &str, seconds: f64) {
        self.training_duration_seconds
            .with_label_values(&[strategy])
            .observe(seconds);
    }

    pub fn set_model_generation(&self, strategy: &str, generation: u64) {
        self.model_generation
            .with_label_values(&[strategy])
            .set(generation as f64);
    }

    pub fn inc_cycle(&self, strategy: &str, outcome: &str) {
        self.candle_cycles_total
            .with_label_values(&[strategy, outcome])
            .inc();
    }

    pub fn inc_position_signal(&self, strategy: &str, side: &str, action: &str) {
        self.position_signals_total
            .with_label_values(&[strategy, side, action])
            .inc();
    }

    pub fn inc_orders(&self, client: &str, result: &str) {
        self.orders_total.with_label_values(&[client, result]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.uptime_seconds.set(1.0);
        assert!(metrics.render().contains("aitrade_"));
    }

    #[test]
    fn test_retrain_counter_per_outcome() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_retrain_task("AIStrategyV1_BTCUSDT", "queued");
        metrics.inc_retrain_task("AIStrategyV1_BTCUSDT", "dropped");
        metrics.inc_retrain_task("AIStrategyV1_BTCUSDT", "dropped");

        assert_eq!(metrics.retrain_tasks("AIStrategyV1_BTCUSDT", "queued"), 1);
        assert_eq!(metrics.retrain_tasks("AIStrategyV1_BTCUSDT", "dropped"), 2);
        assert!(metrics.render().contains("aitrade_retrain_tasks_total"));
    }

    #[test]
    fn test_model_generation_gauge() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.set_model_generation("AIStrategyV1_BTCUSDT", 3);
        let output = metrics.render();
        assert!(output.contains("aitrade_model_generation"));
        assert!(output.contains("AIStrategyV1_BTCUSDT"));
    }
}
