//! Close-percentage feature pipeline.
//!
//! Each example's features are the last `input_len` close-to-close percentage
//! changes. The label looks `policy_range` candles ahead: an EMA is run over the
//! forward closes and the percentage change between its first and last value
//! decides up, down or flat.

use crate::domain::ml::{Dataset, Example, FeaturePipeline, Label};
use crate::domain::trading::types::Candle;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::ExponentialMovingAverage;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of percentage changes per feature vector
    pub input_len: usize,
    /// Forward candles inspected to label an example
    pub policy_range: usize,
    /// EMA period used for the forward trend
    pub label_ma_period: usize,
    /// Trend change (in percent) separating up/down from flat
    pub trend_threshold_pct: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_len: 10,
            policy_range: 10,
            label_ma_period: 50,
            trend_threshold_pct: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClosePercentagePipeline {
    config: PipelineConfig,
}

impl ClosePercentagePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Features ending at index `end` (inclusive). Caller guarantees `end >= input_len`.
    fn features_at(&self, closes: &[f64], end: usize) -> Vec<f64> {
        let start = end + 1 - self.config.input_len;
        (start..=end)
            .map(|i| percentage_change(closes[i - 1], closes[i]))
            .collect()
    }

    fn label_at(&self, closes: &[f64], end: usize) -> Label {
        let forward = &closes[end..=end + self.config.policy_range];
        let trend = forward_trend_pct(forward, self.config.label_ma_period);
        let threshold = self.config.trend_threshold_pct;

        if trend >= threshold {
            Label::Up
        } else if trend >= -threshold {
            Label::Flat
        } else {
            Label::Down
        }
    }
}

impl FeaturePipeline for ClosePercentagePipeline {
    fn build(&self, candles: &[Candle]) -> Dataset {
        let input_len = self.config.input_len;
        if input_len == 0 {
            return Dataset::default();
        }

        let closes: Vec<f64> = candles.iter().map(Candle::close_f64).collect();
        let n = closes.len();

        let latest = (n > input_len).then(|| self.features_at(&closes, n - 1));

        let examples = if n >= self.min_window() {
            let last_labeled = n - 1 - self.config.policy_range;
            (input_len..=last_labeled)
                .map(|t| Example::new(self.features_at(&closes, t), self.label_at(&closes, t)))
                .collect()
        } else {
            Vec::new()
        };

        Dataset { examples, latest }
    }

    fn min_window(&self) -> usize {
        self.config.input_len + self.config.policy_range + 1
    }
}

fn percentage_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}

/// Percentage change between the first and last EMA values over `closes`
fn forward_trend_pct(closes: &[f64], period: usize) -> f64 {
    let Ok(mut ema) = ExponentialMovingAverage::new(period.max(1)) else {
        return 0.0;
    };

    let mut first = None;
    let mut last = 0.0;
    for close in closes {
        last = ema.next(*close);
        first.get_or_insert(last);
    }

    first.map_or(0.0, |first| percentage_change(first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let price = Decimal::from_f64(*close).unwrap_or_default();
                Candle {
                    symbol: "BTCUSDT".to_string(),
                    open_time: i as i64 * 60_000,
                    close_time: i as i64 * 60_000 + 59_999,
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    volume: Decimal::ONE,
                    quote_volume: price,
                    trade_count: 1,
                    taker_buy_base_volume: Decimal::ZERO,
                    taker_buy_quote_volume: Decimal::ZERO,
                }
            })
            .collect()
    }

    fn pipeline(input_len: usize, policy_range: usize) -> ClosePercentagePipeline {
        ClosePercentagePipeline::new(PipelineConfig {
            input_len,
            policy_range,
            label_ma_period: 2,
            trend_threshold_pct: 0.3,
        })
    }

    #[test]
    fn test_short_window_yields_no_examples() {
        let p = pipeline(3, 2);
        assert_eq!(p.min_window(), 6);

        let dataset = p.build(&candles(&[100.0, 101.0, 102.0, 103.0, 104.0]));
        assert!(!dataset.is_trainable());
        // Enough history for a prediction vector though
        assert_eq!(dataset.latest.map(|v| v.len()), Some(3));
    }

    #[test]
    fn test_example_count_and_feature_values() {
        let p = pipeline(2, 1);
        let dataset = p.build(&candles(&[100.0, 110.0, 121.0, 121.0, 108.9]));

        // t in 2..=3
        assert_eq!(dataset.examples.len(), 2);
        let first = &dataset.examples[0].features;
        assert!((first[0] - 10.0).abs() < 1e-9);
        assert!((first[1] - 10.0).abs() < 1e-9);

        let latest = dataset.latest.expect("latest vector");
        assert!((latest[0] - 0.0).abs() < 1e-9);
        assert!((latest[1] + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels_follow_forward_trend() {
        let p = pipeline(1, 1);
        // Forward pairs: 100->110 up, 110->110 flat, 110->90 down
        let dataset = p.build(&candles(&[100.0, 100.0, 110.0, 110.0, 90.0]));
        let labels: Vec<[f64; 3]> = dataset.examples.iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec![
                Label::Up.one_hot(),
                Label::Flat.one_hot(),
                Label::Down.one_hot()
            ]
        );
    }

    #[test]
    fn test_identical_windows_build_identical_datasets() {
        let p = ClosePercentagePipeline::new(PipelineConfig::default());
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        assert_eq!(p.build(&candles(&closes)), p.build(&candles(&closes)));
    }

    #[test]
    fn test_zero_close_does_not_divide() {
        assert_eq!(percentage_change(0.0, 5.0), 0.0);
    }
}
