//! Strategy configuration parsing from environment variables.
//!
//! Covers the traded pair, the rolling window and the feature/decision
//! parameters of the AI strategy.

use crate::application::ml::PipelineConfig;
use crate::application::strategies::AiStrategyConfig;
use crate::domain::trading::decision::DEFAULT_SIGNAL_THRESHOLD;
use crate::domain::trading::types::TradingPair;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Strategy environment configuration
#[derive(Debug, Clone)]
pub struct StrategyEnvConfig {
    pub strategy_id: String,

    // Pair
    pub base_asset: String,
    pub trade_asset: String,
    pub quote_asset: String,

    /// Candles of history loaded at init; also the window capacity
    pub window_size: usize,

    // Feature pipeline
    pub input_len: usize,
    pub policy_range: usize,
    pub label_ma_period: usize,
    pub trend_threshold_pct: f64,

    // Decision
    pub signal_threshold: f64,
    pub trade_quantity: Decimal,
    pub warm_start: bool,
}

impl StrategyEnvConfig {
    pub fn from_env() -> Result<Self> {
        let pipeline = PipelineConfig::default();
        let trade_quantity_str = env::var("TRADE_QUANTITY").unwrap_or_else(|_| "1".to_string());
        let trade_quantity = Decimal::from_str(trade_quantity_str.trim())
            .context("Failed to parse TRADE_QUANTITY")?;

        let config = Self {
            strategy_id: env::var("STRATEGY_ID").unwrap_or_else(|_| "AIStrategyV1".to_string()),
            base_asset: env::var("BASE_ASSET").unwrap_or_else(|_| "USDT".to_string()),
            trade_asset: env::var("TRADE_ASSET").unwrap_or_else(|_| "USDT".to_string()),
            quote_asset: env::var("QUOTE_ASSET").unwrap_or_else(|_| "BTC".to_string()),
            window_size: Self::parse_usize("WINDOW_SIZE", 500)?,
            input_len: Self::parse_usize("INPUT_LEN", pipeline.input_len)?,
            policy_range: Self::parse_usize("POLICY_RANGE", pipeline.policy_range)?,
            label_ma_period: Self::parse_usize("LABEL_MA_PERIOD", pipeline.label_ma_period)?,
            trend_threshold_pct: Self::parse_f64(
                "TREND_THRESHOLD_PCT",
                pipeline.trend_threshold_pct,
            )?,
            signal_threshold: Self::parse_f64("SIGNAL_THRESHOLD", DEFAULT_SIGNAL_THRESHOLD)?,
            trade_quantity,
            warm_start: env::var("WARM_START")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<bool>()
                .unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_len == 0 || self.policy_range == 0 {
            anyhow::bail!(
                "INPUT_LEN and POLICY_RANGE must be positive (got {} and {})",
                self.input_len,
                self.policy_range
            );
        }
        if !(self.signal_threshold > 0.0 && self.signal_threshold <= 1.0) {
            anyhow::bail!(
                "SIGNAL_THRESHOLD must be within (0, 1], got {}",
                self.signal_threshold
            );
        }
        if self.trade_quantity <= Decimal::ZERO {
            anyhow::bail!("TRADE_QUANTITY must be positive, got {}", self.trade_quantity);
        }
        Ok(())
    }

    pub fn pair(&self) -> TradingPair {
        TradingPair::new(&self.base_asset, &self.trade_asset, &self.quote_asset)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            input_len: self.input_len,
            policy_range: self.policy_range,
            label_ma_period: self.label_ma_period,
            trend_threshold_pct: self.trend_threshold_pct,
        }
    }

    pub fn strategy_config(&self) -> AiStrategyConfig {
        AiStrategyConfig {
            signal_threshold: self.signal_threshold,
            trade_quantity: self.trade_quantity,
            warm_start: self.warm_start,
        }
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_strategy_config_defaults() {
        let config = StrategyEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.strategy_id, "AIStrategyV1");
        assert_eq!(config.input_len, 10);
        assert_eq!(config.policy_range, 10);
        assert_eq!(config.pair().symbol(), "BTCUSDT");
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = StrategyEnvConfig::from_env().unwrap();

        let zero_len = StrategyEnvConfig {
            input_len: 0,
            ..config.clone()
        };
        assert!(zero_len.validate().is_err());

        let loose = StrategyEnvConfig {
            signal_threshold: 1.5,
            ..config.clone()
        };
        assert!(loose.validate().is_err());

        let short = StrategyEnvConfig {
            trade_quantity: dec!(-1),
            ..config
        };
        assert!(short.validate().is_err());
    }
}
