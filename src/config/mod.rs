//! Configuration module for the AI trading service.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: Strategy, Model and Observability.

mod model_config;
mod observability_config;
mod strategy_config;

pub use model_config::ModelEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use strategy_config::StrategyEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: StrategyEnvConfig,
    pub model: ModelEnvConfig,
    pub observability: ObservabilityEnvConfig,
    /// Capacity of the queue between strategies and the order executor
    pub order_queue_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let strategy = StrategyEnvConfig::from_env().context("Invalid strategy configuration")?;
        let model = ModelEnvConfig::from_env().context("Invalid model configuration")?;
        let observability = ObservabilityEnvConfig::from_env();

        let order_queue_size = std::env::var("ORDER_QUEUE_SIZE")
            .unwrap_or_else(|_| "64".to_string())
            .parse::<usize>()
            .context("Failed to parse ORDER_QUEUE_SIZE")?;

        Ok(Self {
            strategy,
            model,
            observability,
            order_queue_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = tokio_test::assert_ok!(Config::from_env());
        assert_eq!(config.order_queue_size, 64);
        assert_eq!(config.strategy.window_size, 500);
        assert!(config.observability.enabled);
    }
}
