use super::ai_strategy::{AiStrategy, StrategyDeps};
use crate::application::ml::{ClosePercentagePipeline, ForestTrainer};
use crate::config::{ModelEnvConfig, StrategyEnvConfig};
use crate::domain::errors::StrategyError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const AI_STRATEGY_V1: &str = "AIStrategyV1";

/// Static catalogue of strategy instances, keyed by strategy id
pub struct StrategyFactory;

impl StrategyFactory {
    pub fn names() -> &'static [&'static str] {
        &[AI_STRATEGY_V1]
    }

    /// Build the named strategy; `None` for ids outside the catalogue
    pub fn create(
        name: &str,
        strategy: &StrategyEnvConfig,
        model: &ModelEnvConfig,
        deps: &StrategyDeps,
    ) -> Result<Option<Arc<AiStrategy>>, StrategyError> {
        match name {
            AI_STRATEGY_V1 => {
                let pipeline = ClosePercentagePipeline::new(strategy.pipeline_config());
                let trainer = ForestTrainer::new(model.forest_config());
                let instance = AiStrategy::new(
                    AI_STRATEGY_V1,
                    strategy.strategy_config(),
                    Arc::new(pipeline),
                    Arc::new(trainer),
                    deps.clone(),
                )?;
                Ok(Some(Arc::new(instance)))
            }
            _ => Ok(None),
        }
    }

    pub fn create_all(
        strategy: &StrategyEnvConfig,
        model: &ModelEnvConfig,
        deps: &StrategyDeps,
    ) -> Result<BTreeMap<String, Arc<AiStrategy>>, StrategyError> {
        let mut strategies = BTreeMap::new();
        for name in Self::names() {
            if let Some(instance) = Self::create(name, strategy, model, deps)? {
                strategies.insert(name.to_string(), instance);
            }
        }
        info!("StrategyFactory: Registered {} strategies", strategies.len());
        Ok(strategies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::observability::Metrics;

    #[test]
    fn test_catalogue_contains_ai_strategy() {
        let strategy = StrategyEnvConfig::from_env().unwrap();
        let model = ModelEnvConfig::from_env().unwrap();
        let deps = StrategyDeps::new(Metrics::new().unwrap());

        let all = StrategyFactory::create_all(&strategy, &model, &deps).unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec![AI_STRATEGY_V1]);
        assert_eq!(all[AI_STRATEGY_V1].id(), AI_STRATEGY_V1);

        let unknown = StrategyFactory::create("Nope", &strategy, &model, &deps).unwrap();
        assert!(unknown.is_none());
    }
}
