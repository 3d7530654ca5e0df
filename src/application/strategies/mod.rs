pub mod ai_strategy;
pub mod strategy_factory;

pub use ai_strategy::{AiStrategy, AiStrategyConfig, CycleOutcome, StrategyDeps, StrategySnapshot};
pub use strategy_factory::{AI_STRATEGY_V1, StrategyFactory};
