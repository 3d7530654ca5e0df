use thiserror::Error;

/// Errors raised by models and trainers
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Not enough training data: {examples} examples")]
    InsufficientData { examples: usize },

    #[error("Training failed: {reason}")]
    Training { reason: String },

    #[error("Feature length mismatch: model expects {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },

    #[error("Model serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Errors related to the background retrain worker
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to spawn retrain worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Errors surfaced by strategy lifecycle calls
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Strategy {name} is already initialized")]
    AlreadyInitialized { name: String },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_mismatch_formatting() {
        let error = ModelError::FeatureMismatch {
            expected: 10,
            actual: 7,
        };

        let msg = error.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn test_strategy_error_formatting() {
        let error = StrategyError::AlreadyInitialized {
            name: "AIStrategyV1_BTCUSDT".to_string(),
        };
        assert!(error.to_string().contains("AIStrategyV1_BTCUSDT"));
    }
}
