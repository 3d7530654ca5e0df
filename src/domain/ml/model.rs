use super::dataset::Example;
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw model output over the three classes.
///
/// Each score lies in `[0, 1]`; the three are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl ScoreVector {
    pub fn new(buy: f64, sell: f64, hold: f64) -> Self {
        Self { buy, sell, hold }
    }

    pub fn clamped(self) -> Self {
        Self {
            buy: self.buy.clamp(0.0, 1.0),
            sell: self.sell.clamp(0.0, 1.0),
            hold: self.hold.clamp(0.0, 1.0),
        }
    }
}

/// A trained, predict-capable model
pub trait Model: Send + Sync {
    /// Score a single feature vector
    fn predict(&self, features: &[f64]) -> Result<ScoreVector, ModelError>;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Serialize the model for a model store
    fn export(&self) -> Result<Vec<u8>, ModelError>;
}

/// Builds fresh models. Every call to `train` returns a new instance; the
/// trainer never mutates a model that has already been handed out.
pub trait ModelTrainer: Send + Sync {
    fn train(&self, examples: &[Example]) -> Result<Arc<dyn Model>, ModelError>;

    /// Rebuild a model previously produced by [`Model::export`]
    fn restore(&self, bytes: &[u8]) -> Result<Arc<dyn Model>, ModelError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_vector_clamped() {
        let scores = ScoreVector::new(1.2, -0.1, 0.5).clamped();
        assert_eq!(scores, ScoreVector::new(1.0, 0.0, 0.5));
    }
}
