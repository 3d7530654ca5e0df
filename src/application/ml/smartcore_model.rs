use crate::domain::errors::ModelError;
use crate::domain::ml::{Example, Model, ModelTrainer, ScoreVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::sync::Arc;
use tracing::debug;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// One-vs-rest random forest: one regressor per class, each fitted on that
/// class's column of the one-hot labels. A regressor's output is the share
/// of matching samples in the reached leaves, so scores stay within [0, 1].
#[derive(Serialize, Deserialize)]
pub struct ForestModel {
    n_features: usize,
    buy: Forest,
    sell: Forest,
    hold: Forest,
}

impl ForestModel {
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(forest: &Forest, input: &DenseMatrix<f64>) -> Result<f64, ModelError> {
        let predictions = forest.predict(input).map_err(|e| ModelError::Prediction {
            reason: e.to_string(),
        })?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ModelError::Prediction {
                reason: "No prediction returned".to_string(),
            })
    }
}

impl Model for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<ScoreVector, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()]).map_err(|e| {
            ModelError::Prediction {
                reason: format!("Matrix creation failed: {}", e),
            }
        })?;

        Ok(ScoreVector::new(
            Self::score(&self.buy, &input)?,
            Self::score(&self.sell, &input)?,
            Self::score(&self.hold, &input)?,
        )
        .clamped())
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest (one-vs-rest)"
    }

    fn export(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec(self).map_err(|e| ModelError::Serialization {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    fn params(&self) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters::default()
            .with_n_trees(self.config.n_trees)
            .with_max_depth(self.config.max_depth)
            .with_min_samples_split(self.config.min_samples_split)
            .with_seed(self.config.seed)
    }

    /// Fit a fully trained model. The returned value is never shared until
    /// the caller hands it out.
    pub fn fit(&self, examples: &[Example]) -> Result<ForestModel, ModelError> {
        let Some(first) = examples.first() else {
            return Err(ModelError::InsufficientData { examples: 0 });
        };
        let n_features = first.features.len();
        if let Some(bad) = examples.iter().find(|e| e.features.len() != n_features) {
            return Err(ModelError::FeatureMismatch {
                expected: n_features,
                actual: bad.features.len(),
            });
        }

        let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.clone()).collect();
        let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::Training {
            reason: format!("Matrix error: {}", e),
        })?;

        let mut forests: Vec<Forest> = (0..3usize)
            .into_par_iter()
            .map(|class| {
                let y: Vec<f64> = examples.iter().map(|e| e.label[class]).collect();
                Forest::fit(&x, &y, self.params()).map_err(|e| ModelError::Training {
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "ForestTrainer: Fitted {} trees x 3 classes on {} examples",
            self.config.n_trees,
            examples.len()
        );

        let hold = forests.pop();
        let sell = forests.pop();
        let buy = forests.pop();
        match (buy, sell, hold) {
            (Some(buy), Some(sell), Some(hold)) => Ok(ForestModel {
                n_features,
                buy,
                sell,
                hold,
            }),
            _ => Err(ModelError::Training {
                reason: "Missing class forest".to_string(),
            }),
        }
    }
}

impl ModelTrainer for ForestTrainer {
    fn train(&self, examples: &[Example]) -> Result<Arc<dyn Model>, ModelError> {
        Ok(Arc::new(self.fit(examples)?))
    }

    fn restore(&self, bytes: &[u8]) -> Result<Arc<dyn Model>, ModelError> {
        let model: ForestModel =
            serde_json::from_slice(bytes).map_err(|e| ModelError::Serialization {
                reason: e.to_string(),
            })?;
        Ok(Arc::new(model))
    }

    fn name(&self) -> &str {
        "forest"
    }
}
