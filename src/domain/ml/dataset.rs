use crate::domain::trading::types::Candle;
use serde::{Deserialize, Serialize};

/// Direction a labeled example was tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Up,
    Down,
    Flat,
}

impl Label {
    /// One-hot encoding in score-vector order: buy, sell, hold
    pub fn one_hot(self) -> [f64; 3] {
        match self {
            Label::Up => [1.0, 0.0, 0.0],
            Label::Down => [0.0, 1.0, 0.0],
            Label::Flat => [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub features: Vec<f64>,
    pub label: [f64; 3],
}

impl Example {
    pub fn new(features: Vec<f64>, label: Label) -> Self {
        Self {
            features,
            label: label.one_hot(),
        }
    }
}

/// Output of one feature-pipeline pass over a window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Labeled examples for training
    pub examples: Vec<Example>,
    /// Feature vector ending at the newest candle, used for prediction
    pub latest: Option<Vec<f64>>,
}

impl Dataset {
    /// An empty example set means "not enough data yet"
    pub fn is_trainable(&self) -> bool {
        !self.examples.is_empty()
    }
}

/// Turns a candle window into labeled examples plus the newest unlabeled vector.
/// Must be deterministic: identical windows yield identical datasets.
pub trait FeaturePipeline: Send + Sync {
    fn build(&self, candles: &[Candle]) -> Dataset;

    /// Smallest window that yields at least one example
    fn min_window(&self) -> usize;
}
