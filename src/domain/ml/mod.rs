pub mod dataset;
pub mod model;

pub use dataset::{Dataset, Example, FeaturePipeline, Label};
pub use model::{Model, ModelTrainer, ScoreVector};
