// Feature extraction, model training and the active-model registry
pub mod feature_pipeline;
pub mod model_registry;
pub mod retrain_scheduler;
pub mod smartcore_model;

pub use feature_pipeline::{ClosePercentagePipeline, PipelineConfig};
pub use model_registry::ModelRegistry;
pub use retrain_scheduler::{RetrainScheduler, SubmitOutcome, TrainingTask};
pub use smartcore_model::{ForestConfig, ForestModel, ForestTrainer};
