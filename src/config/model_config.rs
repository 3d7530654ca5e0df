//! Model training configuration parsing from environment variables.

use crate::application::ml::ForestConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
    /// Directory for trained model snapshots; persistence is off when unset
    pub model_dir: Option<PathBuf>,
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = ForestConfig::default();
        Ok(Self {
            n_trees: Self::parse("N_TREES", defaults.n_trees)?,
            max_depth: Self::parse("MAX_DEPTH", defaults.max_depth)?,
            min_samples_split: Self::parse("MIN_SPLIT", defaults.min_samples_split)?,
            seed: Self::parse("MODEL_SEED", defaults.seed)?,
            model_dir: env::var("MODEL_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }

    fn parse<T>(key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<T>()
            .context(format!("Failed to parse {}", key))
    }
}
