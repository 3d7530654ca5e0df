use crate::domain::ports::ModelStore;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Stores one JSON file per key under a directory. Each save replaces the
/// previous file through a rename, so a reader never sees a partial model.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl ModelStore for FileModelStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create model directory {:?}", self.dir))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to move model into {:?}", path))?;

        debug!("FileModelStore: Saved {} ({} bytes) to {:?}", key, bytes.len(), path);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            info!("FileModelStore: No stored model for {} at {:?}", key, path);
            return Ok(None);
        }

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        info!("FileModelStore: Loaded {} from {:?}", key, path);
        Ok(Some(bytes))
    }
}
