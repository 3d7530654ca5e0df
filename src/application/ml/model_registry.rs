use crate::domain::ml::Model;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

/// Holds the model currently serving predictions.
///
/// Readers clone the `Arc` under a read lock and predict outside it, so a
/// reader waits at most for a pointer swap. Writers never train under the
/// lock; they publish a model that is already fully trained.
pub struct ModelRegistry {
    active: RwLock<Option<Arc<dyn Model>>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("active", &"<RwLock>")
            .field("generation", &self.generation())
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current active model, `None` until the first publish
    pub fn read(&self) -> Option<Arc<dyn Model>> {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap in a new active model. Returns the new generation.
    pub fn publish(&self, model: Arc<dyn Model>) -> u64 {
        let name = model.name().to_string();
        match self.active.write() {
            Ok(mut guard) => {
                *guard = Some(model);
            }
            Err(poisoned) => {
                error!("ModelRegistry: Lock poisoned during publish, recovering");
                *poisoned.into_inner() = Some(model);
            }
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("ModelRegistry: Published {} (generation {})", name, generation);
        generation
    }

    pub fn is_ready(&self) -> bool {
        self.generation() > 0
    }

    /// Number of models published so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ModelError;
    use crate::domain::ml::ScoreVector;
    use std::thread;

    struct ConstantModel(f64);

    impl Model for ConstantModel {
        fn predict(&self, _features: &[f64]) -> Result<ScoreVector, ModelError> {
            Ok(ScoreVector::new(self.0, 0.0, 0.0))
        }

        fn name(&self) -> &str {
            "constant"
        }

        fn export(&self) -> Result<Vec<u8>, ModelError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_empty_until_first_publish() {
        let registry = ModelRegistry::new();
        assert!(registry.read().is_none());
        assert!(!registry.is_ready());

        registry.publish(Arc::new(ConstantModel(0.1)));
        assert!(registry.is_ready());
        assert_eq!(registry.generation(), 1);
    }

    #[test]
    fn test_reader_keeps_its_handle_across_publish() {
        let registry = ModelRegistry::new();
        registry.publish(Arc::new(ConstantModel(0.1)));

        let held = registry.read().unwrap();
        registry.publish(Arc::new(ConstantModel(0.9)));

        assert_eq!(held.predict(&[]).unwrap().buy, 0.1);
        assert_eq!(registry.read().unwrap().predict(&[]).unwrap().buy, 0.9);
        assert_eq!(registry.generation(), 2);
    }

    #[test]
    fn test_concurrent_readers_see_complete_models() {
        let registry = Arc::new(ModelRegistry::new());
        registry.publish(Arc::new(ConstantModel(0.0)));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let model = registry.read().expect("published");
                        let buy = model.predict(&[]).unwrap().buy;
                        assert!((0.0..=1.0).contains(&buy));
                    }
                })
            })
            .collect();

        for i in 1..=100 {
            registry.publish(Arc::new(ConstantModel(i as f64 / 100.0)));
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(registry.generation(), 101);
    }
}
