//! Background retraining.
//!
//! One worker thread per strategy consumes a single-slot queue. Submitting
//! never blocks: while a task is waiting, further submissions are dropped and
//! counted. The worker trains a fresh model per task and publishes it to the
//! [`ModelRegistry`] only after training succeeded.

use super::model_registry::ModelRegistry;
use crate::domain::errors::SchedulerError;
use crate::domain::ml::{Example, ModelTrainer};
use crate::domain::ports::ModelStore;
use crate::infrastructure::observability::Metrics;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Value snapshot of everything one training run needs
#[derive(Debug, Clone)]
pub struct TrainingTask {
    pub symbol: String,
    /// Open time of the newest candle the examples were built from
    pub as_of: i64,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Queued,
    /// A task was already waiting; this one was discarded
    Dropped,
    /// The scheduler has been shut down
    Closed,
}

impl SubmitOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitOutcome::Queued => "queued",
            SubmitOutcome::Dropped => "dropped",
            SubmitOutcome::Closed => "closed",
        }
    }
}

pub struct RetrainScheduler {
    name: String,
    sender: Mutex<Option<Sender<TrainingTask>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    metrics: Metrics,
}

impl RetrainScheduler {
    /// Start the worker thread. `name` labels logs and metrics; trained models
    /// are stored under `<name>_<symbol>`.
    pub fn spawn(
        name: impl Into<String>,
        trainer: Arc<dyn ModelTrainer>,
        registry: Arc<ModelRegistry>,
        store: Option<Arc<dyn ModelStore>>,
        metrics: Metrics,
    ) -> Result<Self, SchedulerError> {
        let name = name.into();
        let (tx, rx) = crossbeam_channel::bounded(1);

        let worker = RetrainWorker {
            name: name.clone(),
            trainer,
            registry,
            store,
            metrics: metrics.clone(),
        };

        let handle = thread::Builder::new()
            .name(format!("retrain-{}", name))
            .spawn(move || worker.run(rx))?;

        info!("RetrainScheduler [{}]: Worker started", name);

        Ok(Self {
            name,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
            metrics,
        })
    }

    /// Non-blocking enqueue
    pub fn submit(&self, task: TrainingTask) -> SubmitOutcome {
        let outcome = {
            let sender = self.sender.lock().unwrap_or_else(|p| p.into_inner());
            match sender.as_ref() {
                Some(tx) => match tx.try_send(task) {
                    Ok(()) => SubmitOutcome::Queued,
                    Err(TrySendError::Full(_)) => SubmitOutcome::Dropped,
                    Err(TrySendError::Disconnected(_)) => SubmitOutcome::Closed,
                },
                None => SubmitOutcome::Closed,
            }
        };

        match outcome {
            SubmitOutcome::Dropped => {
                debug!("RetrainScheduler [{}]: Queue full, task dropped", self.name)
            }
            SubmitOutcome::Closed => {
                warn!("RetrainScheduler [{}]: Submit after shutdown", self.name)
            }
            SubmitOutcome::Queued => {}
        }
        self.metrics.inc_retrain_task(&self.name, outcome.as_str());
        outcome
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    /// Close the queue and wait for the worker. An in-flight training run
    /// finishes first; a task still waiting in the queue is trained as well.
    pub fn shutdown(&self) {
        let sender = self.sender.lock().unwrap_or_else(|p| p.into_inner()).take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let handle = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("RetrainScheduler [{}]: Worker thread panicked", self.name);
            } else {
                info!("RetrainScheduler [{}]: Worker stopped", self.name);
            }
        }
    }
}

impl Drop for RetrainScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct RetrainWorker {
    name: String,
    trainer: Arc<dyn ModelTrainer>,
    registry: Arc<ModelRegistry>,
    store: Option<Arc<dyn ModelStore>>,
    metrics: Metrics,
}

impl RetrainWorker {
    fn run(self, rx: Receiver<TrainingTask>) {
        // Ends once every sender is gone
        for task in rx.iter() {
            self.train(task);
        }
        debug!("RetrainScheduler [{}]: Queue closed", self.name);
    }

    fn train(&self, task: TrainingTask) {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.trainer.train(&task.examples)
        }));
        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.observe_training(&self.name, elapsed);

        let model = match result {
            Ok(Ok(model)) => model,
            Ok(Err(e)) => {
                error!(
                    "RetrainScheduler [{}]: Training on {} examples for {} failed: {}",
                    self.name,
                    task.examples.len(),
                    task.symbol,
                    e
                );
                self.metrics.inc_training(&self.name, "failure");
                return;
            }
            Err(_) => {
                error!(
                    "RetrainScheduler [{}]: Trainer {} panicked, keeping active model",
                    self.name,
                    self.trainer.name()
                );
                self.metrics.inc_training(&self.name, "panic");
                return;
            }
        };

        let generation = self.registry.publish(Arc::clone(&model));
        self.metrics.inc_training(&self.name, "success");
        self.metrics.set_model_generation(&self.name, generation);
        info!(
            "RetrainScheduler [{}]: Training complete for {} ({} examples, as of {}, {:.3}s), generation {}",
            self.name,
            task.symbol,
            task.examples.len(),
            task.as_of,
            elapsed,
            generation
        );

        if let Some(store) = &self.store {
            let key = format!("{}_{}", self.name, task.symbol);
            match model.export() {
                Ok(bytes) => {
                    if let Err(e) = store.save(&key, &bytes) {
                        warn!("RetrainScheduler [{}]: Failed to save model: {}", self.name, e);
                    }
                }
                Err(e) => warn!("RetrainScheduler [{}]: Failed to export model: {}", self.name, e),
            }
        }
    }
}
