//! Online-retraining AI strategy.
//!
//! Every candle slides the window, rebuilds the dataset, offers a retrain task
//! to the background worker (dropped if one is already waiting) and, once a
//! model has been published, scores the newest feature vector and lets the
//! decision engine drive the position book.

use crate::application::market_data::CandleWindow;
use crate::application::ml::{ModelRegistry, RetrainScheduler, TrainingTask};
use crate::application::trading::{ClientSet, OrderSink, PositionBook};
use crate::domain::errors::StrategyError;
use crate::domain::ml::{Dataset, FeaturePipeline, ModelTrainer};
use crate::domain::ports::{ExecutionService, ModelStore, PositionEvaluator, StrategyModel};
use crate::domain::trading::decision::{
    DEFAULT_SIGNAL_THRESHOLD, Decision, DecisionEngine, DecisionPhase, Prediction,
};
use crate::domain::trading::types::{Candle, PositionAction, TradingPair};
use crate::infrastructure::observability::Metrics;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct AiStrategyConfig {
    /// Score a class must reach to count as a BUY or SELL
    pub signal_threshold: f64,
    /// Quantity per routed order
    pub trade_quantity: Decimal,
    /// Publish the last stored model at init, before the first retrain finishes
    pub warm_start: bool,
}

impl Default for AiStrategyConfig {
    fn default() -> Self {
        Self {
            signal_threshold: DEFAULT_SIGNAL_THRESHOLD,
            trade_quantity: Decimal::ONE,
            warm_start: false,
        }
    }
}

/// Shared collaborators handed to every strategy instance
#[derive(Clone)]
pub struct StrategyDeps {
    pub metrics: Metrics,
    pub orders: Option<OrderSink>,
    pub store: Option<Arc<dyn ModelStore>>,
}

impl StrategyDeps {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            metrics,
            orders: None,
            store: None,
        }
    }

    pub fn with_orders(mut self, orders: OrderSink) -> Self {
        self.orders = Some(orders);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ModelStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// Result of one candle cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    NotInitialized,
    /// Candle for another symbol; dropped before touching the window
    SymbolMismatch,
    /// Window too short to produce examples; nothing submitted or predicted
    InsufficientData,
    /// No model published yet
    NotReady,
    /// The active model could not score the features; decision state untouched
    PredictionFailed,
    Decided(Decision),
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::NotInitialized => "not_initialized",
            CycleOutcome::SymbolMismatch => "symbol_mismatch",
            CycleOutcome::InsufficientData => "insufficient_data",
            CycleOutcome::NotReady => "not_ready",
            CycleOutcome::PredictionFailed => "prediction_failed",
            CycleOutcome::Decided(_) => "decided",
        }
    }

    pub fn decision(&self) -> Option<Decision> {
        match self {
            CycleOutcome::Decided(decision) => Some(*decision),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategySnapshot {
    pub name: String,
    pub symbol: Option<String>,
    pub phase: DecisionPhase,
    pub last_prediction: i8,
    pub window_len: usize,
    pub model_generation: u64,
}

struct Session {
    map_name: String,
    symbol: String,
    window: CandleWindow,
    book: PositionBook,
}

struct StrategyState {
    session: Option<Session>,
    engine: DecisionEngine,
}

pub struct AiStrategy {
    id: String,
    config: AiStrategyConfig,
    pipeline: Arc<dyn FeaturePipeline>,
    trainer: Arc<dyn ModelTrainer>,
    registry: Arc<ModelRegistry>,
    scheduler: RetrainScheduler,
    clients: Arc<ClientSet>,
    deps: StrategyDeps,
    initialized: AtomicBool,
    state: Mutex<StrategyState>,
}

impl AiStrategy {
    /// Create the strategy and start its retrain worker
    pub fn new(
        id: impl Into<String>,
        config: AiStrategyConfig,
        pipeline: Arc<dyn FeaturePipeline>,
        trainer: Arc<dyn ModelTrainer>,
        deps: StrategyDeps,
    ) -> Result<Self, StrategyError> {
        let id = id.into();
        let registry = Arc::new(ModelRegistry::new());
        let scheduler = RetrainScheduler::spawn(
            id.clone(),
            Arc::clone(&trainer),
            Arc::clone(&registry),
            deps.store.clone(),
            deps.metrics.clone(),
        )?;

        Ok(Self {
            state: Mutex::new(StrategyState {
                session: None,
                engine: DecisionEngine::new(config.signal_threshold),
            }),
            id,
            config,
            pipeline,
            trainer,
            registry,
            scheduler,
            clients: Arc::new(ClientSet::default()),
            deps,
            initialized: AtomicBool::new(false),
        })
    }

    /// Bind the strategy to a pair, seed the window with history and queue
    /// the first training run. `on_ready` fires exactly once, right after
    /// that enqueue; the model may still be training when it does.
    pub fn init(
        &self,
        pair: TradingPair,
        clients: Vec<Arc<dyn ExecutionService>>,
        candles: Vec<Candle>,
        on_ready: &mut dyn FnMut(&str, bool),
    ) -> Result<(), StrategyError> {
        let symbol = pair.symbol();
        let map_name = format!("{}_{}", self.id, symbol);

        let mut state = self.lock_state();
        if state.session.is_some() {
            return Err(StrategyError::AlreadyInitialized { name: map_name });
        }

        self.clients.replace(clients);
        if self.config.warm_start {
            self.warm_start(&map_name);
        }

        let window = CandleWindow::from_candles(candles);
        let dataset = self.pipeline.build(&window.snapshot());
        if dataset.is_trainable() {
            let as_of = window.latest().map_or(0, |c| c.open_time);
            self.scheduler.submit(TrainingTask {
                symbol: symbol.clone(),
                as_of,
                examples: dataset.examples,
            });
        } else {
            warn!(
                "AiStrategy [{}]: History of {} candles is shorter than the {} needed to train",
                map_name,
                window.len(),
                self.pipeline.min_window()
            );
        }

        info!(
            "AiStrategy [{}]: Initialized {} (window {}, trade asset {})",
            map_name,
            symbol,
            window.capacity(),
            pair.trade_asset
        );

        let book = PositionBook::new(
            symbol.clone(),
            self.config.trade_quantity,
            Arc::clone(&self.clients),
            self.deps.orders.clone(),
        )
        .with_metrics(self.deps.metrics.clone());
        state.session = Some(Session {
            map_name: map_name.clone(),
            symbol,
            window,
            book,
        });
        self.initialized.store(true, Ordering::Release);
        drop(state);

        on_ready(&map_name, true);
        Ok(())
    }

    /// Run one candle through the pipeline
    pub fn process_candle(&self, candle: Candle) -> CycleOutcome {
        let outcome = self.run_cycle(candle);
        self.deps.metrics.inc_cycle(&self.id, outcome.as_str());

        if let Some(decision) = outcome.decision() {
            for (side, action) in [("long", decision.long), ("short", decision.short)] {
                if action != PositionAction::None {
                    self.deps
                        .metrics
                        .inc_position_signal(&self.id, side, action.as_str());
                }
            }
        }
        outcome
    }

    fn run_cycle(&self, candle: Candle) -> CycleOutcome {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let Some(session) = state.session.as_mut() else {
            return CycleOutcome::NotInitialized;
        };

        if candle.symbol != session.symbol {
            warn!(
                "AiStrategy [{}]: Ignoring {} candle {}",
                session.map_name, candle.symbol, candle.open_time
            );
            return CycleOutcome::SymbolMismatch;
        }

        session.window.push(candle.clone());

        let Dataset { examples, latest } = self.pipeline.build(&session.window.snapshot());
        if examples.is_empty() {
            return CycleOutcome::InsufficientData;
        }

        self.scheduler.submit(TrainingTask {
            symbol: session.symbol.clone(),
            as_of: candle.open_time,
            examples,
        });

        let Some(model) = self.registry.read() else {
            return CycleOutcome::NotReady;
        };
        state.engine.mark_ready();

        let Some(features) = latest else {
            return CycleOutcome::InsufficientData;
        };

        let scores = match model.predict(&features) {
            Ok(scores) => scores,
            Err(e) => {
                warn!(
                    "AiStrategy [{}]: Prediction failed, skipping candle {}: {}",
                    session.map_name, candle.open_time, e
                );
                return CycleOutcome::PredictionFailed;
            }
        };

        let prediction = state.engine.classify(&scores);
        session.book.next(&candle.symbol, &candle);
        let decision = state.engine.evaluate(prediction, &mut session.book);

        debug!(
            "AiStrategy [{}]: scores buy={:.3} sell={:.3} hold={:.3} -> {} (long {}, short {})",
            session.map_name,
            scores.buy,
            scores.sell,
            scores.hold,
            prediction,
            decision.long.as_str(),
            decision.short.as_str()
        );

        CycleOutcome::Decided(decision)
    }

    pub fn update_clients(&self, clients: Vec<Arc<dyn ExecutionService>>) {
        if !self.initialized.load(Ordering::Acquire) {
            warn!(
                "AiStrategy [{}]: Strategy is not initialized, cannot update exchange clients",
                self.id
            );
            return;
        }
        self.clients.replace(clients);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn map_name(&self) -> Option<String> {
        self.lock_state()
            .session
            .as_ref()
            .map(|s| s.map_name.clone())
    }

    /// True once a trained model has been published
    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    pub fn model_generation(&self) -> u64 {
        self.registry.generation()
    }

    pub fn phase(&self) -> DecisionPhase {
        let mut state = self.lock_state();
        if self.registry.is_ready() {
            state.engine.mark_ready();
        }
        state.engine.phase()
    }

    pub fn last_prediction(&self) -> Prediction {
        self.lock_state().engine.last_prediction()
    }

    pub fn snapshot(&self) -> StrategySnapshot {
        let phase = self.phase();
        let state = self.lock_state();
        let session = state.session.as_ref();
        StrategySnapshot {
            name: self.id.clone(),
            symbol: session.map(|s| s.symbol.clone()),
            phase,
            last_prediction: state.engine.last_prediction().as_i8(),
            window_len: session.map_or(0, |s| s.window.len()),
            model_generation: self.registry.generation(),
        }
    }

    /// Stop the retrain worker, letting an in-flight run finish
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn warm_start(&self, key: &str) {
        let Some(store) = &self.deps.store else {
            return;
        };
        match store.load(key) {
            Ok(Some(bytes)) => match self.trainer.restore(&bytes) {
                Ok(model) => {
                    let generation = self.registry.publish(model);
                    self.deps.metrics.set_model_generation(&self.id, generation);
                    info!("AiStrategy [{}]: Warm-started from stored model", key);
                }
                Err(e) => warn!("AiStrategy [{}]: Stored model unusable: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => warn!("AiStrategy [{}]: Failed to load stored model: {}", key, e),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StrategyState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("AiStrategy [{}]: State lock poisoned, recovering", self.id);
            poisoned.into_inner()
        })
    }
}

impl StrategyModel for AiStrategy {
    fn init(
        &self,
        pair: TradingPair,
        clients: Vec<Arc<dyn ExecutionService>>,
        candles: Vec<Candle>,
        on_ready: &mut dyn FnMut(&str, bool),
    ) -> Result<(), StrategyError> {
        AiStrategy::init(self, pair, clients, candles, on_ready)
    }

    fn on_candle(&self, candle: Candle) {
        let open_time = candle.open_time;
        let outcome = self.process_candle(candle);
        debug!(
            "AiStrategy [{}]: Candle {} -> {}",
            self.id,
            open_time,
            outcome.as_str()
        );
    }

    fn update_clients(&self, clients: Vec<Arc<dyn ExecutionService>>) {
        AiStrategy::update_clients(self, clients)
    }

    fn name(&self) -> &str {
        &self.id
    }
}
