#![allow(dead_code)]

use aitrade::domain::errors::ModelError;
use aitrade::domain::ml::{Example, Model, ModelTrainer, ScoreVector};
use aitrade::domain::trading::types::Candle;
use crossbeam_channel::{Receiver, Sender};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub fn candle(symbol: &str, index: i64, close: f64) -> Candle {
    let price = Decimal::from_f64(close).unwrap();
    Candle {
        symbol: symbol.to_string(),
        open_time: index * 60_000,
        close_time: index * 60_000 + 59_999,
        open: price,
        high: price,
        low: price,
        close: price,
        volume: Decimal::ONE,
        quote_volume: price,
        trade_count: 1,
        taker_buy_base_volume: Decimal::ZERO,
        taker_buy_quote_volume: Decimal::ZERO,
    }
}

pub fn candles(symbol: &str, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| candle(symbol, i as i64, *close))
        .collect()
}

pub fn wait_for(cond: impl Fn() -> bool) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

pub const BUY: ScoreVector = ScoreVector {
    buy: 0.9,
    sell: 0.1,
    hold: 0.1,
};
pub const SELL: ScoreVector = ScoreVector {
    buy: 0.1,
    sell: 0.9,
    hold: 0.1,
};
pub const HOLD: ScoreVector = ScoreVector {
    buy: 0.1,
    sell: 0.1,
    hold: 0.9,
};

/// Model answering from a shared script; HOLD once the script runs out
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<ScoreVector>>>,
}

impl Model for ScriptedModel {
    fn predict(&self, _features: &[f64]) -> Result<ScoreVector, ModelError> {
        Ok(self.script.lock().unwrap().pop_front().unwrap_or(HOLD))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn export(&self) -> Result<Vec<u8>, ModelError> {
        Ok(b"scripted".to_vec())
    }
}

/// Every trained model reads from the same script, so retrains never reset it
#[derive(Clone, Default)]
pub struct ScriptedTrainer {
    script: Arc<Mutex<VecDeque<ScoreVector>>>,
}

impl ScriptedTrainer {
    pub fn push(&self, scores: &[ScoreVector]) {
        self.script.lock().unwrap().extend(scores.iter().copied());
    }
}

impl ModelTrainer for ScriptedTrainer {
    fn train(&self, _examples: &[Example]) -> Result<Arc<dyn Model>, ModelError> {
        Ok(Arc::new(ScriptedModel {
            script: Arc::clone(&self.script),
        }))
    }

    fn restore(&self, _bytes: &[u8]) -> Result<Arc<dyn Model>, ModelError> {
        self.train(&[])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ConstantModel(pub f64);

impl Model for ConstantModel {
    fn predict(&self, _features: &[f64]) -> Result<ScoreVector, ModelError> {
        Ok(ScoreVector::new(self.0, 0.0, 0.0))
    }

    fn name(&self) -> &str {
        "constant"
    }

    fn export(&self) -> Result<Vec<u8>, ModelError> {
        Ok(self.0.to_string().into_bytes())
    }
}

/// Trainer that blocks every run until the test opens the gate. Tracks how
/// many runs overlap.
pub struct GatedTrainer {
    started: Sender<usize>,
    gate: Receiver<()>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub runs: AtomicUsize,
}

pub struct GateControl {
    pub started: Receiver<usize>,
    pub gate: Sender<()>,
}

impl GatedTrainer {
    pub fn new() -> (Arc<Self>, GateControl) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let trainer = Arc::new(Self {
            started: started_tx,
            gate: gate_rx,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
        });
        let control = GateControl {
            started: started_rx,
            gate: gate_tx,
        };
        (trainer, control)
    }
}

impl ModelTrainer for GatedTrainer {
    fn train(&self, examples: &[Example]) -> Result<Arc<dyn Model>, ModelError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.started.send(run);

        let _ = self.gate.recv();

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Arc::new(ConstantModel(examples.len() as f64 / 100.0)))
    }

    fn restore(&self, _bytes: &[u8]) -> Result<Arc<dyn Model>, ModelError> {
        Ok(Arc::new(ConstantModel(0.0)))
    }

    fn name(&self) -> &str {
        "gated"
    }
}
