//! Hysteresis decision engine.
//!
//! Maps a 3-class score vector to a signed prediction and gates position
//! changes on two consecutive identical predictions. Long and short legs are
//! flagged independently so a repeated signal never re-enters an open leg.

use crate::domain::ml::ScoreVector;
use crate::domain::ports::PositionEvaluator;
use crate::domain::trading::types::{PositionAction, PositionSide};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Prediction {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Prediction {
    /// Classify scores. BUY is checked before SELL, so a vector that clears
    /// both thresholds is a BUY.
    pub fn classify(scores: &ScoreVector, threshold: f64) -> Self {
        if scores.buy >= threshold {
            Prediction::Buy
        } else if scores.sell >= threshold {
            Prediction::Sell
        } else {
            Prediction::Hold
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Prediction::Buy => 1,
            Prediction::Sell => -1,
            Prediction::Hold => 0,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Buy => write!(f, "BUY"),
            Prediction::Sell => write!(f, "SELL"),
            Prediction::Hold => write!(f, "HOLD"),
        }
    }
}

/// Position state derived from the readiness and leg flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionPhase {
    NotReady,
    Flat,
    Long,
    Short,
    LongAndShort,
}

/// What the engine asked of each leg on one candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub prediction: Prediction,
    pub long: PositionAction,
    pub short: PositionAction,
}

#[derive(Debug, Clone, Copy, Default)]
struct LegFlag {
    open: bool,
}

impl LegFlag {
    fn step(&mut self, side: PositionSide, confirmed: Option<Prediction>) -> PositionAction {
        let (entry, exit) = match side {
            PositionSide::Long => (Prediction::Buy, Prediction::Sell),
            PositionSide::Short => (Prediction::Sell, Prediction::Buy),
        };

        match confirmed {
            Some(p) if p == entry && !self.open => {
                self.open = true;
                PositionAction::Open
            }
            // Exit fires on every confirmed opposite signal, open or not
            Some(p) if p == exit => {
                self.open = false;
                PositionAction::Close
            }
            _ => PositionAction::None,
        }
    }
}

/// Per-strategy decision state. Mutated only from the candle path.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    threshold: f64,
    last_prediction: Prediction,
    long: LegFlag,
    short: LegFlag,
    ready: bool,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_THRESHOLD)
    }
}

impl DecisionEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_prediction: Prediction::Hold,
            long: LegFlag::default(),
            short: LegFlag::default(),
            ready: false,
        }
    }

    /// Readiness is permanent once a model has been published
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn last_prediction(&self) -> Prediction {
        self.last_prediction
    }

    pub fn long_open(&self) -> bool {
        self.long.open
    }

    pub fn short_open(&self) -> bool {
        self.short.open
    }

    pub fn phase(&self) -> DecisionPhase {
        if !self.ready {
            return DecisionPhase::NotReady;
        }
        match (self.long.open, self.short.open) {
            (false, false) => DecisionPhase::Flat,
            (true, false) => DecisionPhase::Long,
            (false, true) => DecisionPhase::Short,
            (true, true) => DecisionPhase::LongAndShort,
        }
    }

    pub fn classify(&self, scores: &ScoreVector) -> Prediction {
        Prediction::classify(scores, self.threshold)
    }

    /// Run one candle through the engine.
    ///
    /// The evaluator calls back once per leg; the returned actions are also
    /// reported in the [`Decision`]. `last_prediction` is updated afterwards
    /// whether or not anything fired.
    pub fn evaluate<E>(&mut self, prediction: Prediction, evaluator: &mut E) -> Decision
    where
        E: PositionEvaluator + ?Sized,
    {
        let confirmed = (prediction == self.last_prediction).then_some(prediction);

        let mut long_action = PositionAction::None;
        let mut short_action = PositionAction::None;
        let long = &mut self.long;
        let short = &mut self.short;

        evaluator.evaluate(
            &mut |_prices| {
                long_action = long.step(PositionSide::Long, confirmed);
                long_action
            },
            &mut |_prices| {
                short_action = short.step(PositionSide::Short, confirmed);
                short_action
            },
        );

        // An action the evaluator could not carry out leaves the leg as it was
        if let Some(open) = evaluator.leg_open(PositionSide::Long) {
            self.long.open = open;
        }
        if let Some(open) = evaluator.leg_open(PositionSide::Short) {
            self.short.open = open;
        }
        self.last_prediction = prediction;

        Decision {
            prediction,
            long: long_action,
            short: short_action,
        }
    }
}
