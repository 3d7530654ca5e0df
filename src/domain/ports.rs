use crate::domain::errors::StrategyError;
use crate::domain::trading::types::{Candle, Order, PositionAction, PositionSide, TradingPair};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Exchange client able to place orders
#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn execute(&self, order: Order) -> Result<()>;

    fn name(&self) -> &str;
}

/// Last recorded prices of one position leg, handed to decision callbacks
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionPrices {
    pub last_enter_price: Option<Decimal>,
    pub last_close_price: Option<Decimal>,
}

/// Position lifecycle bookkeeping driven once per candle.
///
/// `evaluate` invokes each callback exactly once and applies the returned
/// action to the matching leg.
pub trait PositionEvaluator: Send {
    fn next(&mut self, symbol: &str, candle: &Candle);

    fn evaluate(
        &mut self,
        long: &mut dyn FnMut(&PositionPrices) -> PositionAction,
        short: &mut dyn FnMut(&PositionPrices) -> PositionAction,
    );

    /// Whether the leg is open after the last `evaluate`. `None` when the
    /// evaluator keeps no leg state and the requested actions stand as is.
    fn leg_open(&self, _side: PositionSide) -> Option<bool> {
        None
    }
}

/// Opaque persistence for trained models, keyed by strategy map name.
/// Latest save wins.
pub trait ModelStore: Send + Sync {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Lifecycle every tradable strategy exposes to the host process
pub trait StrategyModel: Send + Sync {
    fn init(
        &self,
        pair: TradingPair,
        clients: Vec<Arc<dyn ExecutionService>>,
        candles: Vec<Candle>,
        on_ready: &mut dyn FnMut(&str, bool),
    ) -> Result<(), StrategyError>;

    fn on_candle(&self, candle: Candle);

    fn update_clients(&self, clients: Vec<Arc<dyn ExecutionService>>);

    fn name(&self) -> &str;
}
