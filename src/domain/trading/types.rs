use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Which leg of the strategy an order belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Order side that opens this leg
    pub fn entry_side(self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        }
    }

    /// Order side that closes this leg
    pub fn exit_side(self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// What a decision callback asks the evaluator to do with one leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionAction {
    Open,
    Close,
    #[default]
    None,
}

impl PositionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionAction::Open => "open",
            PositionAction::Close => "close",
            PositionAction::None => "none",
        }
    }
}

/// One OHLCV bar plus the trade metadata exchanges attach to klines.
/// Identity is `(symbol, open_time)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub open_time: i64,
    pub close_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub quote_volume: Decimal,
    #[serde(default)]
    pub trade_count: u64,
    #[serde(default)]
    pub taker_buy_base_volume: Decimal,
    #[serde(default)]
    pub taker_buy_quote_volume: Decimal,
}

impl Candle {
    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(0.0)
    }
}

/// Assets a strategy instance trades.
///
/// The exchange symbol is `quote_asset + base_asset`, e.g. quote `BTC` on
/// base `USDT` trades `BTCUSDT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub base_asset: String,
    pub trade_asset: String,
    pub quote_asset: String,
}

impl TradingPair {
    pub fn new(
        base_asset: impl Into<String>,
        trade_asset: impl Into<String>,
        quote_asset: impl Into<String>,
    ) -> Self {
        Self {
            base_asset: base_asset.into(),
            trade_asset: trade_asset.into(),
            quote_asset: quote_asset.into(),
        }
    }

    pub fn symbol(&self) -> String {
        format!("{}{}", self.quote_asset, self.base_asset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub intent: PositionAction,
    /// Reference price (candle close that triggered the order)
    pub price: Decimal,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub timestamp: i64,
}

impl Order {
    pub fn market(
        symbol: &str,
        position_side: PositionSide,
        intent: PositionAction,
        price: Decimal,
        quantity: Decimal,
        timestamp: i64,
    ) -> Self {
        let side = match intent {
            PositionAction::Close => position_side.exit_side(),
            _ => position_side.entry_side(),
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            side,
            position_side,
            intent,
            price,
            quantity,
            order_type: OrderType::Market,
            timestamp,
        }
    }
}
