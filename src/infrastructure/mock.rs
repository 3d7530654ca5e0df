use crate::domain::ports::ExecutionService;
use crate::domain::trading::types::{Candle, Order};
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Paper exchange client: records every order it receives
#[derive(Clone)]
pub struct MockExecutionService {
    name: String,
    orders: Arc<RwLock<Vec<Order>>>,
    reject_all: bool,
}

impl MockExecutionService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orders: Arc::new(RwLock::new(Vec::new())),
            reject_all: false,
        }
    }

    /// Client that rejects every order
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            reject_all: true,
            ..Self::new(name)
        }
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl ExecutionService for MockExecutionService {
    async fn execute(&self, order: Order) -> Result<()> {
        if self.reject_all {
            anyhow::bail!("Mock client {} rejected order {}", self.name, order.id);
        }
        info!(
            "MockExecution [{}]: {} {} {} @ {}",
            self.name, order.side, order.quantity, order.symbol, order.price
        );
        self.orders.write().await.push(order);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Seeded random-walk candle generator for headless runs and tests
pub struct MockCandleFeed {
    symbol: String,
    rng: StdRng,
    last_close: f64,
    next_open_time: i64,
    interval_ms: i64,
    volatility_pct: f64,
}

impl MockCandleFeed {
    pub fn new(symbol: impl Into<String>, start_price: f64, seed: u64) -> Self {
        Self {
            symbol: symbol.into(),
            rng: StdRng::seed_from_u64(seed),
            last_close: start_price,
            next_open_time: 0,
            interval_ms: 60_000,
            volatility_pct: 0.5,
        }
    }

    pub fn with_start_time(mut self, open_time: i64) -> Self {
        self.next_open_time = open_time;
        self
    }

    pub fn with_volatility_pct(mut self, volatility_pct: f64) -> Self {
        self.volatility_pct = volatility_pct;
        self
    }

    pub fn next_candle(&mut self) -> Candle {
        let open = self.last_close;
        let step = self.rng.random_range(-1.0..=1.0) * self.volatility_pct / 100.0;
        let close = (open * (1.0 + step)).max(0.01);
        let wick = self.rng.random_range(0.0..=0.5) * self.volatility_pct / 100.0;
        let high = open.max(close) * (1.0 + wick);
        let low = open.min(close) * (1.0 - wick);
        let volume = self.rng.random_range(1.0..100.0);
        let trade_count = self.rng.random_range(10..500);
        let taker_share = self.rng.random_range(0.2..0.8);

        let dec = |v: f64| Decimal::from_f64(v).unwrap_or_default().round_dp(8);
        let open_time = self.next_open_time;
        self.next_open_time += self.interval_ms;
        self.last_close = close;

        Candle {
            symbol: self.symbol.clone(),
            open_time,
            close_time: open_time + self.interval_ms - 1,
            open: dec(open),
            high: dec(high),
            low: dec(low),
            close: dec(close),
            volume: dec(volume),
            quote_volume: dec(volume * close),
            trade_count,
            taker_buy_base_volume: dec(volume * taker_share),
            taker_buy_quote_volume: dec(volume * taker_share * close),
        }
    }

    pub fn take(&mut self, count: usize) -> Vec<Candle> {
        (0..count).map(|_| self.next_candle()).collect()
    }
}
