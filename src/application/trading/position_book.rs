use super::client_set::ClientSet;
use super::order_executor::{OrderSink, RoutedOrder};
use crate::domain::ports::{PositionEvaluator, PositionPrices};
use crate::domain::trading::types::{Candle, Order, PositionAction, PositionSide};
use crate::infrastructure::observability::Metrics;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct PositionLeg {
    side: PositionSide,
    open: bool,
    prices: PositionPrices,
}

impl PositionLeg {
    fn new(side: PositionSide) -> Self {
        Self {
            side,
            open: false,
            prices: PositionPrices::default(),
        }
    }

    /// Order for a callback result, `None` when the action is a no-op for
    /// the leg's current state
    fn order_for(&self, action: PositionAction, candle: &Candle, quantity: Decimal) -> Option<Order> {
        match action {
            PositionAction::Open if !self.open => {}
            PositionAction::Close if self.open => {}
            PositionAction::Open | PositionAction::Close => {
                debug!(
                    "PositionBook [{}]: Ignoring {} on {} leg (open={})",
                    candle.symbol,
                    action.as_str(),
                    self.side.as_str(),
                    self.open
                );
                return None;
            }
            PositionAction::None => return None,
        }

        Some(Order::market(
            &candle.symbol,
            self.side,
            action,
            candle.close,
            quantity,
            candle.close_time,
        ))
    }

    fn commit(&mut self, action: PositionAction, price: Decimal) {
        match action {
            PositionAction::Open => {
                self.open = true;
                self.prices.last_enter_price = Some(price);
            }
            PositionAction::Close => {
                self.open = false;
                self.prices.last_close_price = Some(price);
            }
            PositionAction::None => {}
        }
    }
}

/// Position lifecycle bookkeeping for one trading pair.
///
/// Tracks entry/exit prices per leg and turns effective OPEN/CLOSE actions
/// into market orders routed to the current exchange clients. A leg only
/// changes state once its order is on the queue; without a queue the book
/// tracks positions on its own.
pub struct PositionBook {
    symbol: String,
    quantity: Decimal,
    clients: Arc<ClientSet>,
    orders: Option<OrderSink>,
    metrics: Option<Metrics>,
    last_candle: Option<Candle>,
    long: PositionLeg,
    short: PositionLeg,
}

impl PositionBook {
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        clients: Arc<ClientSet>,
        orders: Option<OrderSink>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            clients,
            orders,
            metrics: None,
            last_candle: None,
            long: PositionLeg::new(PositionSide::Long),
            short: PositionLeg::new(PositionSide::Short),
        }
    }

    /// Count orders dropped at the queue
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_open(&self, side: PositionSide) -> bool {
        self.leg(side).open
    }

    pub fn prices(&self, side: PositionSide) -> PositionPrices {
        self.leg(side).prices
    }

    fn leg(&self, side: PositionSide) -> &PositionLeg {
        match side {
            PositionSide::Long => &self.long,
            PositionSide::Short => &self.short,
        }
    }

    /// Hand the order to the executor. Returns false when it was dropped.
    fn route(&self, order: Order) -> bool {
        info!(
            "PositionBook [{}]: {} {} leg at {} ({})",
            self.symbol,
            order.intent.as_str(),
            order.position_side.as_str(),
            order.price,
            order.side
        );

        let Some(sink) = &self.orders else {
            return true;
        };

        let routed = RoutedOrder {
            order,
            clients: self.clients.snapshot(),
        };
        let (reason, routed) = match sink.try_send(routed) {
            Ok(()) => return true,
            Err(TrySendError::Full(routed)) => ("Order queue full", routed),
            Err(TrySendError::Closed(routed)) => ("Order executor gone", routed),
        };
        warn!(
            "PositionBook [{}]: {}, order {} dropped, {} leg unchanged",
            self.symbol,
            reason,
            routed.order.id,
            routed.order.position_side.as_str()
        );
        if let Some(metrics) = &self.metrics {
            metrics.inc_orders("queue", "dropped");
        }
        false
    }

    fn apply(&mut self, side: PositionSide, action: PositionAction, candle: &Candle) {
        let Some(order) = self.leg(side).order_for(action, candle, self.quantity) else {
            return;
        };
        if self.route(order) {
            let leg = match side {
                PositionSide::Long => &mut self.long,
                PositionSide::Short => &mut self.short,
            };
            leg.commit(action, candle.close);
        }
    }
}

impl PositionEvaluator for PositionBook {
    fn next(&mut self, symbol: &str, candle: &Candle) {
        if symbol != self.symbol {
            warn!(
                "PositionBook [{}]: Candle for unexpected symbol {} ignored",
                self.symbol, symbol
            );
            return;
        }
        self.last_candle = Some(candle.clone());
    }

    fn evaluate(
        &mut self,
        long: &mut dyn FnMut(&PositionPrices) -> PositionAction,
        short: &mut dyn FnMut(&PositionPrices) -> PositionAction,
    ) {
        let long_action = long(&self.long.prices);
        let short_action = short(&self.short.prices);

        let Some(candle) = self.last_candle.clone() else {
            if long_action != PositionAction::None || short_action != PositionAction::None {
                warn!(
                    "PositionBook [{}]: No candle seen yet, actions not applied",
                    self.symbol
                );
            }
            return;
        };

        self.apply(PositionSide::Long, long_action, &candle);
        self.apply(PositionSide::Short, short_action, &candle);
    }

    fn leg_open(&self, side: PositionSide) -> Option<bool> {
        Some(self.leg(side).open)
    }
}
