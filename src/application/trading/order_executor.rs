use super::client_set::ClientList;
use crate::domain::trading::types::Order;
use crate::infrastructure::observability::Metrics;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// An order together with the clients that were active when it was decided
#[derive(Clone)]
pub struct RoutedOrder {
    pub order: Order,
    pub clients: ClientList,
}

pub type OrderSink = mpsc::Sender<RoutedOrder>;

pub fn order_channel(capacity: usize) -> (OrderSink, mpsc::Receiver<RoutedOrder>) {
    mpsc::channel(capacity.max(1))
}

/// Async consumer placing routed orders on every client of their snapshot.
/// Client failures are logged and counted; the loop only ends once every
/// sink has been dropped.
pub struct OrderExecutor {
    metrics: Metrics,
}

impl OrderExecutor {
    pub fn new(metrics: Metrics) -> Self {
        Self { metrics }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<RoutedOrder>) {
        info!("OrderExecutor: Started");
        while let Some(routed) = rx.recv().await {
            self.execute(routed).await;
        }
        info!("OrderExecutor: All order sinks closed, stopping");
    }

    async fn execute(&self, routed: RoutedOrder) {
        let RoutedOrder { order, clients } = routed;

        if clients.is_empty() {
            warn!(
                "OrderExecutor: No exchange clients for {} {} {} ({}), order {} skipped",
                order.intent.as_str(),
                order.position_side,
                order.symbol,
                order.side,
                order.id
            );
            self.metrics.inc_orders("none", "skipped");
            return;
        }

        for client in clients.iter() {
            match client.execute(order.clone()).await {
                Ok(()) => {
                    info!(
                        "OrderExecutor: {} {} {} {} @ {} placed on {}",
                        order.side,
                        order.quantity,
                        order.symbol,
                        order.position_side,
                        order.price,
                        client.name()
                    );
                    self.metrics.inc_orders(client.name(), "success");
                }
                Err(e) => {
                    error!(
                        "OrderExecutor: Order {} failed on {}: {}",
                        order.id,
                        client.name(),
                        e
                    );
                    self.metrics.inc_orders(client.name(), "failure");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ExecutionService;
    use crate::domain::trading::types::{PositionAction, PositionSide};
    use crate::infrastructure::mock::MockExecutionService;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn order() -> Order {
        Order::market(
            "BTCUSDT",
            PositionSide::Long,
            PositionAction::Open,
            dec!(100),
            dec!(0.5),
            0,
        )
    }

    #[tokio::test]
    async fn test_order_reaches_every_client() {
        let metrics = Metrics::new().unwrap();
        let a = Arc::new(MockExecutionService::new("a"));
        let failing = Arc::new(MockExecutionService::failing("broken"));
        let clients: Vec<Arc<dyn ExecutionService>> = vec![a.clone(), failing.clone()];

        let (tx, rx) = order_channel(4);
        let handle = tokio::spawn(OrderExecutor::new(metrics.clone()).run(rx));

        tx.send(RoutedOrder {
            order: order(),
            clients: Arc::new(clients),
        })
        .await
        .unwrap();
        drop(tx);
        tokio_test::assert_ok!(handle.await);

        assert_eq!(a.orders().await.len(), 1);
        assert!(failing.orders().await.is_empty());
        let rendered = metrics.render();
        assert!(rendered.contains("result=\"failure\""));
        assert!(rendered.contains("result=\"success\""));
    }

    #[tokio::test]
    async fn test_empty_client_list_skips_order() {
        let metrics = Metrics::new().unwrap();
        let executor = OrderExecutor::new(metrics.clone());
        executor
            .execute(RoutedOrder {
                order: order(),
                clients: Arc::new(Vec::new()),
            })
            .await;
        assert!(metrics.render().contains("result=\"skipped\""));
    }
}
