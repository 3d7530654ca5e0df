// Position bookkeeping and order routing
pub mod client_set;
pub mod order_executor;
pub mod position_book;

pub use client_set::{ClientList, ClientSet};
pub use order_executor::{OrderExecutor, OrderSink, RoutedOrder, order_channel};
pub use position_book::PositionBook;
