pub mod historical;
pub mod mock;
pub mod observability;
pub mod persistence;

pub use historical::load_candles_csv;
pub use mock::{MockCandleFeed, MockExecutionService};
pub use persistence::FileModelStore;
