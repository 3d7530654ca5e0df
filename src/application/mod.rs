// Candle window
pub mod market_data;

// Feature pipeline, training worker and model registry
pub mod ml;

// Strategy glue and catalogue
pub mod strategies;

// Position bookkeeping and order routing
pub mod trading;
