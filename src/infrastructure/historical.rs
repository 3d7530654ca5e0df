use crate::domain::trading::types::Candle;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Load candles for `symbol` from a CSV file with a header row matching the
/// [`Candle`] field names. Rows are returned in open-time order with
/// duplicate `(symbol, open_time)` rows removed.
pub fn load_candles_csv(path: &Path, symbol: &str) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open candle history {:?}", path))?;

    let mut candles = Vec::new();
    for (line, record) in reader.deserialize::<Candle>().enumerate() {
        match record {
            Ok(candle) if candle.symbol == symbol => candles.push(candle),
            Ok(_) => {}
            Err(e) => warn!("Historical: Skipping row {} of {:?}: {}", line + 2, path, e),
        }
    }

    candles.sort_by_key(|c| c.open_time);
    candles.dedup_by_key(|c| c.open_time);

    info!(
        "Historical: Loaded {} {} candles from {:?}",
        candles.len(),
        symbol,
        path
    );
    Ok(candles)
}
