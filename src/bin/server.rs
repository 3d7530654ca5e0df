//! AI Trade Server - headless strategy runner
//!
//! Seeds the strategy with history (CSV file or a synthetic random walk),
//! then feeds one candle per tick until Ctrl+C or the candle limit. Orders go
//! to a paper client. Metrics are pushed as structured JSON logs to stdout.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=models cargo run --bin server -- --history btcusdt_1m.csv --interval-ms 500
//! ```
//!
//! # Environment Variables
//! - `STRATEGY_ID` - Strategy from the catalogue (default: AIStrategyV1)
//! - `WINDOW_SIZE` - History length and rolling window capacity (default: 500)
//! - `MODEL_DIR` - Persist trained models here (default: unset, no persistence)
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)

use aitrade::application::strategies::{CycleOutcome, StrategyDeps, StrategyFactory};
use aitrade::application::trading::{OrderExecutor, order_channel};
use aitrade::config::Config;
use aitrade::domain::ports::ExecutionService;
use aitrade::infrastructure::observability::{Metrics, MetricsReporter};
use aitrade::infrastructure::{
    FileModelStore, MockCandleFeed, MockExecutionService, load_candles_csv,
};
use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::prelude::ToPrimitive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Online-retraining AI strategy runner", long_about = None)]
struct Args {
    /// CSV file with historical candles for the configured pair
    #[arg(long)]
    history: Option<PathBuf>,

    /// Stop after this many live candles (0 runs until Ctrl+C)
    #[arg(short, long, default_value = "0")]
    candles: usize,

    /// Milliseconds between two synthetic candles
    #[arg(long, default_value = "1000")]
    interval_ms: u64,

    /// Seed of the synthetic candle feed
    #[arg(long, default_value = "42")]
    seed: u64,

    /// First synthetic price when no history is given
    #[arg(long, default_value = "30000")]
    start_price: f64,

    /// Largest close-to-close move of a synthetic candle, in percent
    #[arg(long, default_value = "0.5")]
    volatility_pct: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("AI Trade Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let pair = config.strategy.pair();
    let symbol = pair.symbol();
    info!(
        "Configuration loaded: Strategy={}, Symbol={}, Window={}",
        config.strategy.strategy_id, symbol, config.strategy.window_size
    );

    let metrics = Metrics::new()?;

    let (order_tx, order_rx) = order_channel(config.order_queue_size);
    let executor = tokio::spawn(OrderExecutor::new(metrics.clone()).run(order_rx));

    let mut deps = StrategyDeps::new(metrics.clone()).with_orders(order_tx);
    if let Some(dir) = &config.model.model_dir {
        info!("Persisting trained models to {}", dir.display());
        deps = deps.with_store(Arc::new(FileModelStore::new(dir)));
    }

    let strategies = StrategyFactory::create_all(&config.strategy, &config.model, &deps)?;
    drop(deps);
    let strategy = strategies
        .get(&config.strategy.strategy_id)
        .cloned()
        .with_context(|| {
            format!(
                "Unknown STRATEGY_ID {}, available: {:?}",
                config.strategy.strategy_id,
                StrategyFactory::names()
            )
        })?;

    // History, then a synthetic feed continuing from its last candle
    let window_size = config.strategy.window_size;
    let (history, mut feed) = match &args.history {
        Some(path) => {
            let mut candles = load_candles_csv(path, &symbol)?;
            let skip = candles.len().saturating_sub(window_size);
            candles.drain(..skip);
            let (last_price, next_open) = candles.last().map_or((args.start_price, 0), |c| {
                (c.close.to_f64().unwrap_or(args.start_price), c.close_time + 1)
            });
            let feed = MockCandleFeed::new(&symbol, last_price, args.seed)
                .with_start_time(next_open)
                .with_volatility_pct(args.volatility_pct);
            (candles, feed)
        }
        None => {
            let mut feed = MockCandleFeed::new(&symbol, args.start_price, args.seed)
                .with_start_time(chrono::Utc::now().timestamp_millis())
                .with_volatility_pct(args.volatility_pct);
            (feed.take(window_size), feed)
        }
    };
    info!("Loaded {} history candles for {}", history.len(), symbol);

    let paper: Arc<dyn ExecutionService> = Arc::new(MockExecutionService::new("paper"));
    strategy.init(pair, vec![paper], history, &mut |name, ready| {
        info!("Strategy {} ready: {}", name, ready);
    })?;

    let reporter = if config.observability.enabled {
        let interval = config.observability.interval_secs;
        let reporter =
            MetricsReporter::new(strategies.values().cloned().collect(), metrics.clone(), interval);
        info!("Metrics reporter started (interval: {}s)", interval);
        Some(tokio::spawn(async move {
            reporter.run().await;
        }))
    } else {
        info!("Metrics reporting disabled.");
        None
    };

    info!("Server running. Press Ctrl+C to shutdown.");

    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut fed = 0usize;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let candle = feed.next_candle();
                if let CycleOutcome::PredictionFailed = strategy.process_candle(candle) {
                    warn!("Candle skipped after prediction failure");
                }
                fed += 1;
                if args.candles > 0 && fed >= args.candles {
                    info!("Candle limit {} reached", args.candles);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("Phase at shutdown: {:?}", strategy.phase());
    drop(strategy);

    // The reporter holds strategy handles, and with them order sinks
    if let Some(handle) = reporter {
        handle.abort();
        let _ = handle.await;
    }

    // Joining the retrain workers waits for an in-flight training run
    tokio::task::spawn_blocking(move || {
        for instance in strategies.values() {
            instance.shutdown();
        }
        drop(strategies);
    })
    .await
    .context("Strategy shutdown task failed")?;

    executor.await.context("Order executor task failed")?;
    info!("Shutdown complete.");

    Ok(())
}
