mod common;

use aitrade::application::market_data::CandleWindow;
use aitrade::application::ml::{
    ClosePercentagePipeline, ForestConfig, ForestTrainer, ModelRegistry, PipelineConfig,
    RetrainScheduler, TrainingTask,
};
use aitrade::application::strategies::{AiStrategy, AiStrategyConfig, StrategyDeps};
use aitrade::domain::ml::{FeaturePipeline, Model, ModelTrainer};
use aitrade::domain::ports::ModelStore;
use aitrade::domain::trading::types::TradingPair;
use aitrade::infrastructure::observability::Metrics;
use aitrade::infrastructure::persistence::FileModelStore;
use common::{candle, candles, wait_for};
use std::sync::Arc;

const SYMBOL: &str = "BTCUSDT";

fn pipeline() -> ClosePercentagePipeline {
    ClosePercentagePipeline::new(PipelineConfig {
        input_len: 1,
        policy_range: 1,
        label_ma_period: 2,
        trend_threshold_pct: 0.1,
    })
}

fn forest() -> ForestConfig {
    ForestConfig {
        n_trees: 10,
        ..Default::default()
    }
}

#[test]
fn test_identical_windows_give_identical_scores() {
    let closes = [100.0, 101.0, 102.0, 103.0, 104.0];
    let pipeline = pipeline();

    // Path one: window seeded from history, trained by the background worker
    let seeded = CandleWindow::from_candles(candles(SYMBOL, &closes));
    assert_eq!(seeded.capacity(), 5);
    let dataset = pipeline.build(&seeded.snapshot());
    let latest = dataset.latest.clone().unwrap();

    let registry = Arc::new(ModelRegistry::new());
    let scheduler = RetrainScheduler::spawn(
        "scenario",
        Arc::new(ForestTrainer::new(forest())),
        Arc::clone(&registry),
        None,
        Metrics::new().unwrap(),
    )
    .unwrap();
    scheduler.submit(TrainingTask {
        symbol: SYMBOL.to_string(),
        as_of: 4 * 60_000,
        examples: dataset.examples,
    });
    scheduler.shutdown();
    let background = registry.read().unwrap().predict(&latest).unwrap();

    // Path two: older candles pushed through and evicted, trained inline
    let mut rolled = CandleWindow::new(5);
    for (i, close) in [98.0, 99.0].iter().chain(closes.iter()).enumerate() {
        rolled.push(candle(SYMBOL, i as i64 - 2, *close));
    }
    assert_eq!(rolled.len(), 5);
    let rolled_dataset = pipeline.build(&rolled.snapshot());
    assert_eq!(rolled_dataset.latest.as_deref(), Some(latest.as_slice()));

    let inline = ForestTrainer::new(forest())
        .fit(&rolled_dataset.examples)
        .unwrap()
        .predict(&latest)
        .unwrap();

    assert_eq!(background, inline);
}

#[test]
fn test_warm_start_publishes_stored_model_before_training() {
    let dir = std::env::temp_dir().join(format!("aitrade-warm-{}", uuid::Uuid::new_v4()));
    let store: Arc<dyn ModelStore> = Arc::new(FileModelStore::new(&dir));
    let history = candles(SYMBOL, &[100.0, 101.0, 100.0, 102.0, 101.5, 103.0, 104.0]);

    // First run trains and persists under the strategy's map name
    let metrics = Metrics::new().unwrap();
    let first = AiStrategy::new(
        "AIStrategyV1",
        AiStrategyConfig::default(),
        Arc::new(pipeline()),
        Arc::new(ForestTrainer::new(forest())),
        StrategyDeps::new(metrics.clone()).with_store(Arc::clone(&store)),
    )
    .unwrap();
    first
        .init(
            TradingPair::new("USDT", "USDT", "BTC"),
            Vec::new(),
            history.clone(),
            &mut |_, _| {},
        )
        .unwrap();
    first.shutdown();
    assert!(first.is_ready());
    let saved = store.load("AIStrategyV1_BTCUSDT").unwrap().unwrap();
    assert!(ForestTrainer::new(forest()).restore(&saved).is_ok());

    // Second run starts from the stored model, even with no usable history
    let config = AiStrategyConfig {
        warm_start: true,
        ..Default::default()
    };
    let second = AiStrategy::new(
        "AIStrategyV1",
        config,
        Arc::new(pipeline()),
        Arc::new(ForestTrainer::new(forest())),
        StrategyDeps::new(Metrics::new().unwrap()).with_store(store),
    )
    .unwrap();
    second
        .init(
            TradingPair::new("USDT", "USDT", "BTC"),
            Vec::new(),
            history[..2].to_vec(),
            &mut |_, _| {},
        )
        .unwrap();
    assert!(wait_for(|| second.is_ready()));
    assert_eq!(second.model_generation(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}
