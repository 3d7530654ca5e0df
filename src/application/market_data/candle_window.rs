use crate::domain::trading::types::Candle;
use std::collections::VecDeque;

/// Fixed-capacity sliding window over the most recent candles.
///
/// Once full, every push evicts the oldest candle. A zero-capacity window
/// ignores pushes (the strategy has not been given any history yet).
#[derive(Debug, Clone, Default)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a window whose capacity is the length of the given history
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        let capacity = candles.len();
        Self {
            candles: candles.into(),
            capacity,
        }
    }

    pub fn push(&mut self, candle: Candle) {
        if self.capacity == 0 {
            return;
        }
        while self.candles.len() >= self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    /// Owned copy in chronological order, safe to hand to another thread
    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.candles.len() == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn candle(open_time: i64) -> Candle {
        let price = Decimal::from(100 + open_time);
        Candle {
            symbol: "BTCUSDT".to_string(),
            open_time,
            close_time: open_time + 59_999,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ONE,
            quote_volume: price,
            trade_count: 1,
            taker_buy_base_volume: Decimal::ZERO,
            taker_buy_quote_volume: Decimal::ZERO,
        }
    }

    fn open_times(window: &CandleWindow) -> Vec<i64> {
        window.iter().map(|c| c.open_time).collect()
    }

    #[test]
    fn test_fills_without_eviction_before_capacity() {
        let mut window = CandleWindow::new(3);
        window.push(candle(0));
        window.push(candle(1));
        assert_eq!(window.len(), 2);
        assert!(!window.is_full());
        assert_eq!(open_times(&window), vec![0, 1]);
    }

    #[test]
    fn test_evicts_oldest_once_full() {
        let mut window = CandleWindow::new(3);
        for t in 0..7 {
            window.push(candle(t));
            assert!(window.len() <= window.capacity());
        }
        assert!(window.is_full());
        assert_eq!(open_times(&window), vec![4, 5, 6]);
        assert_eq!(window.latest().map(|c| c.open_time), Some(6));
    }

    #[test]
    fn test_zero_capacity_push_is_noop() {
        let mut window = CandleWindow::default();
        window.push(candle(0));
        assert!(window.is_empty());
        assert!(!window.is_full());
    }

    #[test]
    fn test_from_candles_keeps_history_length() {
        let mut window = CandleWindow::from_candles((0..5).map(candle).collect());
        assert_eq!(window.capacity(), 5);
        window.push(candle(5));
        assert_eq!(open_times(&window), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut window = CandleWindow::new(2);
        window.push(candle(0));
        window.push(candle(1));
        let snapshot = window.snapshot();

        window.push(candle(2));

        assert_eq!(
            snapshot.iter().map(|c| c.open_time).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(open_times(&window), vec![1, 2]);
    }
}
