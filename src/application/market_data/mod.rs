// Market data processing modules
pub mod candle_window;

pub use candle_window::CandleWindow;
