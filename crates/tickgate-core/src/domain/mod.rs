mod candle;
mod date;
mod symbol;

pub use candle::{Candle, SeriesPoint};
pub use date::{DateWindow, TradingDate};
pub use symbol::Symbol;
