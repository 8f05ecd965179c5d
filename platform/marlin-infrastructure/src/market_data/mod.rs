pub mod http;
pub mod ohlcv;
