pub mod artifacts;
pub mod market_data;
pub mod result_store;
