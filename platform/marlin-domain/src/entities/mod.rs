pub mod metrics;
pub mod portfolio;
