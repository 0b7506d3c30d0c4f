pub mod constants;
pub mod dec;
pub mod indexer;
pub mod math;
pub mod order_config;
pub mod pool;
pub mod request;
pub mod slippage;
pub mod types;
pub use anyhow::{Context, Result};
