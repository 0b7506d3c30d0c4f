pub mod client;
pub mod decode;
pub mod poller;
pub use anyhow::Result;
