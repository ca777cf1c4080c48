//! Shared types, error taxonomy, and configuration for the Osprey
//! shard fan-out query executor.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ExecutorConfig, FanoutConfig, TopologyConfig};
pub use error::{ConfigError, DriverError, ErrorScope, FanoutError, FanoutResult};
pub use types::ShardId;
