use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ShardId;

/// Top-level fan-out configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutConfig {
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Shard topology: how many shards exist and how to reach them.
///
/// This is the configuration provider for the registry builder. In the
/// baseline every shard maps to the same backing server (sharding simulated
/// against one database); a production deployment would source per-shard
/// targets from an external shard catalog instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Number of shards to fan out over. 0 is legal and yields an empty
    /// registry.
    #[serde(default = "default_shard_count")]
    pub shard_count: u64,
    /// Database host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Database password. In production this should come from an env var or
    /// secrets manager.
    #[serde(default)]
    pub password: String,
}

fn default_shard_count() -> u64 {
    4
}
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    3306
}
fn default_database() -> String {
    "fanout".to_string()
}
fn default_user() -> String {
    "fanout".to_string()
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
            host: default_host(),
            port: default_port(),
            database: default_database(),
            user: default_user(),
            password: String::new(),
        }
    }
}

impl TopologyConfig {
    /// Render the opaque connection target string for one shard.
    ///
    /// The target is consumed verbatim by the database driver; the executor
    /// never parses it. The `shard=` key keeps targets distinct per shard
    /// even when every shard points at the same backing server.
    pub fn connection_target(&self, shard: ShardId) -> String {
        format!(
            "server={};port={};database={};user={};password={};shard={};",
            self.host, self.port, self.database, self.user, self.password, shard.0
        )
    }
}

/// Executor tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// The read-only statement issued against every shard.
    pub query: String,
    /// Worker pool size for the parallel strategy.
    /// 0 = available hardware parallelism.
    #[serde(default)]
    pub max_workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            query: "select value from test_sharding".to_string(),
            max_workers: 0,
        }
    }
}

impl ExecutorConfig {
    /// Effective worker pool size (0 resolves to available parallelism).
    pub fn effective_workers(&self) -> usize {
        if self.max_workers > 0 {
            return self.max_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl FanoutConfig {
    /// Validate the configuration. Returns Err(description) on violation.
    ///
    /// `shard_count == 0` is legal: the executor returns an empty result set
    /// with zero timing rather than an error.
    pub fn validate(&self) -> Result<(), String> {
        if self.executor.query.trim().is_empty() {
            return Err("executor.query must not be empty".into());
        }
        if self.topology.host.is_empty() {
            return Err("topology.host must not be empty".into());
        }
        if self.topology.port == 0 {
            return Err("topology.port must not be 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: FanoutConfig = toml::from_str(text)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
