//! Shard registry: the ordered list of shard descriptors one run fans out
//! over.

use osprey_common::config::TopologyConfig;
use osprey_common::error::ConfigError;
use osprey_common::types::ShardId;

/// Supplies the connection target string for a shard id.
///
/// The baseline implementation is [`TopologyConfig`], which derives every
/// target from one configured server. A production deployment would back
/// this with an external shard catalog.
pub trait TargetProvider {
    fn connection_target(&self, shard: ShardId) -> String;
}

impl TargetProvider for TopologyConfig {
    fn connection_target(&self, shard: ShardId) -> String {
        TopologyConfig::connection_target(self, shard)
    }
}

/// Immutable description of one shard: identity plus the opaque connection
/// target the driver uses to reach it. Owned by the registry that created
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    pub id: ShardId,
    pub target: String,
}

/// An ordered sequence of shard descriptors with unique, contiguous ids
/// `0..N-1`. Iteration order is stable; the sequential strategy depends on
/// it for deterministic shard visiting order.
#[derive(Debug, Clone, Default)]
pub struct ShardRegistry {
    shards: Vec<ShardDescriptor>,
}

impl ShardRegistry {
    /// Build a registry of `shard_count` descriptors with targets from the
    /// provider.
    ///
    /// Fails only on a negative count; `0` is legal and yields an empty
    /// registry (the executor then returns an empty result set with zero
    /// timing, not an error).
    pub fn build(
        shard_count: i64,
        provider: &impl TargetProvider,
    ) -> Result<Self, ConfigError> {
        if shard_count < 0 {
            return Err(ConfigError::InvalidShardCount(shard_count));
        }
        let shards = (0..shard_count as u64)
            .map(|i| {
                let id = ShardId(i);
                ShardDescriptor {
                    id,
                    target: provider.connection_target(id),
                }
            })
            .collect();
        Ok(Self { shards })
    }

    /// All descriptors, in id order.
    pub fn descriptors(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}
