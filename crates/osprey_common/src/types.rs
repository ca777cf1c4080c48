use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a shard.
///
/// Ids are assigned by the registry builder and are contiguous from 0 to
/// N-1 within one registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ShardId(pub u64);

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard:{}", self.0)
    }
}
