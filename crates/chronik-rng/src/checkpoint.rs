use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chronik_types::{Digest, WorldId};

/// Pure deterministic draw: the same `(seed, call_index)` always yields the
/// same value in `[0, 1)`.
///
/// SHA-256 of `"{seed}:{call_index}"`, top 53 bits of the first 8 digest
/// bytes as the mantissa. 53 bits keep the value exactly representable,
/// so the result is bit-identical across platforms.
pub fn draw(seed: &str, call_index: u64) -> f64 {
    let digest = Digest::of(format!("{seed}:{call_index}").as_bytes());
    let bytes = digest.as_bytes();
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    let x = u64::from_be_bytes(raw) >> 11;
    x as f64 / (1u64 << 53) as f64
}

/// Persisted cursor of one deterministic draw stream, unique per
/// `(world_id, context)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RngCheckpoint {
    pub id: u64,
    pub world_id: WorldId,
    /// Logical stream name, e.g. `"combat"` or `"terrain"`.
    pub context: String,
    pub seed: String,
    /// Number of draws consumed so far; the next draw uses this index.
    pub call_index: u64,
    /// The most recent draw, recorded by `increment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl RngCheckpoint {
    /// The portable state that travels with a snapshot (everything except
    /// the store-assigned id and timestamp).
    pub fn state(&self) -> RngCheckpointState {
        RngCheckpointState {
            context: self.context.clone(),
            seed: self.seed.clone(),
            call_index: self.call_index,
            last_value: self.last_value.clone(),
        }
    }
}

/// Snapshot-portable checkpoint state, used by bulk restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngCheckpointState {
    pub context: String,
    pub seed: String,
    pub call_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_value: Option<String>,
}
