use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use chronik_canon::{canonical_string, to_canonical_value};
use chronik_types::{Digest, HistoryResult, WorldId};

/// A full snapshot record, including the state blob.
///
/// `checksum` must always equal a fresh SHA-256 of `state_blob`; any other
/// value signals corruption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: u64,
    pub world_id: WorldId,
    /// High-water mark: the greatest event id reflected in this snapshot.
    pub event_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Canonical serialization of the full world state.
    pub state_blob: String,
    pub checksum: Digest,
    pub size_bytes: u64,
    pub is_auto: bool,
}

impl Snapshot {
    /// Serialize a state value into its canonical blob with checksum and
    /// byte length. Runs before anything is persisted, so a serialization
    /// failure cannot leave a partial record.
    pub fn encode_state(state: &Value) -> HistoryResult<(String, Digest, u64)> {
        let canonical = to_canonical_value(state)?;
        let blob = canonical_string(&canonical);
        let checksum = Digest::of(blob.as_bytes());
        let size = blob.len() as u64;
        Ok((blob, checksum, size))
    }

    /// Recompute the checksum from the stored blob and compare.
    pub fn verify(&self) -> bool {
        Digest::of(self.state_blob.as_bytes()) == self.checksum
    }

    /// Decode the state blob back into a JSON value.
    pub fn decode_state(&self) -> HistoryResult<Value> {
        serde_json::from_str(&self.state_blob)
            .map_err(|e| chronik_types::HistoryError::Serialization(e.to_string()))
    }

    pub fn meta(&self) -> SnapshotMeta {
        SnapshotMeta {
            id: self.id,
            world_id: self.world_id.clone(),
            event_id: self.event_id,
            created_at: self.created_at,
            description: self.description.clone(),
            checksum: self.checksum,
            size_bytes: self.size_bytes,
            is_auto: self.is_auto,
        }
    }
}

/// Snapshot metadata without the heavy state blob, for listings and
/// inspection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: u64,
    pub world_id: WorldId,
    pub event_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub checksum: Digest,
    pub size_bytes: u64,
    pub is_auto: bool,
}
