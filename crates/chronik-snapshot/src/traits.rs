use serde_json::Value;

use chronik_types::{HistoryResult, WorldId};

use crate::record::{Snapshot, SnapshotMeta};

/// Store boundary for world-state snapshots.
///
/// Implementations must write atomically: a create that fails during
/// serialization leaves no partial record. Checksum mismatches are reported
/// by `verify`, never auto-corrected.
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot of `state` keyed to the given high-water event
    /// id. The caller supplies the high-water mark (the current chain tail
    /// of the world at capture time).
    fn create(
        &self,
        world: &WorldId,
        event_id: u64,
        state: &Value,
        description: Option<String>,
        is_auto: bool,
    ) -> HistoryResult<Snapshot>;

    /// Metadata only (no state blob), descending by creation time.
    fn list(
        &self,
        world: &WorldId,
        limit: usize,
        include_auto: bool,
    ) -> HistoryResult<Vec<SnapshotMeta>>;

    /// Metadata for one snapshot, for inspection.
    fn get(&self, id: u64) -> HistoryResult<Option<SnapshotMeta>>;

    /// The full record including the state blob.
    fn get_with_state(&self, id: u64) -> HistoryResult<Option<Snapshot>>;

    /// The snapshot with the greatest `event_id <= target`, or `None` if
    /// none exists (a rollback before the earliest snapshot must replay
    /// from genesis).
    fn get_nearest(&self, world: &WorldId, event_id: u64) -> HistoryResult<Option<Snapshot>>;

    /// The snapshot with the greatest event id for a world.
    fn get_latest(&self, world: &WorldId) -> HistoryResult<Option<Snapshot>>;

    /// Recompute the stored blob's checksum and compare. `false` means
    /// corruption; errors are reserved for unknown ids and store failures.
    fn verify(&self, id: u64) -> HistoryResult<bool>;

    /// Number of snapshots held for a world.
    fn count_by_world(&self, world: &WorldId) -> HistoryResult<u64>;

    /// Total stored blob bytes across all worlds.
    fn total_size(&self) -> HistoryResult<u64>;

    /// Retain the `keep_count` most-recent snapshots (by descending
    /// `event_id`) and delete the rest. Idempotent. Returns the number
    /// deleted.
    fn cleanup(&self, world: &WorldId, keep_count: usize) -> HistoryResult<u64>;
}
