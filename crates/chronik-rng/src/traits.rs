use chronik_types::{HistoryResult, WorldId};

use crate::checkpoint::{RngCheckpoint, RngCheckpointState};

/// Registry boundary for deterministic RNG checkpoints.
pub trait RngRegistry: Send + Sync {
    /// Return the checkpoint for `(world, context)`, creating it with
    /// `call_index = 0` if the context was never used. An existing
    /// checkpoint is returned unchanged — the originally registered seed
    /// wins, later calls cannot silently rebase the stream.
    fn get_or_create(
        &self,
        world: &WorldId,
        context: &str,
        seed: &str,
    ) -> HistoryResult<RngCheckpoint>;

    /// Fetch without creating.
    fn get(&self, world: &WorldId, context: &str) -> HistoryResult<Option<RngCheckpoint>>;

    /// Atomically bump `call_index` by exactly 1 and record `last_value`.
    /// Fails with `NotFound` if the context was never created.
    fn increment(
        &self,
        world: &WorldId,
        context: &str,
        last_value: Option<String>,
    ) -> HistoryResult<RngCheckpoint>;

    /// Draw the next deterministic value and advance the cursor, in one
    /// atomic step. Returns the drawn value with the updated checkpoint.
    fn next_value(&self, world: &WorldId, context: &str) -> HistoryResult<(f64, RngCheckpoint)>;

    /// Set `call_index` to an explicit value and clear `last_value`; used
    /// to rewind a stream for deterministic replay to a known point.
    fn reset(&self, world: &WorldId, context: &str, call_index: u64)
        -> HistoryResult<RngCheckpoint>;

    /// Replace the seed and reset `call_index` to 0, starting an
    /// independent stream.
    fn update_seed(
        &self,
        world: &WorldId,
        context: &str,
        new_seed: &str,
    ) -> HistoryResult<RngCheckpoint>;

    /// Transactionally replace the entire checkpoint set for a world with
    /// the given states, deleting any context not present in the list.
    /// This is how RNG state travels with a snapshot restore.
    fn restore_from_snapshot(
        &self,
        world: &WorldId,
        states: &[RngCheckpointState],
    ) -> HistoryResult<Vec<RngCheckpoint>>;

    /// All checkpoints for a world, sorted by context.
    fn get_all_for_world(&self, world: &WorldId) -> HistoryResult<Vec<RngCheckpoint>>;

    /// Context names registered for a world, sorted.
    fn list_contexts(&self, world: &WorldId) -> HistoryResult<Vec<String>>;

    /// Delete one context. Returns `true` if it existed.
    fn delete_context(&self, world: &WorldId, context: &str) -> HistoryResult<bool>;

    /// Delete every context of a world. Returns the number deleted.
    fn delete_all_for_world(&self, world: &WorldId) -> HistoryResult<u64>;
}
