use serde_json::Value;

use chronik_types::{EventType, HistoryResult, WorldId};

use crate::entry::{EnqueueOptions, InboxEntry};

/// Store boundary for the deferred inbox.
pub trait Inbox: Send + Sync {
    /// Add a pending entry.
    fn enqueue(
        &self,
        world: &WorldId,
        event_type: EventType,
        payload: Value,
        options: EnqueueOptions,
    ) -> HistoryResult<InboxEntry>;

    /// Atomically claim the highest-priority, oldest eligible pending
    /// entry: flip it to `processing`, increment `attempts`, and return it.
    /// `None` if nothing is ready. Select-then-update happens inside one
    /// critical section, so no two concurrent callers claim the same entry.
    fn claim_next(&self, world: &WorldId) -> HistoryResult<Option<InboxEntry>>;

    /// Mark a processing entry completed.
    fn complete(&self, id: u64) -> HistoryResult<InboxEntry>;

    /// Mark a processing entry failed, recording the error.
    fn fail(&self, id: u64, error: &str) -> HistoryResult<InboxEntry>;

    /// Retry one failed entry; `ExhaustedRetries` once `attempts` has
    /// reached `max_attempts`.
    fn retry(&self, id: u64, max_attempts: u32) -> HistoryResult<InboxEntry>;

    /// Bulk-retry every failed entry of a world still within its budget.
    /// Exhausted entries are skipped, not errors. Returns the number
    /// requeued.
    fn retry_failed(&self, world: &WorldId, max_attempts: u32) -> HistoryResult<u64>;

    /// Sweep pending entries past `expires_at` to `expired`. Returns the
    /// number swept.
    fn expire_old(&self) -> HistoryResult<u64>;

    /// Fetch one entry.
    fn get(&self, id: u64) -> HistoryResult<Option<InboxEntry>>;

    /// Entries for a world, ascending by id.
    fn list(&self, world: &WorldId) -> HistoryResult<Vec<InboxEntry>>;

    /// Delete completed and expired entries created more than `keep_days`
    /// days ago. Returns the number deleted.
    fn cleanup(&self, keep_days: u32) -> HistoryResult<u64>;
}
