use serde_json::Value;

use chronik_types::{EventType, HistoryResult, WorldId};

use crate::record::{Event, EventFilter, EventPage};

/// Write boundary for the event log. Append is the only mutation; events
/// are never updated, deleted, or reordered.
pub trait LogWriter: Send + Sync {
    /// Append one event to a world's chain and return the stored record.
    ///
    /// Fetches the current chain tail (or the genesis sentinel for an empty
    /// world), computes the new hash, assigns the next serial id, and
    /// persists atomically.
    fn append(
        &self,
        world: &WorldId,
        event_type: EventType,
        actor_id: Option<String>,
        target_id: Option<String>,
        payload: Value,
    ) -> HistoryResult<Event>;
}

/// Read boundary for event queries and replay.
pub trait LogReader: Send + Sync {
    /// Filtered query, ascending by event id, paged by `filter.limit`.
    fn query(&self, world: &WorldId, filter: &EventFilter) -> HistoryResult<EventPage>;

    /// Most recent events first, for cheap recent-activity views.
    fn get_last(&self, world: &WorldId, limit: usize) -> HistoryResult<Vec<Event>>;

    /// Fetch one event by id.
    fn get(&self, world: &WorldId, event_id: u64) -> HistoryResult<Option<Event>>;

    /// The chain tail (highest-id event), or `None` for an empty world.
    fn head(&self, world: &WorldId) -> HistoryResult<Option<Event>>;

    /// Inclusive id range, ascending, unfiltered. Used by verification and
    /// replay.
    fn read_range(&self, world: &WorldId, from_id: u64, to_id: u64) -> HistoryResult<Vec<Event>>;

    /// Number of events recorded for a world.
    fn event_count(&self, world: &WorldId) -> HistoryResult<u64>;
}
