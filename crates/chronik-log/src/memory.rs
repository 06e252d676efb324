use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use chronik_types::{EventType, HistoryError, HistoryResult, WorldId, GENESIS_HASH};

use crate::record::{Event, EventFilter, EventPage};
use crate::traits::{LogReader, LogWriter};

/// In-memory event log for tests, local demos, and embedding.
///
/// One vector of events per world behind a single `RwLock`; `append` runs
/// entirely under one write-lock acquisition, which is the atomicity
/// guarantee for the tail-fetch / hash / persist sequence.
pub struct InMemoryEventLog {
    pub(crate) inner: RwLock<LogState>,
}

#[derive(Default)]
pub(crate) struct LogState {
    pub(crate) streams: HashMap<WorldId, Vec<Event>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LogState::default()),
        }
    }

    /// World ids with at least one event, sorted.
    pub fn worlds(&self) -> HistoryResult<Vec<WorldId>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;
        let mut ids: Vec<WorldId> = state.streams.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogWriter for InMemoryEventLog {
    fn append(
        &self,
        world: &WorldId,
        event_type: EventType,
        actor_id: Option<String>,
        target_id: Option<String>,
        payload: Value,
    ) -> HistoryResult<Event> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        let stream = state.streams.entry(world.clone()).or_default();
        let prev_hash = stream.last().map(|e| e.hash).unwrap_or(GENESIS_HASH);
        let id = stream.len() as u64 + 1;
        let timestamp = Utc::now();

        let hash = Event::compute_hash(
            &prev_hash,
            world,
            event_type,
            actor_id.as_deref(),
            target_id.as_deref(),
            &payload,
            &timestamp,
        )?;

        let event = Event {
            id,
            world_id: world.clone(),
            timestamp,
            event_type,
            actor_id,
            target_id,
            payload,
            hash,
            prev_hash,
        };

        stream.push(event.clone());
        debug!(world = %world, id, kind = %event_type, "event appended");
        Ok(event)
    }
}

impl LogReader for InMemoryEventLog {
    fn query(&self, world: &WorldId, filter: &EventFilter) -> HistoryResult<EventPage> {
        if let (Some(from), Some(to)) = (filter.from_event_id, filter.to_event_id) {
            if from > to {
                return Err(HistoryError::Validation(format!(
                    "invalid event id range: from={from}, to={to}"
                )));
            }
        }
        if let (Some(from), Some(to)) = (filter.from_timestamp, filter.to_timestamp) {
            if from > to {
                return Err(HistoryError::Validation(
                    "invalid timestamp range: from is after to".into(),
                ));
            }
        }

        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        let limit = filter.effective_limit();
        let mut events = Vec::new();
        let mut has_more = false;
        if let Some(stream) = state.streams.get(world) {
            for event in stream.iter().filter(|e| filter.matches(e)) {
                if events.len() == limit {
                    has_more = true;
                    break;
                }
                events.push(event.clone());
            }
        }

        Ok(EventPage { events, has_more })
    }

    fn get_last(&self, world: &WorldId, limit: usize) -> HistoryResult<Vec<Event>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        let Some(stream) = state.streams.get(world) else {
            return Ok(vec![]);
        };
        Ok(stream.iter().rev().take(limit).cloned().collect())
    }

    fn get(&self, world: &WorldId, event_id: u64) -> HistoryResult<Option<Event>> {
        if event_id == 0 {
            return Ok(None);
        }
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        Ok(state
            .streams
            .get(world)
            .and_then(|stream| stream.get(event_id as usize - 1))
            .cloned())
    }

    fn head(&self, world: &WorldId) -> HistoryResult<Option<Event>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        Ok(state
            .streams
            .get(world)
            .and_then(|stream| stream.last())
            .cloned())
    }

    fn read_range(&self, world: &WorldId, from_id: u64, to_id: u64) -> HistoryResult<Vec<Event>> {
        if from_id == 0 || to_id == 0 || from_id > to_id {
            return Err(HistoryError::Validation(format!(
                "invalid event id range: from={from_id}, to={to_id}"
            )));
        }

        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        let Some(stream) = state.streams.get(world) else {
            return Ok(vec![]);
        };

        let start = (from_id - 1) as usize;
        if start >= stream.len() {
            return Ok(vec![]);
        }
        let end_exclusive = to_id.min(stream.len() as u64) as usize;
        Ok(stream[start..end_exclusive].to_vec())
    }

    fn event_count(&self, world: &WorldId) -> HistoryResult<u64> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("event log"))?;

        Ok(state
            .streams
            .get(world)
            .map(|s| s.len() as u64)
            .unwrap_or(0))
    }
}

impl std::fmt::Debug for InMemoryEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let worlds = self
            .inner
            .read()
            .map(|state| state.streams.len())
            .unwrap_or(0);
        f.debug_struct("InMemoryEventLog")
            .field("world_count", &worlds)
            .finish()
    }
}
