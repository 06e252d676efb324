use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use chronik_canon::{hash_value, to_canonical_value};
use chronik_types::{Digest, EventType, HistoryResult, WorldId};

/// Default page size for event queries.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Hard cap on event query page size.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// One link in a world's hash chain.
///
/// Created by `append` only and immutable thereafter; never deleted or
/// reordered. `hash` covers the canonical encoding of every content field
/// plus `prev_hash`, so any retroactive edit breaks verification at exactly
/// this event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Serial id, starting at 1 per world.
    pub id: u64,
    pub world_id: WorldId,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub payload: Value,
    /// SHA-256 over the canonical hash content (see [`Event::compute_hash`]).
    pub hash: Digest,
    /// The previous event's `hash`, or the genesis sentinel for event 1.
    pub prev_hash: Digest,
}

impl Event {
    /// Recompute this event's hash from its stored fields.
    ///
    /// Used by append (before the hash is assigned) and by chain
    /// verification (to detect tampering).
    pub fn compute_hash(
        prev_hash: &Digest,
        world_id: &WorldId,
        event_type: EventType,
        actor_id: Option<&str>,
        target_id: Option<&str>,
        payload: &Value,
        timestamp: &DateTime<Utc>,
    ) -> HistoryResult<Digest> {
        #[derive(Serialize)]
        struct HashContent<'a> {
            prev_hash: &'a Digest,
            world_id: &'a WorldId,
            event_type: EventType,
            actor_id: Option<&'a str>,
            target_id: Option<&'a str>,
            payload: &'a Value,
            timestamp: &'a DateTime<Utc>,
        }

        let content = to_canonical_value(&HashContent {
            prev_hash,
            world_id,
            event_type,
            actor_id,
            target_id,
            payload,
            timestamp,
        })?;
        Ok(hash_value(&content))
    }

    /// Recompute the hash from this event's own stored fields.
    pub fn recompute_hash(&self) -> HistoryResult<Digest> {
        Self::compute_hash(
            &self.prev_hash,
            &self.world_id,
            self.event_type,
            self.actor_id.as_deref(),
            self.target_id.as_deref(),
            &self.payload,
            &self.timestamp,
        )
    }
}

/// Filters for event queries. All fields are optional; ranges are
/// inclusive.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub actor_id: Option<String>,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
    pub from_event_id: Option<u64>,
    pub to_event_id: Option<u64>,
    /// Page size; defaults to [`DEFAULT_PAGE_LIMIT`], capped at
    /// [`MAX_PAGE_LIMIT`].
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(et) = self.event_type {
            if event.event_type != et {
                return false;
            }
        }
        if let Some(actor) = &self.actor_id {
            if event.actor_id.as_deref() != Some(actor.as_str()) {
                return false;
            }
        }
        if let Some(from) = self.from_timestamp {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to_timestamp {
            if event.timestamp > to {
                return false;
            }
        }
        if let Some(from) = self.from_event_id {
            if event.id < from {
                return false;
            }
        }
        if let Some(to) = self.to_event_id {
            if event.id > to {
                return false;
            }
        }
        true
    }

    /// Effective page size after defaulting and capping.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT)
    }
}

/// One page of query results, ascending by event id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<Event>,
    /// `true` if more matching events exist beyond this page.
    pub has_more: bool,
}
