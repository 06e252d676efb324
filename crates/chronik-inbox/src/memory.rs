use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::debug;

use chronik_types::{Entity, EventType, HistoryError, HistoryResult, WorldId};

use crate::entry::{EnqueueOptions, InboxEntry, InboxStatus};
use crate::traits::Inbox;

/// In-memory deferred inbox.
///
/// Entries live in a `BTreeMap` by id behind one `RwLock`. `claim_next`
/// selects and flips the winning entry inside a single write-lock
/// acquisition, which is the select-then-update-in-one-transaction
/// contract.
pub struct InMemoryInbox {
    inner: RwLock<InboxState>,
}

#[derive(Default)]
struct InboxState {
    entries: BTreeMap<u64, InboxEntry>,
    next_id: u64,
}

impl InMemoryInbox {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(InboxState::default()),
        }
    }

    fn transition_guard(entry: &InboxEntry, expected: InboxStatus) -> HistoryResult<()> {
        if entry.status != expected {
            return Err(HistoryError::Validation(format!(
                "inbox entry {} is {}, expected {}",
                entry.id, entry.status, expected
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox for InMemoryInbox {
    fn enqueue(
        &self,
        world: &WorldId,
        event_type: EventType,
        payload: Value,
        options: EnqueueOptions,
    ) -> HistoryResult<InboxEntry> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        state.next_id += 1;
        let entry = InboxEntry {
            id: state.next_id,
            world_id: world.clone(),
            event_type,
            payload,
            status: InboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            process_after: options.process_after,
            expires_at: options.expires_at,
            source_type: options.source_type,
            source_id: options.source_id,
            priority: options.priority.unwrap_or(0),
        };
        state.entries.insert(entry.id, entry.clone());
        debug!(world = %world, id = entry.id, kind = %event_type, "inbox entry enqueued");
        Ok(entry)
    }

    fn claim_next(&self, world: &WorldId) -> HistoryResult<Option<InboxEntry>> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let now = Utc::now();
        // Highest priority first, then oldest; BTreeMap iteration breaks
        // created_at ties by ascending id.
        let winner = state
            .entries
            .values()
            .filter(|e| e.world_id == *world && e.is_claimable(now))
            .min_by_key(|e| (std::cmp::Reverse(e.priority), e.created_at, e.id))
            .map(|e| e.id);

        let Some(id) = winner else {
            return Ok(None);
        };

        let entry = state
            .entries
            .get_mut(&id)
            .ok_or_else(|| HistoryError::not_found(Entity::InboxEntry, id))?;
        entry.status = InboxStatus::Processing;
        entry.attempts += 1;
        debug!(world = %world, id, attempts = entry.attempts, "inbox entry claimed");
        Ok(Some(entry.clone()))
    }

    fn complete(&self, id: u64) -> HistoryResult<InboxEntry> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let entry = state
            .entries
            .get_mut(&id)
            .ok_or_else(|| HistoryError::not_found(Entity::InboxEntry, id))?;
        Self::transition_guard(entry, InboxStatus::Processing)?;
        entry.status = InboxStatus::Completed;
        Ok(entry.clone())
    }

    fn fail(&self, id: u64, error: &str) -> HistoryResult<InboxEntry> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let entry = state
            .entries
            .get_mut(&id)
            .ok_or_else(|| HistoryError::not_found(Entity::InboxEntry, id))?;
        Self::transition_guard(entry, InboxStatus::Processing)?;
        entry.status = InboxStatus::Failed;
        entry.last_error = Some(error.to_string());
        debug!(id, error, "inbox entry failed");
        Ok(entry.clone())
    }

    fn retry(&self, id: u64, max_attempts: u32) -> HistoryResult<InboxEntry> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let entry = state
            .entries
            .get_mut(&id)
            .ok_or_else(|| HistoryError::not_found(Entity::InboxEntry, id))?;
        Self::transition_guard(entry, InboxStatus::Failed)?;
        if entry.attempts >= max_attempts {
            return Err(HistoryError::ExhaustedRetries {
                id,
                attempts: entry.attempts,
                max_attempts,
            });
        }
        entry.status = InboxStatus::Pending;
        Ok(entry.clone())
    }

    fn retry_failed(&self, world: &WorldId, max_attempts: u32) -> HistoryResult<u64> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let mut requeued = 0u64;
        for entry in state.entries.values_mut() {
            if entry.world_id == *world
                && entry.status == InboxStatus::Failed
                && entry.attempts < max_attempts
            {
                entry.status = InboxStatus::Pending;
                requeued += 1;
            }
        }
        if requeued > 0 {
            debug!(world = %world, requeued, "failed inbox entries requeued");
        }
        Ok(requeued)
    }

    fn expire_old(&self) -> HistoryResult<u64> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let now = Utc::now();
        let mut swept = 0u64;
        for entry in state.entries.values_mut() {
            if entry.status == InboxStatus::Pending
                && entry.expires_at.is_some_and(|t| t <= now)
            {
                entry.status = InboxStatus::Expired;
                swept += 1;
            }
        }
        if swept > 0 {
            debug!(swept, "pending inbox entries expired");
        }
        Ok(swept)
    }

    fn get(&self, id: u64) -> HistoryResult<Option<InboxEntry>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("inbox"))?;
        Ok(state.entries.get(&id).cloned())
    }

    fn list(&self, world: &WorldId) -> HistoryResult<Vec<InboxEntry>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("inbox"))?;
        Ok(state
            .entries
            .values()
            .filter(|e| e.world_id == *world)
            .cloned()
            .collect())
    }

    fn cleanup(&self, keep_days: u32) -> HistoryResult<u64> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("inbox"))?;

        let horizon = Utc::now() - Duration::days(keep_days as i64);
        let before = state.entries.len();
        state.entries.retain(|_, e| {
            !(matches!(e.status, InboxStatus::Completed | InboxStatus::Expired)
                && e.created_at < horizon)
        });
        Ok((before - state.entries.len()) as u64)
    }
}

impl std::fmt::Debug for InMemoryInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.read().map(|s| s.entries.len()).unwrap_or(0);
        f.debug_struct("InMemoryInbox")
            .field("entry_count", &count)
            .finish()
    }
}
