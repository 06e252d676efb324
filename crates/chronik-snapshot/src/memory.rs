use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use chronik_types::{Entity, HistoryError, HistoryResult, WorldId};

use crate::record::{Snapshot, SnapshotMeta};
use crate::traits::SnapshotStore;

/// In-memory snapshot store for tests, local demos, and embedding.
pub struct InMemorySnapshotStore {
    pub(crate) inner: RwLock<SnapshotState>,
}

#[derive(Default)]
pub(crate) struct SnapshotState {
    pub(crate) snapshots: HashMap<u64, Snapshot>,
    next_id: u64,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SnapshotState::default()),
        }
    }
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn create(
        &self,
        world: &WorldId,
        event_id: u64,
        state: &Value,
        description: Option<String>,
        is_auto: bool,
    ) -> HistoryResult<Snapshot> {
        // Serialize and checksum before touching the store, so a failure
        // here cannot leave a partial record.
        let (state_blob, checksum, size_bytes) = Snapshot::encode_state(state)?;

        let mut store = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        store.next_id += 1;
        let snapshot = Snapshot {
            id: store.next_id,
            world_id: world.clone(),
            event_id,
            created_at: Utc::now(),
            description,
            state_blob,
            checksum,
            size_bytes,
            is_auto,
        };
        store.snapshots.insert(snapshot.id, snapshot.clone());
        debug!(world = %world, id = snapshot.id, event_id, is_auto, "snapshot created");
        Ok(snapshot)
    }

    fn list(
        &self,
        world: &WorldId,
        limit: usize,
        include_auto: bool,
    ) -> HistoryResult<Vec<SnapshotMeta>> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        let mut metas: Vec<SnapshotMeta> = store
            .snapshots
            .values()
            .filter(|s| s.world_id == *world && (include_auto || !s.is_auto))
            .map(Snapshot::meta)
            .collect();
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        metas.truncate(limit);
        Ok(metas)
    }

    fn get(&self, id: u64) -> HistoryResult<Option<SnapshotMeta>> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;
        Ok(store.snapshots.get(&id).map(Snapshot::meta))
    }

    fn get_with_state(&self, id: u64) -> HistoryResult<Option<Snapshot>> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;
        Ok(store.snapshots.get(&id).cloned())
    }

    fn get_nearest(&self, world: &WorldId, event_id: u64) -> HistoryResult<Option<Snapshot>> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        Ok(store
            .snapshots
            .values()
            .filter(|s| s.world_id == *world && s.event_id <= event_id)
            .max_by_key(|s| (s.event_id, s.id))
            .cloned())
    }

    fn get_latest(&self, world: &WorldId) -> HistoryResult<Option<Snapshot>> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        Ok(store
            .snapshots
            .values()
            .filter(|s| s.world_id == *world)
            .max_by_key(|s| (s.event_id, s.id))
            .cloned())
    }

    fn verify(&self, id: u64) -> HistoryResult<bool> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        let snapshot = store
            .snapshots
            .get(&id)
            .ok_or_else(|| HistoryError::not_found(Entity::Snapshot, id))?;
        Ok(snapshot.verify())
    }

    fn count_by_world(&self, world: &WorldId) -> HistoryResult<u64> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;
        Ok(store
            .snapshots
            .values()
            .filter(|s| s.world_id == *world)
            .count() as u64)
    }

    fn total_size(&self) -> HistoryResult<u64> {
        let store = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;
        Ok(store.snapshots.values().map(|s| s.size_bytes).sum())
    }

    fn cleanup(&self, world: &WorldId, keep_count: usize) -> HistoryResult<u64> {
        let mut store = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("snapshot store"))?;

        let mut ids: Vec<(u64, u64)> = store
            .snapshots
            .values()
            .filter(|s| s.world_id == *world)
            .map(|s| (s.event_id, s.id))
            .collect();
        // Most recent by event_id (id breaks ties) survive.
        ids.sort_by(|a, b| b.cmp(a));

        let mut deleted = 0u64;
        for (_, id) in ids.into_iter().skip(keep_count) {
            store.snapshots.remove(&id);
            deleted += 1;
        }
        if deleted > 0 {
            debug!(world = %world, deleted, keep_count, "snapshot retention cleanup");
        }
        Ok(deleted)
    }
}

impl std::fmt::Debug for InMemorySnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.read().map(|s| s.snapshots.len()).unwrap_or(0);
        f.debug_struct("InMemorySnapshotStore")
            .field("snapshot_count", &count)
            .finish()
    }
}
