use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use chronik_types::{Entity, HistoryError, HistoryResult, WorldId};

use crate::checkpoint::{draw, RngCheckpoint, RngCheckpointState};
use crate::traits::RngRegistry;

/// In-memory RNG checkpoint registry.
///
/// Keyed by `(world, context)` behind one `RwLock`; every mutation runs
/// under a single write-lock acquisition, so increments are atomic and a
/// bulk restore is all-or-nothing.
pub struct InMemoryRngRegistry {
    inner: RwLock<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    checkpoints: HashMap<(WorldId, String), RngCheckpoint>,
    next_id: u64,
}

impl RegistryState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl InMemoryRngRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState::default()),
        }
    }

    fn missing(world: &WorldId, context: &str) -> HistoryError {
        HistoryError::not_found(Entity::RngContext, format!("{world}/{context}"))
    }
}

impl Default for InMemoryRngRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RngRegistry for InMemoryRngRegistry {
    fn get_or_create(
        &self,
        world: &WorldId,
        context: &str,
        seed: &str,
    ) -> HistoryResult<RngCheckpoint> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        if let Some(existing) = state.checkpoints.get(&(world.clone(), context.to_string())) {
            return Ok(existing.clone());
        }

        let id = state.fresh_id();
        let checkpoint = RngCheckpoint {
            id,
            world_id: world.clone(),
            context: context.to_string(),
            seed: seed.to_string(),
            call_index: 0,
            last_value: None,
            updated_at: Utc::now(),
        };
        state
            .checkpoints
            .insert((world.clone(), context.to_string()), checkpoint.clone());
        debug!(world = %world, context, "rng context created");
        Ok(checkpoint)
    }

    fn get(&self, world: &WorldId, context: &str) -> HistoryResult<Option<RngCheckpoint>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;
        Ok(state
            .checkpoints
            .get(&(world.clone(), context.to_string()))
            .cloned())
    }

    fn increment(
        &self,
        world: &WorldId,
        context: &str,
        last_value: Option<String>,
    ) -> HistoryResult<RngCheckpoint> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        let checkpoint = state
            .checkpoints
            .get_mut(&(world.clone(), context.to_string()))
            .ok_or_else(|| Self::missing(world, context))?;

        checkpoint.call_index += 1;
        checkpoint.last_value = last_value;
        checkpoint.updated_at = Utc::now();
        Ok(checkpoint.clone())
    }

    fn next_value(&self, world: &WorldId, context: &str) -> HistoryResult<(f64, RngCheckpoint)> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        let checkpoint = state
            .checkpoints
            .get_mut(&(world.clone(), context.to_string()))
            .ok_or_else(|| Self::missing(world, context))?;

        let value = draw(&checkpoint.seed, checkpoint.call_index);
        checkpoint.call_index += 1;
        checkpoint.last_value = Some(value.to_string());
        checkpoint.updated_at = Utc::now();
        Ok((value, checkpoint.clone()))
    }

    fn reset(
        &self,
        world: &WorldId,
        context: &str,
        call_index: u64,
    ) -> HistoryResult<RngCheckpoint> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        let checkpoint = state
            .checkpoints
            .get_mut(&(world.clone(), context.to_string()))
            .ok_or_else(|| Self::missing(world, context))?;

        checkpoint.call_index = call_index;
        checkpoint.last_value = None;
        checkpoint.updated_at = Utc::now();
        debug!(world = %world, context, call_index, "rng context reset");
        Ok(checkpoint.clone())
    }

    fn update_seed(
        &self,
        world: &WorldId,
        context: &str,
        new_seed: &str,
    ) -> HistoryResult<RngCheckpoint> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        let checkpoint = state
            .checkpoints
            .get_mut(&(world.clone(), context.to_string()))
            .ok_or_else(|| Self::missing(world, context))?;

        checkpoint.seed = new_seed.to_string();
        checkpoint.call_index = 0;
        checkpoint.last_value = None;
        checkpoint.updated_at = Utc::now();
        debug!(world = %world, context, "rng seed replaced");
        Ok(checkpoint.clone())
    }

    fn restore_from_snapshot(
        &self,
        world: &WorldId,
        states: &[RngCheckpointState],
    ) -> HistoryResult<Vec<RngCheckpoint>> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        // Whole-world replacement under one lock: contexts absent from the
        // restore list are deleted.
        state.checkpoints.retain(|(wid, _), _| wid != world);

        let now = Utc::now();
        let mut restored = Vec::with_capacity(states.len());
        for s in states {
            let id = state.fresh_id();
            let checkpoint = RngCheckpoint {
                id,
                world_id: world.clone(),
                context: s.context.clone(),
                seed: s.seed.clone(),
                call_index: s.call_index,
                last_value: s.last_value.clone(),
                updated_at: now,
            };
            state
                .checkpoints
                .insert((world.clone(), s.context.clone()), checkpoint.clone());
            restored.push(checkpoint);
        }
        debug!(world = %world, contexts = restored.len(), "rng checkpoints restored from snapshot");
        Ok(restored)
    }

    fn get_all_for_world(&self, world: &WorldId) -> HistoryResult<Vec<RngCheckpoint>> {
        let state = self
            .inner
            .read()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;

        let mut all: Vec<RngCheckpoint> = state
            .checkpoints
            .iter()
            .filter(|((wid, _), _)| wid == world)
            .map(|(_, cp)| cp.clone())
            .collect();
        all.sort_by(|a, b| a.context.cmp(&b.context));
        Ok(all)
    }

    fn list_contexts(&self, world: &WorldId) -> HistoryResult<Vec<String>> {
        Ok(self
            .get_all_for_world(world)?
            .into_iter()
            .map(|cp| cp.context)
            .collect())
    }

    fn delete_context(&self, world: &WorldId, context: &str) -> HistoryResult<bool> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;
        Ok(state
            .checkpoints
            .remove(&(world.clone(), context.to_string()))
            .is_some())
    }

    fn delete_all_for_world(&self, world: &WorldId) -> HistoryResult<u64> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| HistoryError::poisoned("rng registry"))?;
        let before = state.checkpoints.len();
        state.checkpoints.retain(|(wid, _), _| wid != world);
        Ok((before - state.checkpoints.len()) as u64)
    }
}

impl std::fmt::Debug for InMemoryRngRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.read().map(|s| s.checkpoints.len()).unwrap_or(0);
        f.debug_struct("InMemoryRngRegistry")
            .field("checkpoint_count", &count)
            .finish()
    }
}
