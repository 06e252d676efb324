use serde_json::Value;
use tracing::{debug, info, warn};

use chronik_log::{Event, LogReader};
use chronik_rng::{RngCheckpointState, RngRegistry};
use chronik_snapshot::SnapshotStore;
use chronik_types::{Entity, HistoryError, HistoryResult, WorldId};

use crate::applier::EventApplier;

/// Reserved top-level key in a snapshot state blob carrying the RNG
/// checkpoint states captured alongside the world state.
pub const RNG_CHECKPOINTS_KEY: &str = "rng_checkpoints";

/// Where a rollback ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackPhase {
    RestoringSnapshot,
    ReplayingEvents,
    Done,
    /// Terminal: the snapshot failed its checksum check; nothing was
    /// mutated.
    IntegrityFailure,
}

/// Summary of a completed rollback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollbackReport {
    pub snapshot_id: u64,
    /// High-water mark of the restored snapshot.
    pub snapshot_event_id: u64,
    /// Events re-applied past the snapshot.
    pub replayed_events: u64,
    pub phase: RollbackPhase,
}

/// Composes the event log, snapshot store, and RNG registry into
/// point-in-time reconstruction.
///
/// Handles are passed in explicitly; the orchestrator holds no state of
/// its own and no ambient globals.
pub struct ReplayOrchestrator<'a> {
    log: &'a dyn LogReader,
    snapshots: &'a dyn SnapshotStore,
    rng: &'a dyn RngRegistry,
}

impl<'a> ReplayOrchestrator<'a> {
    pub fn new(
        log: &'a dyn LogReader,
        snapshots: &'a dyn SnapshotStore,
        rng: &'a dyn RngRegistry,
    ) -> Self {
        Self {
            log,
            snapshots,
            rng,
        }
    }

    /// Restore a snapshot and optionally replay events past its high-water
    /// mark, up to `replay_to_event` inclusive.
    ///
    /// The checksum check is a hard gate: on mismatch nothing is restored,
    /// nothing is replayed, and the error carries the integrity failure.
    pub fn rollback_to_snapshot(
        &self,
        world: &WorldId,
        snapshot_id: u64,
        replay_to_event: Option<u64>,
        applier: &mut dyn EventApplier,
    ) -> HistoryResult<RollbackReport> {
        let snapshot = self
            .snapshots
            .get_with_state(snapshot_id)?
            .ok_or_else(|| HistoryError::not_found(Entity::Snapshot, snapshot_id))?;

        if snapshot.world_id != *world {
            return Err(HistoryError::Validation(format!(
                "snapshot {snapshot_id} belongs to world {}, not {world}",
                snapshot.world_id
            )));
        }

        debug!(world = %world, snapshot_id, phase = ?RollbackPhase::RestoringSnapshot, "rollback started");
        if !snapshot.verify() {
            warn!(world = %world, snapshot_id, "rollback refused: snapshot checksum mismatch");
            return Err(HistoryError::Integrity {
                world: world.clone(),
                reason: format!(
                    "snapshot {snapshot_id} checksum mismatch; rollback aborted before restore"
                ),
            });
        }

        let state = snapshot.decode_state()?;
        applier.restore_state(world, &state)?;

        // RNG streams travel inside the blob; put them back before any
        // event is re-applied so draws resume from the captured cursors.
        if let Some(states) = Self::embedded_rng_states(&state)? {
            self.rng.restore_from_snapshot(world, &states)?;
        }

        debug!(world = %world, snapshot_id, phase = ?RollbackPhase::ReplayingEvents, "snapshot restored");
        let mut replayed = 0u64;
        if let Some(target) = replay_to_event {
            if target > snapshot.event_id {
                let events = self.replay_events(world, snapshot.event_id + 1, target)?;
                for event in &events {
                    applier.apply(event)?;
                    replayed += 1;
                }
            }
        }

        info!(world = %world, snapshot_id, replayed, "rollback complete");
        Ok(RollbackReport {
            snapshot_id,
            snapshot_event_id: snapshot.event_id,
            replayed_events: replayed,
            phase: RollbackPhase::Done,
        })
    }

    /// Roll the world back to the state just after `event_id`: restore the
    /// nearest snapshot at or before it, then replay up to it.
    ///
    /// With no snapshot at or before the target, the error is explicit —
    /// the caller should replay from genesis rather than silently
    /// approximate.
    pub fn rollback_to_event(
        &self,
        world: &WorldId,
        event_id: u64,
        applier: &mut dyn EventApplier,
    ) -> HistoryResult<RollbackReport> {
        let nearest = self.snapshots.get_nearest(world, event_id)?;
        let Some(snapshot) = nearest else {
            return Err(HistoryError::not_found(
                Entity::Snapshot,
                format!(
                    "no snapshot at or before event {event_id} in world {world}; \
                     replay from genesis instead"
                ),
            ));
        };
        self.rollback_to_snapshot(world, snapshot.id, Some(event_id), applier)
    }

    /// Fetch the inclusive event range for re-application.
    ///
    /// Standalone, non-destructive: usable for read-only reconstruction
    /// and debugging without restoring anything.
    pub fn replay_events(
        &self,
        world: &WorldId,
        from_id: u64,
        to_id: u64,
    ) -> HistoryResult<Vec<Event>> {
        self.log.read_range(world, from_id, to_id)
    }

    fn embedded_rng_states(state: &Value) -> HistoryResult<Option<Vec<RngCheckpointState>>> {
        let Some(raw) = state.get(RNG_CHECKPOINTS_KEY) else {
            return Ok(None);
        };
        serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| HistoryError::Serialization(format!("bad rng checkpoint list: {e}")))
    }

    /// Capture a snapshot-ready state blob value: the engine state with the
    /// world's current RNG checkpoints embedded under
    /// [`RNG_CHECKPOINTS_KEY`].
    pub fn state_with_rng(&self, world: &WorldId, engine_state: &Value) -> HistoryResult<Value> {
        let checkpoints: Vec<RngCheckpointState> = self
            .rng
            .get_all_for_world(world)?
            .iter()
            .map(|cp| cp.state())
            .collect();

        let mut state = engine_state.clone();
        let map = state.as_object_mut().ok_or_else(|| {
            HistoryError::Validation("snapshot state must be a JSON object".into())
        })?;
        map.insert(
            RNG_CHECKPOINTS_KEY.into(),
            serde_json::to_value(&checkpoints)
                .map_err(|e| HistoryError::Serialization(e.to_string()))?,
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{json, Value};

    use chronik_log::{InMemoryEventLog, LogWriter};
    use chronik_rng::{InMemoryRngRegistry, RngRegistry};
    use chronik_snapshot::{InMemorySnapshotStore, Snapshot, SnapshotStore};
    use chronik_types::EventType;

    use super::*;

    /// Toy rule engine: state is a flat key/value map; every event payload
    /// is an object of keys to overwrite.
    #[derive(Default)]
    struct MapApplier {
        state: BTreeMap<String, Value>,
        restores: u32,
        applied: Vec<u64>,
    }

    impl EventApplier for MapApplier {
        fn restore_state(&mut self, _world: &WorldId, state: &Value) -> HistoryResult<()> {
            self.restores += 1;
            self.state.clear();
            if let Some(map) = state.as_object() {
                for (k, v) in map {
                    if k != RNG_CHECKPOINTS_KEY {
                        self.state.insert(k.clone(), v.clone());
                    }
                }
            }
            Ok(())
        }

        fn apply(&mut self, event: &Event) -> HistoryResult<()> {
            self.applied.push(event.id);
            if let Some(map) = event.payload.as_object() {
                for (k, v) in map {
                    self.state.insert(k.clone(), v.clone());
                }
            }
            Ok(())
        }
    }

    struct Fixture {
        log: InMemoryEventLog,
        snapshots: InMemorySnapshotStore,
        rng: InMemoryRngRegistry,
        world: WorldId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                log: InMemoryEventLog::new(),
                snapshots: InMemorySnapshotStore::new(),
                rng: InMemoryRngRegistry::new(),
                world: WorldId::from("w1"),
            }
        }

        fn orchestrator(&self) -> ReplayOrchestrator<'_> {
            ReplayOrchestrator::new(&self.log, &self.snapshots, &self.rng)
        }

        fn append(&self, key: &str, value: i64) -> Event {
            self.log
                .append(
                    &self.world,
                    EventType::System,
                    None,
                    None,
                    json!({ key: value }),
                )
                .unwrap()
        }
    }

    #[test]
    fn rollback_restores_then_replays_in_order() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        fx.append("hp", 8);
        let snap = fx
            .snapshots
            .create(&fx.world, 2, &json!({"hp": 8}), None, false)
            .unwrap();
        fx.append("hp", 5);
        fx.append("mp", 3);

        let orch = fx.orchestrator();
        let mut applier = MapApplier::default();
        let report = orch
            .rollback_to_snapshot(&fx.world, snap.id, Some(4), &mut applier)
            .unwrap();

        assert_eq!(report.phase, RollbackPhase::Done);
        assert_eq!(report.snapshot_event_id, 2);
        assert_eq!(report.replayed_events, 2);
        assert_eq!(applier.applied, [3, 4]);
        assert_eq!(applier.state.get("hp"), Some(&json!(5)));
        assert_eq!(applier.state.get("mp"), Some(&json!(3)));
    }

    #[test]
    fn replay_target_at_snapshot_replays_nothing() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        let snap = fx
            .snapshots
            .create(&fx.world, 1, &json!({"hp": 10}), None, false)
            .unwrap();

        let orch = fx.orchestrator();
        let mut applier = MapApplier::default();
        let report = orch
            .rollback_to_snapshot(&fx.world, snap.id, Some(1), &mut applier)
            .unwrap();
        assert_eq!(report.replayed_events, 0);
        assert_eq!(applier.restores, 1);
    }

    /// Serves one snapshot whose blob was rewritten after its checksum was
    /// recorded, simulating storage corruption.
    struct CorruptedStore {
        snapshot: Snapshot,
    }

    impl CorruptedStore {
        fn new(world: &WorldId) -> Self {
            let (_, checksum, size) = Snapshot::encode_state(&json!({"hp": 10})).unwrap();
            let snapshot = Snapshot {
                id: 1,
                world_id: world.clone(),
                event_id: 1,
                created_at: chrono::Utc::now(),
                description: None,
                state_blob: r#"{"hp":666}"#.into(),
                checksum,
                size_bytes: size,
                is_auto: false,
            };
            Self { snapshot }
        }
    }

    impl SnapshotStore for CorruptedStore {
        fn create(
            &self,
            _world: &WorldId,
            _event_id: u64,
            _state: &Value,
            _description: Option<String>,
            _is_auto: bool,
        ) -> HistoryResult<Snapshot> {
            unreachable!("read-only fixture")
        }
        fn list(
            &self,
            _world: &WorldId,
            _limit: usize,
            _include_auto: bool,
        ) -> HistoryResult<Vec<chronik_snapshot::SnapshotMeta>> {
            Ok(vec![self.snapshot.meta()])
        }
        fn get(&self, _id: u64) -> HistoryResult<Option<chronik_snapshot::SnapshotMeta>> {
            Ok(Some(self.snapshot.meta()))
        }
        fn get_with_state(&self, _id: u64) -> HistoryResult<Option<Snapshot>> {
            Ok(Some(self.snapshot.clone()))
        }
        fn get_nearest(&self, _world: &WorldId, _event_id: u64) -> HistoryResult<Option<Snapshot>> {
            Ok(Some(self.snapshot.clone()))
        }
        fn get_latest(&self, _world: &WorldId) -> HistoryResult<Option<Snapshot>> {
            Ok(Some(self.snapshot.clone()))
        }
        fn verify(&self, _id: u64) -> HistoryResult<bool> {
            Ok(self.snapshot.verify())
        }
        fn count_by_world(&self, _world: &WorldId) -> HistoryResult<u64> {
            Ok(1)
        }
        fn total_size(&self) -> HistoryResult<u64> {
            Ok(self.snapshot.size_bytes)
        }
        fn cleanup(&self, _world: &WorldId, _keep_count: usize) -> HistoryResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn corrupted_snapshot_fails_closed() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        let corrupted = CorruptedStore::new(&fx.world);

        let orch = ReplayOrchestrator::new(&fx.log, &corrupted, &fx.rng);
        let mut applier = MapApplier::default();
        let err = orch
            .rollback_to_snapshot(&fx.world, 1, Some(1), &mut applier)
            .unwrap_err();

        assert!(matches!(err, HistoryError::Integrity { .. }));
        // Fail closed: no partial restore, no replay.
        assert_eq!(applier.restores, 0);
        assert!(applier.applied.is_empty());
    }

    #[test]
    fn snapshot_from_wrong_world_is_rejected() {
        let fx = Fixture::new();
        let other = WorldId::from("w2");
        let snap = fx
            .snapshots
            .create(&other, 1, &json!({}), None, false)
            .unwrap();

        let orch = fx.orchestrator();
        let mut applier = MapApplier::default();
        let err = orch
            .rollback_to_snapshot(&fx.world, snap.id, None, &mut applier)
            .unwrap_err();
        assert!(matches!(err, HistoryError::Validation(_)));
    }

    #[test]
    fn rollback_to_event_uses_nearest_snapshot() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        fx.append("hp", 8);
        fx.snapshots
            .create(&fx.world, 2, &json!({"hp": 8}), None, false)
            .unwrap();
        fx.append("hp", 5);

        let orch = fx.orchestrator();
        let mut applier = MapApplier::default();
        let report = orch
            .rollback_to_event(&fx.world, 3, &mut applier)
            .unwrap();
        assert_eq!(report.snapshot_event_id, 2);
        assert_eq!(report.replayed_events, 1);
    }

    #[test]
    fn rollback_before_earliest_snapshot_is_explicit_error() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        fx.append("hp", 8);
        fx.snapshots
            .create(&fx.world, 2, &json!({"hp": 8}), None, false)
            .unwrap();

        let orch = fx.orchestrator();
        let mut applier = MapApplier::default();
        let err = orch.rollback_to_event(&fx.world, 1, &mut applier).unwrap_err();
        let HistoryError::NotFound { id, .. } = err else {
            panic!("expected NotFound, got {err:?}");
        };
        assert!(id.contains("replay from genesis"));
    }

    #[test]
    fn rng_checkpoints_travel_with_the_snapshot() {
        let fx = Fixture::new();
        fx.rng
            .get_or_create(&fx.world, "combat", "seed-A")
            .unwrap();
        let original: Vec<f64> = (0..4)
            .map(|_| fx.rng.next_value(&fx.world, "combat").unwrap().0)
            .collect();

        // Capture after two draws by snapshotting a rewound copy of the
        // stream state.
        fx.rng.reset(&fx.world, "combat", 2).unwrap();
        fx.append("hp", 10);
        let orch = fx.orchestrator();
        let blob = orch.state_with_rng(&fx.world, &json!({"hp": 10})).unwrap();
        let snap = fx
            .snapshots
            .create(&fx.world, 1, &blob, None, false)
            .unwrap();

        // Diverge: burn draws and replace the seed entirely.
        fx.rng.update_seed(&fx.world, "combat", "seed-B").unwrap();
        fx.rng.next_value(&fx.world, "combat").unwrap();

        let mut applier = MapApplier::default();
        orch.rollback_to_snapshot(&fx.world, snap.id, None, &mut applier)
            .unwrap();

        // Back at (seed-A, call_index 2): the stream resumes identically.
        let resumed: Vec<f64> = (0..2)
            .map(|_| fx.rng.next_value(&fx.world, "combat").unwrap().0)
            .collect();
        assert_eq!(&original[2..], &resumed[..]);
    }

    #[test]
    fn replay_events_is_read_only() {
        let fx = Fixture::new();
        fx.append("hp", 10);
        fx.append("hp", 8);
        fx.append("hp", 5);

        let orch = fx.orchestrator();
        let events = orch.replay_events(&fx.world, 2, 3).unwrap();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), [2, 3]);
    }
}
