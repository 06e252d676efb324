use serde_json::Value;

use chronik_inbox::{EnqueueOptions, InboxEntry, InMemoryInbox, Inbox};
use chronik_log::{
    ChainReport, ChainVerifier, Event, EventFilter, EventPage, InMemoryEventLog, LogReader,
    LogWriter,
};
use chronik_replay::{EventApplier, ReplayOrchestrator, RollbackReport};
use chronik_rng::{InMemoryRngRegistry, RngRegistry};
use chronik_snapshot::{InMemorySnapshotStore, Snapshot, SnapshotMeta, SnapshotStore};
use chronik_types::{EventType, HistoryError, HistoryResult, WorldId};

/// The explicit Chronik context: one instance per process, passed by
/// reference into anything that needs history access.
pub struct WorldHistory {
    log: InMemoryEventLog,
    snapshots: InMemorySnapshotStore,
    rng: InMemoryRngRegistry,
    inbox: InMemoryInbox,
}

/// Combined integrity sweep over one world.
#[derive(Clone, Debug)]
pub struct WorldAudit {
    pub chain: ChainReport,
    /// Ids of snapshots whose stored blob no longer matches its checksum.
    pub corrupt_snapshots: Vec<u64>,
    pub checked_snapshots: u64,
}

impl WorldAudit {
    pub fn ok(&self) -> bool {
        self.chain.ok() && self.corrupt_snapshots.is_empty()
    }
}

impl WorldHistory {
    /// A context backed entirely by in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            log: InMemoryEventLog::new(),
            snapshots: InMemorySnapshotStore::new(),
            rng: InMemoryRngRegistry::new(),
            inbox: InMemoryInbox::new(),
        }
    }

    // ---- Component handles ----

    pub fn log(&self) -> &(impl LogReader + LogWriter) {
        &self.log
    }

    pub fn snapshots(&self) -> &impl SnapshotStore {
        &self.snapshots
    }

    pub fn rng(&self) -> &impl RngRegistry {
        &self.rng
    }

    pub fn inbox(&self) -> &impl Inbox {
        &self.inbox
    }

    // ---- Event log ----

    /// Append one event to a world's chain.
    pub fn record(
        &self,
        world: &WorldId,
        event_type: EventType,
        actor_id: Option<&str>,
        target_id: Option<&str>,
        payload: Value,
    ) -> HistoryResult<Event> {
        self.log.append(
            world,
            event_type,
            actor_id.map(String::from),
            target_id.map(String::from),
            payload,
        )
    }

    pub fn query(&self, world: &WorldId, filter: &EventFilter) -> HistoryResult<EventPage> {
        self.log.query(world, filter)
    }

    pub fn recent(&self, world: &WorldId, limit: usize) -> HistoryResult<Vec<Event>> {
        self.log.get_last(world, limit)
    }

    /// Walk a chain range and report every integrity fault as data.
    pub fn verify_chain(
        &self,
        world: &WorldId,
        from_id: Option<u64>,
        to_id: Option<u64>,
    ) -> HistoryResult<ChainReport> {
        ChainVerifier::verify(&self.log, world, from_id, to_id)
    }

    // ---- Snapshots ----

    /// Capture a snapshot of the given engine state at the world's current
    /// high-water event id, with the world's RNG checkpoints embedded so
    /// they travel with any later restore.
    pub fn create_snapshot(
        &self,
        world: &WorldId,
        engine_state: &Value,
        description: Option<String>,
        is_auto: bool,
    ) -> HistoryResult<Snapshot> {
        let high_water = self.log.head(world)?.map(|e| e.id).unwrap_or(0);
        let blob = self
            .orchestrator()
            .state_with_rng(world, engine_state)?;
        self.snapshots
            .create(world, high_water, &blob, description, is_auto)
    }

    pub fn list_snapshots(
        &self,
        world: &WorldId,
        limit: usize,
        include_auto: bool,
    ) -> HistoryResult<Vec<SnapshotMeta>> {
        self.snapshots.list(world, limit, include_auto)
    }

    /// Retention sweep; negative keep counts are rejected before anything
    /// is touched.
    pub fn cleanup_snapshots(&self, world: &WorldId, keep_count: i64) -> HistoryResult<u64> {
        if keep_count < 0 {
            return Err(HistoryError::Validation(format!(
                "keep_count must be non-negative, got {keep_count}"
            )));
        }
        self.snapshots.cleanup(world, keep_count as usize)
    }

    // ---- Rollback / replay ----

    fn orchestrator(&self) -> ReplayOrchestrator<'_> {
        ReplayOrchestrator::new(&self.log, &self.snapshots, &self.rng)
    }

    pub fn rollback_to_snapshot(
        &self,
        world: &WorldId,
        snapshot_id: u64,
        replay_to_event: Option<u64>,
        applier: &mut dyn EventApplier,
    ) -> HistoryResult<RollbackReport> {
        self.orchestrator()
            .rollback_to_snapshot(world, snapshot_id, replay_to_event, applier)
    }

    pub fn rollback_to_event(
        &self,
        world: &WorldId,
        event_id: u64,
        applier: &mut dyn EventApplier,
    ) -> HistoryResult<RollbackReport> {
        self.orchestrator().rollback_to_event(world, event_id, applier)
    }

    /// Read-only fetch of an inclusive event range for re-application.
    pub fn replay_events(
        &self,
        world: &WorldId,
        from_id: u64,
        to_id: u64,
    ) -> HistoryResult<Vec<Event>> {
        self.orchestrator().replay_events(world, from_id, to_id)
    }

    // ---- Deferred inbox ----

    pub fn enqueue(
        &self,
        world: &WorldId,
        event_type: EventType,
        payload: Value,
        options: EnqueueOptions,
    ) -> HistoryResult<InboxEntry> {
        self.inbox.enqueue(world, event_type, payload, options)
    }

    pub fn claim_next(&self, world: &WorldId) -> HistoryResult<Option<InboxEntry>> {
        self.inbox.claim_next(world)
    }

    // ---- Auditing ----

    /// Full integrity sweep: chain verification plus a checksum pass over
    /// every snapshot of the world. Findings are data; nothing is
    /// repaired.
    pub fn verify_world(&self, world: &WorldId) -> HistoryResult<WorldAudit> {
        let chain = ChainVerifier::verify(&self.log, world, None, None)?;

        let metas = self.snapshots.list(world, usize::MAX, true)?;
        let mut corrupt = Vec::new();
        for meta in &metas {
            if !self.snapshots.verify(meta.id)? {
                corrupt.push(meta.id);
            }
        }
        corrupt.sort_unstable();

        Ok(WorldAudit {
            chain,
            corrupt_snapshots: corrupt,
            checked_snapshots: metas.len() as u64,
        })
    }
}

impl Default for WorldHistory {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use chronik_inbox::InboxStatus;
    use chronik_replay::RollbackPhase;
    use chronik_types::Entity;

    use super::*;

    #[test]
    fn appended_history_verifies_clean() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");

        for (et, payload) in [
            (EventType::Combat, json!({"damage": 5})),
            (EventType::Movement, json!({"to": [1, 2]})),
            (EventType::System, json!({"tick": 3})),
        ] {
            history.record(&world, et, Some("hero"), None, payload).unwrap();
        }

        let report = history.verify_chain(&world, None, None).unwrap();
        assert!(report.ok());
        assert_eq!(report.checked, 3);
        assert!(report.faults.is_empty());
    }

    #[test]
    fn snapshot_nearest_tracks_high_water() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");

        for i in 0..3 {
            history
                .record(&world, EventType::System, None, None, json!({"i": i}))
                .unwrap();
        }
        let snap = history
            .create_snapshot(&world, &json!({"tick": 3}), None, false)
            .unwrap();
        assert_eq!(snap.event_id, 3);

        history
            .record(&world, EventType::System, None, None, json!({"i": 3}))
            .unwrap();
        let nearest = history.snapshots().get_nearest(&world, 4).unwrap().unwrap();
        assert_eq!(nearest.id, snap.id);
        assert_eq!(nearest.event_id, 3);
    }

    #[test]
    fn rng_scenario_from_get_or_create_to_reset() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");

        let cp = history.rng().get_or_create(&world, "combat", "seed-A").unwrap();
        assert_eq!(cp.call_index, 0);

        for _ in 0..3 {
            history.rng().increment(&world, "combat", Some("v".into())).unwrap();
        }
        assert_eq!(history.rng().get(&world, "combat").unwrap().unwrap().call_index, 3);

        let cp = history.rng().reset(&world, "combat", 0).unwrap();
        assert_eq!(cp.call_index, 0);
        assert!(cp.last_value.is_none());
    }

    #[test]
    fn deferred_entry_waits_for_its_schedule() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");

        history
            .enqueue(
                &world,
                EventType::Quest,
                json!({"quest": "delivery"}),
                EnqueueOptions {
                    process_after: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(history.claim_next(&world).unwrap().is_none());
        // Immediate work is unaffected by the scheduled entry.
        history
            .enqueue(&world, EventType::System, json!({}), EnqueueOptions::default())
            .unwrap();
        let claimed = history.claim_next(&world).unwrap().unwrap();
        assert_eq!(claimed.status, InboxStatus::Processing);
        assert_eq!(claimed.attempts, 1);
        assert_eq!(claimed.event_type, EventType::System);
    }

    #[test]
    fn rollback_round_trip_through_facade() {
        use std::collections::BTreeMap;

        #[derive(Default)]
        struct Applier {
            state: BTreeMap<String, Value>,
        }
        impl EventApplier for Applier {
            fn restore_state(&mut self, _w: &WorldId, state: &Value) -> HistoryResult<()> {
                self.state.clear();
                if let Some(map) = state.as_object() {
                    for (k, v) in map {
                        self.state.insert(k.clone(), v.clone());
                    }
                }
                Ok(())
            }
            fn apply(&mut self, event: &Event) -> HistoryResult<()> {
                if let Some(map) = event.payload.as_object() {
                    for (k, v) in map {
                        self.state.insert(k.clone(), v.clone());
                    }
                }
                Ok(())
            }
        }

        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");

        history.record(&world, EventType::System, None, None, json!({"hp": 10})).unwrap();
        history.record(&world, EventType::System, None, None, json!({"hp": 8})).unwrap();
        let snap = history
            .create_snapshot(&world, &json!({"hp": 8}), Some("before raid".into()), false)
            .unwrap();
        history.record(&world, EventType::System, None, None, json!({"hp": 2})).unwrap();

        let mut applier = Applier::default();
        let report = history.rollback_to_event(&world, 3, &mut applier).unwrap();
        assert_eq!(report.phase, RollbackPhase::Done);
        assert_eq!(report.snapshot_id, snap.id);
        assert_eq!(report.replayed_events, 1);
        assert_eq!(applier.state.get("hp"), Some(&json!(2)));
    }

    #[test]
    fn negative_keep_count_is_rejected() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");
        let err = history.cleanup_snapshots(&world, -1).unwrap_err();
        assert!(matches!(err, HistoryError::Validation(_)));
    }

    #[test]
    fn verify_world_sweeps_chain_and_snapshots() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");
        history.record(&world, EventType::System, None, None, json!({})).unwrap();
        history.create_snapshot(&world, &json!({"tick": 1}), None, true).unwrap();

        let audit = history.verify_world(&world).unwrap();
        assert!(audit.ok());
        assert_eq!(audit.checked_snapshots, 1);
    }

    #[test]
    fn rollback_without_snapshot_names_the_remedy() {
        let history = WorldHistory::in_memory();
        let world = WorldId::from("w1");
        history.record(&world, EventType::System, None, None, json!({})).unwrap();

        struct Noop;
        impl EventApplier for Noop {
            fn restore_state(&mut self, _w: &WorldId, _s: &Value) -> HistoryResult<()> {
                Ok(())
            }
            fn apply(&mut self, _e: &Event) -> HistoryResult<()> {
                Ok(())
            }
        }

        let err = history.rollback_to_event(&world, 1, &mut Noop).unwrap_err();
        assert!(matches!(err, HistoryError::NotFound { entity: Entity::Snapshot, .. }));
    }
}
