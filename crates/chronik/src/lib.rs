//! High-level Chronik API.
//!
//! [`WorldHistory`] is the explicit context object composing the core
//! subsystems — event log, snapshot store, RNG checkpoint registry,
//! rollback/replay orchestration, and the deferred inbox — behind one
//! handle that is constructed once and passed by reference. No component
//! reaches for ambient global state, which keeps every piece independently
//! testable.
//!
//! ```
//! use chronik::{EventType, WorldHistory, WorldId};
//! use serde_json::json;
//!
//! let history = WorldHistory::in_memory();
//! let world = WorldId::from("w1");
//!
//! history
//!     .record(&world, EventType::Combat, Some("hero"), Some("goblin"), json!({"damage": 7}))
//!     .unwrap();
//! let report = history.verify_chain(&world, None, None).unwrap();
//! assert!(report.ok());
//! ```

pub mod history;

pub use history::{WorldAudit, WorldHistory};

pub use chronik_canon::{canonical_equals, canonical_string, hash_value};
pub use chronik_inbox::{EnqueueOptions, InboxEntry, InboxStatus};
pub use chronik_log::{ChainFault, ChainReport, Event, EventFilter, EventPage, FaultKind};
pub use chronik_replay::{EventApplier, RollbackPhase, RollbackReport};
pub use chronik_rng::{draw, RngCheckpoint, RngCheckpointState};
pub use chronik_snapshot::{Snapshot, SnapshotMeta};
pub use chronik_types::{
    Digest, Entity, EventType, HistoryError, HistoryResult, WorldId, GENESIS_HASH,
};
