//! Checksummed world-state snapshots for Chronik.
//!
//! A snapshot captures the full aggregated state of one world at a
//! high-water event id, as a canonical serialization plus a SHA-256
//! checksum. Snapshots bound the cost of rollback: restore the nearest
//! snapshot, then replay only the events past its high-water mark.
//!
//! Snapshots are created on demand or automatically, deleted by retention
//! cleanup, and never mutated in place. A checksum mismatch on `verify` is
//! reported, never auto-corrected.

pub mod memory;
pub mod record;
pub mod traits;

pub use memory::InMemorySnapshotStore;
pub use record::{Snapshot, SnapshotMeta};
pub use traits::SnapshotStore;
