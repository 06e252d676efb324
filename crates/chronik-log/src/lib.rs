//! Hash-chained, append-only event log for Chronik.
//!
//! Every world's history is a single chain: each event embeds the SHA-256
//! digest of its predecessor, making retroactive edits detectable. This
//! crate provides:
//! - The [`Event`] record and its hash formula
//! - [`LogReader`] / [`LogWriter`] trait boundaries
//! - [`InMemoryEventLog`] implementation for tests and embedding
//! - [`ChainVerifier`] producing a findings-as-data [`ChainReport`]

pub mod memory;
pub mod record;
pub mod traits;
pub mod verify;

pub use memory::InMemoryEventLog;
pub use record::{Event, EventFilter, EventPage, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use traits::{LogReader, LogWriter};
pub use verify::{ChainFault, ChainReport, ChainVerifier, FaultKind};
