//! Deterministic RNG checkpoint registry for Chronik.
//!
//! Random draws consumed while producing historical events must be exactly
//! reproducible when those events are replayed. Persisting a
//! `(seed, call_index)` pair per logical draw stream, rather than raw
//! random outputs, keeps storage compact while guaranteeing identical
//! replay: [`draw`] is pure given `(seed, call_index)`.
//!
//! Checkpoints are created lazily on first use of a context, replaced
//! wholesale on snapshot restore, and deleted per context or per world on
//! demand. `call_index` only moves forward via `increment`, or is set
//! explicitly via `reset` / `update_seed` — never decremented implicitly.

pub mod checkpoint;
pub mod memory;
pub mod traits;

pub use checkpoint::{draw, RngCheckpoint, RngCheckpointState};
pub use memory::InMemoryRngRegistry;
pub use traits::RngRegistry;
