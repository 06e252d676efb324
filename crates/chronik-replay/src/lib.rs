//! Rollback and replay orchestration for Chronik.
//!
//! Combines the event log, the snapshot store, and the RNG checkpoint
//! registry into point-in-time reconstruction: restore the nearest
//! snapshot (checksum-gated, fail closed), put the RNG streams back where
//! they were at capture, then re-apply subsequent events through an
//! injected rule-engine collaborator so randomness matches the original
//! run.
//!
//! Phases: `RestoringSnapshot -> ReplayingEvents -> Done`, with
//! `IntegrityFailure` terminal on checksum mismatch — reached before any
//! state mutation.

pub mod applier;
pub mod orchestrator;

pub use applier::EventApplier;
pub use orchestrator::{ReplayOrchestrator, RollbackPhase, RollbackReport, RNG_CHECKPOINTS_KEY};
