//! Foundation types for Chronik, the tamper-evident world-history ledger.
//!
//! This crate provides the identity, digest, and error types used throughout
//! the Chronik system. Every other Chronik crate depends on `chronik-types`.
//!
//! # Key Types
//!
//! - [`WorldId`] — Identifier of one simulated world (one hash chain per world)
//! - [`Digest`] — SHA-256 digest, rendered as 64 lowercase hex characters
//! - [`GENESIS_HASH`] — Sentinel `prev_hash` of every world's first event
//! - [`EventType`] — Category tag carried by events and inbox entries
//! - [`HistoryError`] — Shared error taxonomy (not-found, integrity,
//!   validation, store, exhausted-retries)

pub mod digest;
pub mod error;
pub mod event_type;
pub mod world;

pub use digest::{Digest, GENESIS_HASH};
pub use error::{Entity, HistoryError, HistoryResult};
pub use event_type::EventType;
pub use world::WorldId;
