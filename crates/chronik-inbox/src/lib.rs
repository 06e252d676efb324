//! Durable deferred-work inbox for Chronik.
//!
//! A priority-ordered queue for events processed asynchronously or after a
//! delay, sharing the durable-store and retry discipline of the rest of the
//! core. The state machine:
//!
//! ```text
//! pending -> processing -> { completed | failed }
//! failed  -> pending    (retry, only while attempts < max_attempts)
//! pending -> expired    (background sweep past expires_at)
//! ```
//!
//! `claim_next` selects and flips an entry in one atomic step, so no two
//! concurrent workers ever claim the same row. Entries are never silently
//! resurrected except via explicit retry.

pub mod entry;
pub mod memory;
pub mod traits;

pub use entry::{EnqueueOptions, InboxEntry, InboxStatus};
pub use memory::InMemoryInbox;
pub use traits::Inbox;
