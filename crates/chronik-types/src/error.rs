use std::fmt;

use thiserror::Error;

use crate::world::WorldId;

/// The entity a `NotFound` error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    World,
    Event,
    Snapshot,
    RngContext,
    InboxEntry,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::World => "world",
            Self::Event => "event",
            Self::Snapshot => "snapshot",
            Self::RngContext => "rng context",
            Self::InboxEntry => "inbox entry",
        };
        write!(f, "{name}")
    }
}

/// Shared error taxonomy for all Chronik subsystems.
///
/// Integrity *findings* from verification walks are data (see
/// `chronik_log::ChainReport`), not errors; the `Integrity` variant is
/// reserved for fail-closed gates such as a rollback whose snapshot
/// checksum does not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("integrity violation in world {world}: {reason}")]
    Integrity { world: WorldId, reason: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("inbox entry {id} exhausted its retry budget ({attempts}/{max_attempts} attempts)")]
    ExhaustedRetries {
        id: u64,
        attempts: u32,
        max_attempts: u32,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HistoryError {
    /// Shorthand for a `NotFound` with a displayable id.
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Map a poisoned lock into a store error.
    pub fn poisoned(what: &str) -> Self {
        Self::Store(format!("{what} lock poisoned"))
    }
}

/// Result alias used across all Chronik crates.
pub type HistoryResult<T> = Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_and_id() {
        let err = HistoryError::not_found(Entity::Snapshot, 42);
        assert_eq!(err.to_string(), "snapshot not found: 42");
    }

    #[test]
    fn exhausted_retries_message() {
        let err = HistoryError::ExhaustedRetries {
            id: 7,
            attempts: 3,
            max_attempts: 3,
        };
        assert!(err.to_string().contains("retry budget"));
    }
}
