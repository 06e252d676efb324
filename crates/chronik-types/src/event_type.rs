use std::fmt;

use serde::{Deserialize, Serialize};

/// Category tag carried by events and deferred-inbox entries.
///
/// Chronik never interprets the payload behind a type; the tag exists only
/// for filtering queries and routing inbox work. Serialized snake_case, so
/// it appears as `"combat"`, `"movement"`, ... in canonical encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Combat,
    Movement,
    Trade,
    Spell,
    Quest,
    Terrain,
    System,
}

impl EventType {
    /// Stable wire name (the snake_case serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Movement => "movement",
            Self::Trade => "trade",
            Self::Spell => "spell",
            Self::Quest => "quest",
            Self::Terrain => "terrain",
            Self::System => "system",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
