use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one simulated world.
///
/// Every event chain, snapshot series, RNG checkpoint set, and inbox queue
/// is scoped to a single world. Chronik never merges or relates worlds;
/// a `WorldId` is an opaque label chosen by the game layer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a random world id for tests and demos.
    pub fn ephemeral() -> Self {
        let n: u64 = rand::Rng::gen(&mut rand::thread_rng());
        Self(format!("world-{n:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorldId({})", self.0)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_and_display_roundtrip() {
        let wid = WorldId::from("w1");
        assert_eq!(wid.as_str(), "w1");
        assert_eq!(format!("{wid}"), "w1");
    }

    #[test]
    fn ephemeral_ids_differ() {
        assert_ne!(WorldId::ephemeral(), WorldId::ephemeral());
    }

    #[test]
    fn serde_is_transparent() {
        let wid = WorldId::from("w1");
        assert_eq!(serde_json::to_string(&wid).unwrap(), "\"w1\"");
    }
}
