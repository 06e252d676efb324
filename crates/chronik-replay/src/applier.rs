use serde_json::Value;

use chronik_log::Event;
use chronik_types::{HistoryResult, WorldId};

/// The injected rule-engine collaborator.
///
/// Chronik assumes nothing about what a payload means; the applier owns all
/// game semantics. The only contract: `apply` must be deterministic given
/// the payload and the RNG registry state, or replay will diverge from the
/// original run.
pub trait EventApplier {
    /// Overwrite the engine's world state with a decoded snapshot blob.
    fn restore_state(&mut self, world: &WorldId, state: &Value) -> HistoryResult<()>;

    /// Re-apply one historical event.
    fn apply(&mut self, event: &Event) -> HistoryResult<()>;
}
