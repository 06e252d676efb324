use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use chronik_types::{EventType, WorldId};

/// Processing state of an inbox entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Expired,
}

impl fmt::Display for InboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        };
        write!(f, "{name}")
    }
}

/// One unit of deferred work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub id: u64,
    pub world_id: WorldId,
    pub event_type: EventType,
    pub payload: Value,
    pub status: InboxStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Not eligible for claim before this time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_after: Option<DateTime<Utc>>,
    /// Swept to `expired` once this time passes while still pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Higher claims first. Defaults to 0.
    pub priority: i32,
}

impl InboxEntry {
    /// Eligible for claim: pending, past `process_after`, before
    /// `expires_at`.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status == InboxStatus::Pending
            && self.process_after.map_or(true, |t| t <= now)
            && self.expires_at.map_or(true, |t| t > now)
    }
}

/// Optional parameters for `enqueue`.
#[derive(Clone, Debug, Default)]
pub struct EnqueueOptions {
    pub process_after: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub source_type: Option<String>,
    pub source_id: Option<String>,
    pub priority: Option<i32>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn entry() -> InboxEntry {
        InboxEntry {
            id: 1,
            world_id: WorldId::from("w1"),
            event_type: EventType::System,
            payload: json!({}),
            status: InboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            process_after: None,
            expires_at: None,
            source_type: None,
            source_id: None,
            priority: 0,
        }
    }

    #[test]
    fn pending_without_windows_is_claimable() {
        assert!(entry().is_claimable(Utc::now()));
    }

    #[test]
    fn future_process_after_blocks_claim() {
        let now = Utc::now();
        let mut e = entry();
        e.process_after = Some(now + Duration::hours(1));
        assert!(!e.is_claimable(now));
        assert!(e.is_claimable(now + Duration::hours(2)));
    }

    #[test]
    fn past_expiry_blocks_claim() {
        let now = Utc::now();
        let mut e = entry();
        e.expires_at = Some(now - Duration::seconds(1));
        assert!(!e.is_claimable(now));
    }

    #[test]
    fn non_pending_is_never_claimable() {
        let mut e = entry();
        e.status = InboxStatus::Processing;
        assert!(!e.is_claimable(Utc::now()));
    }
}
