//! Chat message payloads.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Counter suffix that keeps message ids unique within a process even
/// when two messages share a millisecond.
static NEXT_MESSAGE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Display name attached to coordinator-generated notices.
pub(crate) const SYSTEM_SENDER: &str = "System";

/// One entry in a room's chat log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Monotonic-enough id: millisecond timestamp plus a process-wide
    /// sequence number.
    pub id: String,
    /// Sender display name, or `"System"` for join/leave notices.
    pub from: String,
    pub text: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    /// True for coordinator-generated notices.
    #[serde(default)]
    pub system: bool,
}

impl ChatMessage {
    /// A message authored by a player.
    pub fn user(from: impl Into<String>, text: impl Into<String>) -> Self {
        Self::build(from.into(), text.into(), false)
    }

    /// A join/leave notice generated by the coordinator itself.
    pub fn system(text: impl Into<String>) -> Self {
        Self::build(SYSTEM_SENDER.to_string(), text.into(), true)
    }

    fn build(from: String, text: String, system: bool) -> Self {
        let now = Utc::now();
        let seq = NEXT_MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{}-{}", now.timestamp_millis(), seq),
            from,
            text,
            timestamp: now.to_rfc3339(),
            system,
        }
    }
}
