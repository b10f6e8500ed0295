//! Control messages exchanged between a control surface and the monitor.
//!
//! Requests are `type`-tagged JSON objects, one per line:
//!
//! ```text
//! {"type":"START_SESSION","goal":"Researching Neural Networks"}
//! {"type":"END_SESSION"}
//! {"type":"GET_STATUS"}
//! {"type":"DISMISS"}
//! {"type":"SNOOZE","minutes":10}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlRequest {
    StartSession { goal: String },
    EndSession,
    GetStatus,
    /// User chose "return to focus" on the drift notice.
    Dismiss,
    /// User snoozed the drift notice; `None` uses the configured window.
    Snooze {
        #[serde(default)]
        minutes: Option<u64>,
    },
}

impl ControlRequest {
    /// Parse one line of the control channel.
    ///
    /// # Errors
    /// Returns the serde error for unrecognised or malformed messages.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }
}

/// Acknowledgement shapes, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    Started,
    Stopped,
    Dismissed,
    Snoozed { until: DateTime<Utc> },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Status {
        #[serde(rename = "isSessionActive")]
        is_session_active: bool,
        #[serde(rename = "currentGoal")]
        current_goal: Option<String>,
    },
    Ack(Ack),
}

impl ControlResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ControlResponse::Ack(Ack::Error {
            message: message.into(),
        })
    }
}

impl From<SessionStatus> for ControlResponse {
    fn from(status: SessionStatus) -> Self {
        ControlResponse::Status {
            is_session_active: status.active,
            current_goal: status.goal,
        }
    }
}
