//! Session model: the goal the user is working toward and the persisted
//! record used to recover a session after a restart.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A non-empty, trimmed goal statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Goal(String);

impl Goal {
    /// Validate and wrap a goal.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`] if the goal is empty or only whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidInput("goal must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Goal {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Goal::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Read-only snapshot returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub active: bool,
    pub goal: Option<String>,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            active: false,
            goal: None,
        }
    }

    pub fn monitoring(goal: &Goal) -> Self {
        Self {
            active: true,
            goal: Some(goal.as_str().to_string()),
        }
    }
}

/// Key-value record written on every start/stop and read once at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub current_goal: Option<String>,
    #[serde(default)]
    pub is_session_active: bool,
}

impl PersistedSession {
    pub fn active(goal: &Goal) -> Self {
        Self {
            current_goal: Some(goal.as_str().to_string()),
            is_session_active: true,
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    /// The goal to resume with, if this record describes a recoverable session.
    ///
    /// A record flagged active without a usable goal is not recoverable.
    pub fn recoverable_goal(&self) -> Option<Goal> {
        if !self.is_session_active {
            return None;
        }
        self.current_goal.as_deref().and_then(|g| Goal::new(g).ok())
    }
}
