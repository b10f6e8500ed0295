//! Relevance oracle contract.
//!
//! The oracle is an opaque judge: given a goal and a page digest it answers
//! whether the content is on track. Implementations live behind
//! [`RelevanceOracle`] so the monitor can be driven by the HTTP client in
//! production and by scripted fakes in tests.

mod http;

pub use http::HttpOracle;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OracleError;
use crate::session::Goal;

/// Request body sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub goal: String,
    pub content: String,
}

impl AnalyzeRequest {
    /// Build a request, truncating `content` to at most `max_chars` characters.
    pub fn new(goal: &Goal, content: &str, max_chars: usize) -> Self {
        Self {
            goal: goal.as_str().to_string(),
            content: truncate_chars(content, max_chars).to_string(),
        }
    }
}

/// One judgment. Only `is_on_track` is actionable; the score is advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub is_on_track: bool,
    #[serde(deserialize_with = "deserialize_score")]
    pub relevance_score: i64,
    pub reason: String,
}

impl CheckResult {
    pub fn is_drift(&self) -> bool {
        !self.is_on_track
    }
}

/// Error body returned alongside non-200 statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}

#[async_trait]
pub trait RelevanceOracle: Send + Sync {
    /// Judge one `(goal, content)` pair.
    async fn judge(&self, request: &AnalyzeRequest) -> Result<CheckResult, OracleError>;
}

/// Longest prefix of `s` with at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// Scores arrive as JSON numbers of any shape; round rather than reject.
fn deserialize_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("relevanceScore must be finite"));
    }
    Ok(raw.round() as i64)
}
