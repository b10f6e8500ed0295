//! One check cycle: target -> digest -> oracle -> notice.

use std::fmt::Display;

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::Shared;
use crate::error::{ExtractionError, OracleError};
use crate::notify::Delivery;
use crate::oracle::{AnalyzeRequest, CheckResult};

/// Observable result of a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// No session was active (or the tick belonged to a replaced session).
    Inactive,
    /// Another check was still awaiting the oracle.
    Busy,
    NoTarget,
    NoContent {
        #[serde(serialize_with = "as_display")]
        reason: ExtractionError,
    },
    OnTrack { result: CheckResult },
    Drift { result: CheckResult, delivery: Delivery },
    OracleFailed {
        #[serde(serialize_with = "as_display")]
        error: OracleError,
    },
    /// The session ended while the check was in flight.
    Discarded,
}

fn as_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl Shared {
    /// Run one tick against the active session.
    ///
    /// With `expected_session` set, the tick only runs if that session is
    /// still the one in the slot.
    pub(super) async fn tick(&self, expected_session: Option<u64>) -> TickOutcome {
        let Some(snapshot) = self.snapshot(expected_session) else {
            return TickOutcome::Inactive;
        };

        let Ok(_in_flight) = self.in_flight.try_lock() else {
            debug!(session = snapshot.id, "previous check still in flight, skipping tick");
            return TickOutcome::Busy;
        };

        let Some(target) = self.source.current_target().await else {
            debug!(session = snapshot.id, "no active target, skipping tick");
            return TickOutcome::NoTarget;
        };

        let content = match self.source.extract(&target).await {
            Ok(content) if !content.trim().is_empty() => content,
            Ok(_) => {
                debug!(url = %target.url, "target has no content, skipping tick");
                return TickOutcome::NoContent {
                    reason: ExtractionError::EmptyContent,
                };
            }
            Err(reason) => {
                debug!(url = %target.url, %reason, "extraction unavailable, skipping tick");
                return TickOutcome::NoContent { reason };
            }
        };

        if snapshot.cancel.is_cancelled() {
            return TickOutcome::Discarded;
        }

        let request = AnalyzeRequest::new(
            &snapshot.goal,
            &content,
            self.settings.max_content_chars,
        );
        let timeout = self.settings.oracle_timeout;
        let judged = match tokio::time::timeout(timeout, self.oracle.judge(&request)).await {
            Ok(judged) => judged,
            Err(_) => Err(OracleError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        };

        let result = match judged {
            Ok(result) => result,
            Err(error) => {
                warn!(session = snapshot.id, url = %target.url, %error, "relevance check failed");
                return TickOutcome::OracleFailed { error };
            }
        };

        // Delivery point. Holding the slot read lock makes this atomic with
        // respect to stop(), which cancels under the write lock.
        let _slot = self.slot_read();
        if snapshot.cancel.is_cancelled() {
            debug!(session = snapshot.id, "session ended during check, discarding result");
            return TickOutcome::Discarded;
        }

        if !result.is_drift() {
            debug!(
                session = snapshot.id,
                score = result.relevance_score,
                "content on track"
            );
            return TickOutcome::OnTrack { result };
        }

        let delivery = self.notices.present(&result);
        TickOutcome::Drift { result, delivery }
    }
}
