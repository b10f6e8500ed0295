//! Notification surface.
//!
//! Drift notices pass through a [`NotificationCenter`], which presents at most
//! one notice at a time and honours snooze windows, before reaching a
//! [`NotificationSink`] that actually renders them.
//!
//! Snoozing only suppresses display. The monitor keeps ticking and keeps
//! consulting the oracle while a snooze is in effect.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::oracle::CheckResult;

/// Longest accepted snooze window, in minutes.
pub const MAX_SNOOZE_MINUTES: u64 = 24 * 60;

const MAX_SNOOZE: Duration = Duration::from_secs(MAX_SNOOZE_MINUTES * 60);

/// Message delivered to the surface: `{"type":"SHOW_WARNING","data":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    ShowWarning(CheckResult),
}

impl Notice {
    pub fn result(&self) -> &CheckResult {
        match self {
            Notice::ShowWarning(result) => result,
        }
    }
}

/// Renders notices. Implementations must not block for long.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notice: &Notice) -> Result<()>;
}

/// What happened to a drift notice handed to the center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum Delivery {
    Shown,
    /// Another notice is still on screen.
    AlreadyShowing,
    Snoozed { until: DateTime<Utc> },
    Failed { message: String },
}

#[derive(Debug, Default)]
struct GateState {
    showing: Option<CheckResult>,
    snoozed_until: Option<(Instant, DateTime<Utc>)>,
}

pub struct NotificationCenter {
    sink: Arc<dyn NotificationSink>,
    state: Mutex<GateState>,
}

impl NotificationCenter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(GateState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        // Gate state is plain data; recover it from a poisoned lock.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Present a drift notice unless one is already showing or snoozed.
    pub fn present(&self, result: &CheckResult) -> Delivery {
        let mut state = self.state();

        if let Some((deadline, until)) = state.snoozed_until {
            if Instant::now() < deadline {
                debug!(%until, "drift notice suppressed by snooze");
                return Delivery::Snoozed { until };
            }
            state.snoozed_until = None;
        }

        if state.showing.is_some() {
            debug!("drift notice suppressed, one is already showing");
            return Delivery::AlreadyShowing;
        }

        let notice = Notice::ShowWarning(result.clone());
        match self.sink.deliver(&notice) {
            Ok(()) => {
                state.showing = Some(result.clone());
                info!(score = result.relevance_score, reason = %result.reason, "drift notice shown");
                Delivery::Shown
            }
            Err(e) => {
                warn!(error = %e, "failed to deliver drift notice");
                Delivery::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// "Return to focus": close the current notice.
    pub fn dismiss(&self) {
        self.state().showing = None;
    }

    /// Close the current notice and suppress display for `window`, capped at
    /// [`MAX_SNOOZE_MINUTES`].
    pub fn snooze(&self, window: Duration) -> DateTime<Utc> {
        let window = window.min(MAX_SNOOZE);
        let now = Instant::now();
        let deadline = now.checked_add(window).unwrap_or(now);
        let until = chrono::Duration::from_std(window)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or_else(Utc::now);
        let mut state = self.state();
        state.showing = None;
        state.snoozed_until = Some((deadline, until));
        info!(%until, "drift notices snoozed");
        until
    }

    /// Forget the showing notice and any snooze (session ended).
    pub fn reset(&self) {
        let mut state = self.state();
        state.showing = None;
        state.snoozed_until = None;
    }

    pub fn is_showing(&self) -> bool {
        self.state().showing.is_some()
    }

    #[cfg(test)]
    fn snoozed_until(&self) -> Option<DateTime<Utc>> {
        let state = self.state();
        state
            .snoozed_until
            .filter(|(deadline, _)| Instant::now() < *deadline)
            .map(|(_, until)| until)
    }
}

/// Forwards notices over an in-process channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, notice: &Notice) -> Result<()> {
        self.tx
            .send(notice.clone())
            .map_err(|_| CoreError::Notification("notice receiver closed".into()))
    }
}
