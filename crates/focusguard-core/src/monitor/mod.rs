//! Goal-drift monitoring loop.
//!
//! The monitor owns the single session slot and a periodic ticker for the
//! active session. Each tick samples the current target, asks the relevance
//! oracle for a judgment and hands drift results to the notification center.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start(goal)--> Monitoring --stop()--> Idle
//! Monitoring --start(goal')--> Monitoring   (session replaced)
//! Monitoring --tick--> Monitoring
//! (restart) --restore()--> Monitoring       (persisted active session)
//! ```
//!
//! Every session gets its own [`CancellationToken`]. Stopping or replacing a
//! session cancels it; a tick whose oracle call straddles the cancel still
//! completes the call but checks the token at the delivery point and drops
//! the result.
//!
//! All methods that arm a ticker must be called from within a tokio runtime.

mod tick;

pub use tick::TickOutcome;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::control::{Ack, ControlRequest, ControlResponse};
use crate::error::Result;
use crate::extract::ContentSource;
use crate::notify::{NotificationCenter, NotificationSink, MAX_SNOOZE_MINUTES};
use crate::oracle::RelevanceOracle;
use crate::session::{Goal, PersistedSession, SessionStatus};
use crate::storage::{Config, StateStore};

/// Timing and size knobs for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub oracle_timeout: Duration,
    pub max_content_chars: usize,
    pub snooze: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.monitor.interval(),
            oracle_timeout: config.oracle.timeout(),
            max_content_chars: config.oracle.max_content_chars,
            snooze: config.notifications.snooze(),
        }
    }
}

/// The occupant of the single session slot.
struct ActiveSession {
    id: u64,
    goal: Goal,
    cancel: CancellationToken,
    ticker: JoinHandle<()>,
}

/// What a tick needs from the slot, copied out so no lock is held across awaits.
struct SessionSnapshot {
    id: u64,
    goal: Goal,
    cancel: CancellationToken,
}

pub(crate) struct Shared {
    settings: MonitorSettings,
    oracle: Arc<dyn RelevanceOracle>,
    source: Arc<dyn ContentSource>,
    store: Arc<dyn StateStore>,
    notices: NotificationCenter,
    slot: RwLock<Option<ActiveSession>>,
    in_flight: tokio::sync::Mutex<()>,
    next_session_id: AtomicU64,
}

impl Shared {
    // The slot holds plain data; a panic elsewhere must not wedge the loop.
    fn slot_read(&self) -> RwLockReadGuard<'_, Option<ActiveSession>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn slot_write(&self) -> RwLockWriteGuard<'_, Option<ActiveSession>> {
        self.slot.write().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot(&self, expected_session: Option<u64>) -> Option<SessionSnapshot> {
        self.slot_read()
            .as_ref()
            .filter(|s| expected_session.map_or(true, |id| s.id == id))
            .filter(|s| !s.cancel.is_cancelled())
            .map(|s| SessionSnapshot {
                id: s.id,
                goal: s.goal.clone(),
                cancel: s.cancel.clone(),
            })
    }
}

/// Handle to the monitoring loop. Cheap to clone.
#[derive(Clone)]
pub struct Monitor {
    shared: Arc<Shared>,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        oracle: Arc<dyn RelevanceOracle>,
        source: Arc<dyn ContentSource>,
        store: Arc<dyn StateStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                oracle,
                source,
                store,
                notices: NotificationCenter::new(sink),
                slot: RwLock::new(None),
                in_flight: tokio::sync::Mutex::new(()),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.shared.settings
    }

    // ── Session control ──────────────────────────────────────────────

    /// Start monitoring toward `goal`, replacing any active session.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`](crate::CoreError::InvalidInput) for
    /// an empty goal, or a storage error if the session cannot be persisted.
    /// The state is unchanged on error.
    pub fn start_session(&self, goal: &str) -> Result<()> {
        let goal = Goal::new(goal)?;
        self.shared
            .store
            .save_session(&PersistedSession::active(&goal))?;
        self.arm(goal);
        Ok(())
    }

    /// Stop monitoring. Idempotent; never fails.
    pub fn end_session(&self) -> Result<()> {
        let ended = self.disarm();
        if let Err(e) = self.shared.store.save_session(&PersistedSession::inactive()) {
            warn!(error = %e, "failed to persist session end");
        }
        self.shared.notices.reset();
        if let Some(goal) = ended {
            info!(%goal, "focus session ended");
        }
        Ok(())
    }

    /// Read-only snapshot of the session slot.
    pub fn status(&self) -> SessionStatus {
        match self.shared.slot_read().as_ref() {
            Some(session) => SessionStatus::monitoring(&session.goal),
            None => SessionStatus::idle(),
        }
    }

    /// Re-enter monitoring from the persisted record after a restart.
    ///
    /// Unreadable or inconsistent records are logged and treated as idle.
    pub fn restore(&self) -> SessionStatus {
        let record = match self.shared.store.load_session() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "could not read persisted session, starting idle");
                return self.status();
            }
        };

        match record.recoverable_goal() {
            Some(goal) => {
                info!(%goal, "recovering persisted focus session");
                self.arm(goal);
            }
            None if record.is_session_active => {
                warn!("persisted session is active but has no goal, starting idle");
            }
            None => debug!("no persisted session to recover"),
        }
        self.status()
    }

    /// Stop the ticker without touching the persisted record, so the session
    /// is recovered on the next start-up.
    pub fn shutdown(&self) {
        if self.disarm().is_some() {
            debug!("monitor shut down with an active session");
        }
    }

    /// Run one check right away on the active session.
    pub async fn check_now(&self) -> TickOutcome {
        self.shared.tick(None).await
    }

    /// Apply a control message.
    pub fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::StartSession { goal } => match self.start_session(&goal) {
                Ok(()) => ControlResponse::Ack(Ack::Started),
                Err(e) => ControlResponse::error(e.to_string()),
            },
            ControlRequest::EndSession => {
                let _ = self.end_session();
                ControlResponse::Ack(Ack::Stopped)
            }
            ControlRequest::GetStatus => self.status().into(),
            ControlRequest::Dismiss => {
                self.shared.notices.dismiss();
                ControlResponse::Ack(Ack::Dismissed)
            }
            ControlRequest::Snooze { minutes: Some(m) } if m > MAX_SNOOZE_MINUTES => {
                ControlResponse::error(format!(
                    "snooze must be at most {MAX_SNOOZE_MINUTES} minutes"
                ))
            }
            ControlRequest::Snooze { minutes } => {
                let window = minutes
                    .map(|m| Duration::from_secs(m * 60))
                    .unwrap_or(self.shared.settings.snooze);
                let until = self.shared.notices.snooze(window);
                ControlResponse::Ack(Ack::Snoozed { until })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&self, goal: Goal) {
        let id = self.shared.next_session_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let ticker = tokio::spawn(run_ticker(
            Arc::downgrade(&self.shared),
            id,
            cancel.clone(),
            self.shared.settings.interval,
        ));

        let mut slot = self.shared.slot_write();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            previous.ticker.abort();
            info!(from = %previous.goal, to = %goal, "focus session replaced");
        } else {
            info!(%goal, "focus session started");
        }
        *slot = Some(ActiveSession {
            id,
            goal,
            cancel,
            ticker,
        });
    }

    /// Empty the slot and cancel its session. Returns the goal that was active.
    fn disarm(&self) -> Option<Goal> {
        let mut slot = self.shared.slot_write();
        let previous = slot.take()?;
        previous.cancel.cancel();
        previous.ticker.abort();
        Some(previous.goal)
    }
}

/// Fire one tick per period until the session is cancelled.
///
/// Each tick runs as its own task so the schedule keeps its cadence; a fire
/// that lands while a check is in flight is skipped by the in-flight guard.
async fn run_ticker(shared: Weak<Shared>, session_id: u64, cancel: CancellationToken, period: Duration) {
    // interval_at panics on a zero period.
    let period = period.max(Duration::from_millis(1));
    let Some(start) = Instant::now().checked_add(period) else {
        warn!(session = session_id, ?period, "tick period out of range, ticker not started");
        return;
    };
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                tokio::spawn(async move {
                    let outcome = shared.tick(Some(session_id)).await;
                    debug!(session = session_id, ?outcome, "tick finished");
                });
            }
        }
    }
    debug!(session = session_id, "ticker stopped");
}
