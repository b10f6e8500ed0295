//! Offline session control.
//!
//! These commands edit the persisted session record directly. A running
//! `watch` does not see them; it picks the record up when it next starts.
//! Use the control channel of `watch` to steer a live monitor.

use clap::Subcommand;
use focusguard_core::storage::Database;
use focusguard_core::{Ack, ControlResponse, Goal, PersistedSession, SessionStatus, StateStore};

use super::{emit, CmdResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session toward GOAL
    Start {
        /// What you are working on
        goal: String,
    },
    /// End the current session (no-op when idle)
    End,
    /// Print the persisted session as JSON
    Status,
}

pub fn run(action: SessionAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        SessionAction::Start { goal } => {
            let goal = Goal::new(&goal)?;
            db.save_session(&PersistedSession::active(&goal))?;
            emit(&ControlResponse::Ack(Ack::Started))?;
        }
        SessionAction::End => {
            db.save_session(&PersistedSession::inactive())?;
            emit(&ControlResponse::Ack(Ack::Stopped))?;
        }
        SessionAction::Status => {
            let status = match db.load_session()?.recoverable_goal() {
                Some(goal) => SessionStatus::monitoring(&goal),
                None => SessionStatus::idle(),
            };
            emit(&ControlResponse::from(status))?;
        }
    }
    Ok(())
}
