//! # Focus Guard Core Library
//!
//! This library provides the core logic for Focus Guard, a goal-drift
//! monitor. The user states a goal; the monitor periodically samples the page
//! they are on, asks a remote relevance oracle whether that page serves the
//! goal, and raises an interruption notice when it does not.
//!
//! ## Architecture
//!
//! - **Monitor**: single-slot session state machine with a cancellable
//!   periodic ticker
//! - **Oracle**: HTTP client for the relevance judge
//! - **Extract**: page sampling and heading/paragraph digest
//! - **Notify**: one-at-a-time notification gate with snooze
//! - **Storage**: SQLite key-value state and TOML configuration
//!
//! ## Key Components
//!
//! - [`Monitor`]: Goal-drift monitoring loop
//! - [`HttpOracle`]: Relevance oracle client
//! - [`WebPageSource`]: Fetches and digests the active target
//! - [`Database`]: Session persistence
//! - [`Config`]: Application configuration management

pub mod control;
pub mod error;
pub mod extract;
pub mod monitor;
pub mod notify;
pub mod oracle;
pub mod session;
pub mod storage;

pub use control::{Ack, ControlRequest, ControlResponse};
pub use error::{ConfigError, CoreError, DatabaseError, ExtractionError, OracleError};
pub use extract::{extract_digest, ContentSource, Target, WebPageSource};
pub use monitor::{Monitor, MonitorSettings, TickOutcome};
pub use notify::{ChannelSink, Delivery, NotificationCenter, NotificationSink, Notice};
pub use oracle::{AnalyzeRequest, CheckResult, HttpOracle, RelevanceOracle};
pub use session::{Goal, PersistedSession, SessionStatus};
pub use storage::{Config, Database, MemoryStore, StateStore};
