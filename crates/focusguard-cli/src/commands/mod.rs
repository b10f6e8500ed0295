pub mod check;
pub mod config;
pub mod session;
pub mod target;
pub mod watch;

use std::io::Write;

use focusguard_core::{CoreError, NotificationSink, Notice};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Write one compact JSON document as a line on stdout.
pub fn emit<T: Serialize>(value: &T) -> Result<(), CoreError> {
    let line = serde_json::to_string(value)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Prints drift notices as `SHOW_WARNING` JSON lines.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn deliver(&self, notice: &Notice) -> Result<(), CoreError> {
        emit(notice)
    }
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
