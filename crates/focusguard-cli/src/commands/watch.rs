//! Long-running monitor.
//!
//! On start the persisted session is recovered and its status printed. Each
//! stdin line is a control message; each response is printed as one JSON
//! line, interleaved with `SHOW_WARNING` notices. EOF or Ctrl-C stops the
//! ticker but leaves the persisted session in place for the next start.

use std::sync::Arc;

use focusguard_core::storage::Database;
use focusguard_core::{
    Config, ControlRequest, ControlResponse, HttpOracle, Monitor, MonitorSettings, WebPageSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::{emit, runtime, CmdResult, StdoutSink};

pub fn run() -> CmdResult {
    let rt = runtime()?;
    let result = rt.block_on(watch());
    // A stdin read may still be parked on a blocking thread after Ctrl-C.
    rt.shutdown_background();
    result
}

async fn watch() -> CmdResult {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);

    let oracle = Arc::new(HttpOracle::from_config(&config.oracle)?);
    let endpoint = oracle.endpoint().clone();
    let monitor = Monitor::new(
        MonitorSettings::from(&config),
        oracle,
        Arc::new(WebPageSource::from_store(db.clone())?),
        db,
        Arc::new(StdoutSink),
    );

    let status = monitor.restore();
    info!(
        interval_secs = monitor.settings().interval.as_secs(),
        %endpoint,
        "watching"
    );
    emit(&ControlResponse::from(status))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("control channel closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = match ControlRequest::parse_line(&line) {
                    Ok(request) => monitor.handle(request),
                    Err(e) => ControlResponse::error(format!("unrecognised control message: {e}")),
                };
                emit(&response)?;
            }
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
        }
    }

    monitor.shutdown();
    Ok(())
}
