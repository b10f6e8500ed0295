use std::sync::Arc;

use clap::Args;
use focusguard_core::storage::Database;
use focusguard_core::{
    Config, ContentSource, HttpOracle, MemoryStore, Monitor, MonitorSettings, StateStore,
    WebPageSource,
};

use super::{emit, runtime, CmdResult, StdoutSink};

#[derive(Args)]
pub struct CheckArgs {
    /// Goal to judge against (defaults to the persisted session's goal)
    #[arg(long)]
    goal: Option<String>,
    /// Page to sample (defaults to the current target)
    #[arg(long)]
    url: Option<String>,
}

pub fn run(args: CheckArgs) -> CmdResult {
    runtime()?.block_on(check(args))
}

async fn check(args: CheckArgs) -> CmdResult {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);

    let goal = match args.goal {
        Some(goal) => goal,
        None => db
            .load_session()?
            .recoverable_goal()
            .map(|g| g.to_string())
            .ok_or("no active session; start one or pass --goal")?,
    };

    let source: Arc<dyn ContentSource> = match args.url {
        Some(url) => Arc::new(WebPageSource::fixed(url)?),
        None => Arc::new(WebPageSource::from_store(db)?),
    };

    // A one-shot check must not overwrite the persisted session.
    let monitor = Monitor::new(
        MonitorSettings::from(&config),
        Arc::new(HttpOracle::from_config(&config.oracle)?),
        source,
        Arc::new(MemoryStore::default()),
        Arc::new(StdoutSink),
    );
    monitor.start_session(&goal)?;
    let outcome = monitor.check_now().await;
    monitor.shutdown();

    emit(&outcome)?;
    Ok(())
}
