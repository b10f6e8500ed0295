use clap::Subcommand;
use focusguard_core::storage::Database;
use focusguard_core::StateStore;
use url::Url;

use super::CmdResult;

#[derive(Subcommand)]
pub enum TargetAction {
    /// Point the monitor at URL
    Set {
        /// http(s) URL of the page being read
        url: String,
    },
    /// Forget the current target (ticks are skipped until one is set)
    Clear,
    /// Print the current target
    Show,
}

pub fn run(action: TargetAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        TargetAction::Set { url } => {
            let parsed = Url::parse(&url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("unsupported target scheme: {}", parsed.scheme()).into());
            }
            db.set_active_target(parsed.as_str())?;
            println!("{parsed}");
        }
        TargetAction::Clear => {
            db.clear_active_target()?;
            println!("target cleared");
        }
        TargetAction::Show => match db.active_target()? {
            Some(url) => println!("{url}"),
            None => println!("no target"),
        },
    }
    Ok(())
}
