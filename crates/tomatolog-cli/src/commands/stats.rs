use clap::Subcommand;
use tomatolog_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Recent sessions, newest first
    Recent {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },
    /// All-time totals
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Recent { limit } => {
            let sessions = db.recent_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        StatsAction::All => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
