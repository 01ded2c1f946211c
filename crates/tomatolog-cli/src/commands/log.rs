use clap::Subcommand;
use tomatolog_core::host::{DocumentStore, FsDocumentStore};
use tomatolog_core::Config;

use super::common;

#[derive(Subcommand)]
pub enum LogAction {
    /// Print the configured log document
    Show,
    /// Print the resolved log document path
    Path,
}

/// The configured destination with the `.md` suffix the logger applies.
fn configured_path(config: &Config) -> Option<String> {
    let mut path = config.log.path.clone()?;
    if !path.to_lowercase().ends_with(".md") {
        path.push_str(".md");
    }
    Some(path)
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let Some(path) = configured_path(&config) else {
        return Err("no log path configured (set log.path)".into());
    };

    match action {
        LogAction::Show => {
            let store = FsDocumentStore::new(common::vault_root());
            let text = store.read(&path)?;
            print!("{text}");
        }
        LogAction::Path => {
            println!("{}", common::vault_root().join(path).display());
        }
    }
    Ok(())
}
