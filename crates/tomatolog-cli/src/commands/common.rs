//! Shared plumbing for timer-bearing commands.
//!
//! The timer lives in the key-value store between invocations; every command
//! loads it, catches it up to wall-clock time through a coordinator, applies
//! its action and persists it again.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tomatolog_core::host::{FsDocumentStore, NullPrompter, Prompter, StaticTaskLookup, TrackedTask};
use tomatolog_core::{
    Config, Database, Event, Logger, SamplingConfig, SessionCoordinator, SessionTimer,
};

pub const ENGINE_KEY: &str = "timer_engine";
pub const TASK_KEY: &str = "tracked_task";

/// Timer state as persisted between CLI invocations.
#[derive(Serialize, Deserialize)]
pub struct PersistedTimer {
    pub engine: SessionTimer,
    /// Wall-clock time of the last save, used to catch the timer up.
    pub saved_at_ms: u64,
}

pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Root directory the log document paths are resolved against.
///
/// Defaults to the working directory; override with TOMATOLOG_VAULT.
pub fn vault_root() -> PathBuf {
    std::env::var("TOMATOLOG_VAULT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

pub fn load_engine(db: &Database, config: &Config) -> SessionTimer {
    let mut engine = match db
        .kv_get(ENGINE_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str::<PersistedTimer>(&json).ok())
    {
        Some(persisted) => persisted.engine,
        None => SessionTimer::new(
            config.timer.work_minutes,
            config.timer.break_minutes,
            config.timer.autostart,
        ),
    };
    engine.reconfigure(
        config.timer.work_minutes,
        config.timer.break_minutes,
        config.timer.autostart,
    );
    engine
}

pub fn save_engine(db: &Database, engine: &SessionTimer) -> Result<(), Box<dyn std::error::Error>> {
    let persisted = PersistedTimer {
        engine: engine.clone(),
        saved_at_ms: now_ms(),
    };
    db.kv_set(ENGINE_KEY, &serde_json::to_string(&persisted)?)?;
    Ok(())
}

pub fn load_tracked_task(db: &Database) -> Option<TrackedTask> {
    db.kv_get(TASK_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str(&json).ok())
}

/// Milliseconds of wall-clock time since the last save, for catching a
/// running timer up before applying a command.
pub fn elapsed_since_save(db: &Database) -> u64 {
    db.kv_get(ENGINE_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str::<PersistedTimer>(&json).ok())
        .map(|persisted| now_ms().saturating_sub(persisted.saved_at_ms))
        .unwrap_or(0)
}

/// Build a coordinator around the persisted timer.
///
/// CLI commands cannot answer prompts delivered between invocations, so
/// everything except `run` uses the null prompter; stale sampling prompts
/// are simply dropped.
pub fn coordinator(
    db: &Database,
    config: &Config,
    prompter: Box<dyn Prompter>,
) -> SessionCoordinator {
    let engine = load_engine(db, config);
    let logger = Logger::new(
        Box::new(FsDocumentStore::new(vault_root())),
        config.log_settings(),
    );
    let tasks = StaticTaskLookup(load_tracked_task(db));
    let sampling = SamplingConfig {
        reward: config.tracking.reward,
        energy: config.tracking.energy,
    };
    SessionCoordinator::new(engine, logger, prompter, Box::new(tasks), sampling)
}

pub fn silent_coordinator(db: &Database, config: &Config) -> SessionCoordinator {
    coordinator(db, config, Box::new(NullPrompter))
}

/// Print every committed event as one JSON line on stdout.
pub fn attach_json_observer(coordinator: &mut SessionCoordinator) {
    coordinator.subscribe(|event: &Event| {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{json}");
        }
    });
}
