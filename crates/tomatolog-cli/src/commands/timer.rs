use std::cell::RefCell;
use std::rc::Rc;

use clap::Subcommand;
use tomatolog_core::host::TrackedTask;
use tomatolog_core::{Config, Database, Event, Mode, SessionSnapshot};

use super::common;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session, or resume a paused one
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session (alias for start)
    Resume,
    /// Close the current session without flipping the mode
    Reset,
    /// Flip between work and break while idle
    Toggle,
    /// Adjust the timer length
    Length {
        /// Minutes. While a session is open this becomes the remaining
        /// time; while idle it becomes the configured length.
        minutes: f64,
    },
    /// Attribute sessions to a task
    Track {
        /// Document path, e.g. projects/parser.md
        path: String,
        /// Block anchor within the document, e.g. ^x1
        anchor: String,
        /// Display name for the section-log link
        #[arg(long)]
        name: Option<String>,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },
    /// Stop attributing sessions to a task
    Untrack,
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    let catch_up = common::elapsed_since_save(&db);
    let mut coordinator = common::silent_coordinator(&db, &config);
    common::attach_json_observer(&mut coordinator);

    // Closed sessions are collected through the observer and written to
    // history after the action commits.
    let closed: Rc<RefCell<Vec<SessionSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&closed);
    coordinator.subscribe(move |event| match event {
        Event::SessionCompleted { snapshot, .. } => sink.borrow_mut().push(snapshot.clone()),
        Event::SessionReset {
            snapshot: Some(snapshot),
            ..
        } => sink.borrow_mut().push(snapshot.clone()),
        _ => {}
    });

    // Catch the persisted timer up to wall-clock time first. A completion
    // that happened while no command was running is logged here, through
    // the same path a live tick would take.
    if catch_up > 0 {
        coordinator.tick(catch_up);
    }

    match action {
        TimerAction::Start | TimerAction::Resume => coordinator.start(),
        TimerAction::Pause => coordinator.pause(),
        TimerAction::Reset => coordinator.reset(),
        TimerAction::Toggle => coordinator.toggle_mode(),
        TimerAction::Length { minutes } => {
            if minutes <= 0.0 {
                return Err("length must be positive".into());
            }
            let requested_ms = (minutes * 60_000.0).round() as u64;
            match coordinator.adjust_length(requested_ms) {
                None => {
                    return Err("cannot adjust length while the timer is running".into());
                }
                // An idle adjustment sets the configured mode length;
                // persist it or the next invocation reverts it.
                Some(Event::LengthAdjusted {
                    configured: true, ..
                }) => {
                    let mut config = Config::load()?;
                    match coordinator.engine().mode() {
                        Mode::Work => config.timer.work_minutes = minutes,
                        Mode::Break => config.timer.break_minutes = minutes,
                    }
                    config.save()?;
                }
                Some(_) => {}
            }
        }
        TimerAction::Track {
            path,
            anchor,
            name,
            description,
        } => {
            let task = TrackedTask {
                path,
                anchor,
                name: name.unwrap_or_default(),
                description: description.unwrap_or_default(),
            };
            db.kv_set(common::TASK_KEY, &serde_json::to_string(&task)?)?;
            println!("tracking {}", task.path);
        }
        TimerAction::Untrack => {
            db.kv_delete(common::TASK_KEY)?;
            println!("tracking cleared");
        }
        TimerAction::Status => {
            println!(
                "{}",
                serde_json::to_string_pretty(&coordinator.engine().state_event())?
            );
        }
    }

    for snapshot in closed.borrow().iter() {
        db.record_session(snapshot, chrono::Utc::now())?;
    }

    let engine = coordinator.into_engine();
    common::save_engine(&db, &engine)?;
    Ok(())
}
