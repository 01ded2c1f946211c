//! Foreground timer loop with interactive prompts.
//!
//! Unlike the one-shot `timer` commands, `run` keeps the process alive,
//! ticks the coordinator once a second and answers sampling prompts from
//! stdin.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Args;
use tomatolog_core::host::{
    Prompter, ScalarKind, ScalarRange, SessionDetails, SessionDetailsRequest,
};
use tomatolog_core::{Config, Database, Event, HostError, Mode, SessionSnapshot};

use super::common;

#[derive(Args)]
pub struct RunArgs {
    /// Number of work sessions to complete before exiting
    #[arg(long, default_value = "1")]
    pub sessions: u32,
}

/// Prompter reading answers from stdin. An empty line cancels.
struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self, prompt: &str) -> Result<String, HostError> {
        eprint!("{prompt}");
        std::io::stderr()
            .flush()
            .map_err(|e| HostError::Prompt(e.to_string()))?;
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| HostError::Prompt(e.to_string()))?;
        Ok(line.trim().to_string())
    }

    fn read_scalar(
        &self,
        label: &str,
        range: ScalarRange,
    ) -> Result<Option<f64>, HostError> {
        loop {
            let line = self.read_line(&format!("{label} ({}-{}): ", range.min, range.max))?;
            if line.is_empty() {
                return Ok(None);
            }
            match line.parse::<f64>() {
                Ok(value) if value >= range.min && value <= range.max => {
                    return Ok(Some(value))
                }
                _ => eprintln!("expected a number between {} and {}", range.min, range.max),
            }
        }
    }
}

impl Prompter for StdinPrompter {
    fn ask_scalar(
        &mut self,
        kind: ScalarKind,
        range: ScalarRange,
        _initial: Option<f64>,
    ) -> Result<Option<f64>, HostError> {
        let label = match kind {
            ScalarKind::ExpectedReward => "expected reward",
            ScalarKind::ActualReward => "current reward",
            ScalarKind::EnergyLevel => "energy level",
        };
        self.read_scalar(label, range)
    }

    fn ask_session_details(
        &mut self,
        request: SessionDetailsRequest,
    ) -> Result<Option<SessionDetails>, HostError> {
        let description = self.read_line("what are you working on? ")?;
        let expected_reward = if request.include_reward {
            self.read_scalar("expected reward", ScalarKind::ExpectedReward.range())?
        } else {
            None
        };
        let initial_energy = if request.include_energy {
            self.read_scalar("energy level", ScalarKind::EnergyLevel.range())?
        } else {
            None
        };
        Ok(Some(SessionDetails {
            description,
            expected_reward,
            initial_energy,
        }))
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    let catch_up = common::elapsed_since_save(&db);
    let mut coordinator = common::coordinator(&db, &config, Box::new(StdinPrompter));

    let work_done: Rc<RefCell<u32>> = Rc::new(RefCell::new(0));
    let closed: Rc<RefCell<Vec<SessionSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
    let counter = Rc::clone(&work_done);
    let sink = Rc::clone(&closed);
    coordinator.subscribe(move |event| match event {
        Event::SessionCompleted { snapshot, .. } => {
            if snapshot.mode == Mode::Work {
                *counter.borrow_mut() += 1;
            }
            sink.borrow_mut().push(snapshot.clone());
        }
        Event::SessionReset {
            snapshot: Some(snapshot),
            ..
        } => sink.borrow_mut().push(snapshot.clone()),
        Event::Notice { message, .. } => println!("{message}"),
        _ => {}
    });

    if catch_up > 0 {
        coordinator.tick(catch_up);
    }

    while *work_done.borrow() < args.sessions {
        if !coordinator.engine().in_session() {
            coordinator.start();
            if !coordinator.engine().in_session() {
                break;
            }
        }

        let tick_started = Instant::now();
        std::thread::sleep(Duration::from_secs(1));
        coordinator.tick(tick_started.elapsed().as_millis() as u64);

        print_countdown(coordinator.engine());
        common::save_engine(&db, coordinator.engine())?;
    }
    println!();

    for snapshot in closed.borrow().iter() {
        db.record_session(snapshot, chrono::Utc::now())?;
    }

    let engine = coordinator.into_engine();
    common::save_engine(&db, &engine)?;
    Ok(())
}

fn print_countdown(engine: &tomatolog_core::SessionTimer) {
    if engine.in_session() {
        print!(
            "\r{} {}   ",
            engine.mode().emoji(),
            tomatolog_core::timer::format_mmss(engine.remaining_ms()),
        );
        let _ = std::io::stdout().flush();
    }
}
