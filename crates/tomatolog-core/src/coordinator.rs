//! Event sequencing between the timer, the log and the host capabilities.
//!
//! All session-state transitions and document transforms execute as
//! non-overlapping reactions to discrete events: clock ticks, user actions,
//! prompt resolutions. The coordinator owns the timer and the logger, is
//! constructed once at startup, and fans committed events out to registered
//! observers synchronously after each transition.
//!
//! A failed log write becomes a [`Event::Notice`]; it never stalls or
//! corrupts a timer transition.

use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::error::HostError;
use crate::events::Event;
use crate::host::{Prompter, ScalarKind, SessionDetailsRequest, TaskLookup};
use crate::logger::Logger;
use crate::section::EventKind;
use crate::timer::{draw_delay_ms, prompt_window, Metric, Mode, SessionSnapshot, SessionTimer};

/// Which metrics the host wants sampled during work sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingConfig {
    pub reward: bool,
    pub energy: bool,
}

impl SamplingConfig {
    fn any(self) -> bool {
        self.reward || self.energy
    }
}

type Observer = Box<dyn FnMut(&Event)>;

/// Thin glue: wires timer lifecycle events to section-log writes and to the
/// sampling-prompt capability.
pub struct SessionCoordinator {
    engine: SessionTimer,
    logger: Logger,
    prompter: Box<dyn Prompter>,
    tasks: Box<dyn TaskLookup>,
    sampling: SamplingConfig,
    rng: Pcg64,
    observers: Vec<Observer>,
}

impl SessionCoordinator {
    pub fn new(
        engine: SessionTimer,
        logger: Logger,
        prompter: Box<dyn Prompter>,
        tasks: Box<dyn TaskLookup>,
        sampling: SamplingConfig,
    ) -> Self {
        Self::with_seed(engine, logger, prompter, tasks, sampling, rand::random())
    }

    /// Deterministic variant for tests.
    pub fn with_seed(
        engine: SessionTimer,
        logger: Logger,
        prompter: Box<dyn Prompter>,
        tasks: Box<dyn TaskLookup>,
        sampling: SamplingConfig,
        seed: u64,
    ) -> Self {
        Self {
            engine,
            logger,
            prompter,
            tasks,
            sampling,
            rng: Pcg64::seed_from_u64(seed),
            observers: Vec::new(),
        }
    }

    pub fn engine(&self) -> &SessionTimer {
        &self.engine
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Tear the coordinator down, handing the timer back to the host (the
    /// CLI persists it between invocations).
    pub fn into_engine(self) -> SessionTimer {
        self.engine
    }

    /// Register an observer invoked synchronously after each committed
    /// transition.
    pub fn subscribe(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ── User actions ─────────────────────────────────────────────────

    /// Open a session (collecting start-of-session input and logging the
    /// start event) or resume a paused one.
    pub fn start(&mut self) {
        let Some(event) = self.engine.start() else {
            return;
        };
        self.publish(&event);
        match event {
            Event::SessionOpened { mode, .. } => self.on_session_opened(mode),
            Event::TimerResumed { .. } => self.maybe_schedule_prompt(),
            _ => {}
        }
    }

    pub fn pause(&mut self) {
        if let Some(event) = self.engine.pause() {
            self.publish(&event);
        }
    }

    /// Close the session without flipping the mode. A running session with
    /// nonzero elapsed is logged as an implicit end.
    pub fn reset(&mut self) {
        let Some(event) = self.engine.reset() else {
            return;
        };
        self.publish(&event);
        if let Event::SessionReset {
            snapshot: Some(snapshot),
            ..
        } = event
        {
            self.process_session_close(&snapshot);
        }
    }

    pub fn toggle_mode(&mut self) {
        if let Some(event) = self.engine.toggle_mode() {
            self.publish(&event);
        }
    }

    /// Adjust the timer length. Returns the committed event so the host can
    /// persist a configured-length change.
    pub fn adjust_length(&mut self, requested_ms: u64) -> Option<Event> {
        let event = self.engine.adjust_length(requested_ms)?;
        self.publish(&event);
        Some(event)
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Deliver one clock delta. Ticks are applied in arrival order; a
    /// completion and its document writes are sequenced before a following
    /// autostart.
    pub fn tick(&mut self, delta_ms: u64) {
        let Some(event) = self.engine.tick(delta_ms) else {
            return;
        };
        self.publish(&event);
        match event {
            Event::SessionCompleted {
                snapshot,
                autostart,
                ..
            } => {
                self.process_session_close(&snapshot);
                if autostart {
                    self.start();
                }
            }
            Event::SamplePromptDue { generation, .. } => self.on_prompt_due(generation),
            _ => {}
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn publish(&mut self, event: &Event) {
        for observer in &mut self.observers {
            observer(event);
        }
    }

    fn notice(&mut self, message: String) {
        let event = Event::Notice {
            message,
            at: chrono::Utc::now(),
        };
        self.publish(&event);
    }

    fn log_or_notice(&mut self, result: Result<(), HostError>) {
        if let Err(err) = result {
            self.notice(format!("Log update failed: {err}"));
        }
    }

    fn on_session_opened(&mut self, mode: Mode) {
        if mode == Mode::Work && self.logger.settings().enabled {
            let request = SessionDetailsRequest {
                include_reward: self.sampling.reward,
                include_energy: self.sampling.energy,
            };
            match self.prompter.ask_session_details(request) {
                Ok(Some(details)) => self.engine.set_session_details(
                    &details.description,
                    if request.include_reward {
                        details.expected_reward
                    } else {
                        None
                    },
                    if request.include_energy {
                        details.initial_energy
                    } else {
                        None
                    },
                ),
                Ok(None) => {}
                Err(err) => self.notice(format!("Prompt failed: {err}")),
            }
        }

        let task = self.tasks.current();
        let snapshot = self.engine.snapshot();
        let result = self
            .logger
            .log_event(&snapshot, EventKind::Start, task.as_ref());
        self.log_or_notice(result);
        if !snapshot.energy_samples.is_empty() {
            let result = self
                .logger
                .update_summary(&snapshot, Metric::Energy, task.as_ref());
            self.log_or_notice(result);
        }
        self.maybe_schedule_prompt();
    }

    /// End-of-session processing shared by natural completion and implicit
    /// end on reset: log the end line, refresh both summaries, notify.
    fn process_session_close(&mut self, snapshot: &SessionSnapshot) {
        let task = self.tasks.current();
        let result = self
            .logger
            .log_event(snapshot, EventKind::End, task.as_ref());
        self.log_or_notice(result);
        let result = self
            .logger
            .update_summary(snapshot, Metric::Reward, task.as_ref());
        self.log_or_notice(result);
        let result = self
            .logger
            .update_summary(snapshot, Metric::Energy, task.as_ref());
        self.log_or_notice(result);

        let verb = match snapshot.mode {
            Mode::Work => "working",
            Mode::Break => "breaking",
        };
        self.notice(format!(
            "{} You have been {verb} for {} minutes.",
            snapshot.mode.emoji(),
            snapshot.elapsed_min(),
        ));
    }

    fn maybe_schedule_prompt(&mut self) {
        if !self.sampling.any() {
            return;
        }
        let window = prompt_window(self.engine.is_first_prompt());
        let delay = draw_delay_ms(window, &mut self.rng);
        self.engine.schedule_sample_prompt(delay);
    }

    fn on_prompt_due(&mut self, generation: u64) {
        let track_reward = self.sampling.reward && self.engine.expected_reward().is_some();
        let track_energy = self.sampling.energy && self.engine.has_energy_samples();
        if !track_reward && !track_energy {
            return;
        }
        if track_reward {
            self.ask_and_record(Metric::Reward, ScalarKind::ActualReward, generation);
        }
        if track_energy {
            self.ask_and_record(Metric::Energy, ScalarKind::EnergyLevel, generation);
        }
        self.maybe_schedule_prompt();
    }

    /// Present one scalar prompt and apply the answer. The result is
    /// validated against the session generation it was issued for; a
    /// session that closed or reopened in the meantime discards it.
    fn ask_and_record(&mut self, metric: Metric, kind: ScalarKind, generation: u64) {
        match self.prompter.ask_scalar(kind, kind.range(), None) {
            Ok(Some(value)) => {
                if let Some(event) = self.engine.apply_sample(metric, value, generation) {
                    self.publish(&event);
                    let task = self.tasks.current();
                    let snapshot = self.engine.snapshot();
                    let result = self.logger.update_summary(&snapshot, metric, task.as_ref());
                    self.log_or_notice(result);
                }
            }
            Ok(None) => {}
            Err(err) => self.notice(format!("Prompt failed: {err}")),
        }
    }
}
