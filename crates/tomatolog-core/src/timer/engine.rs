//! Session timer implementation.
//!
//! The timer is a caller-ticked state machine. It does not use internal
//! threads -- the host delivers elapsed-time deltas via `tick()`, serially.
//!
//! ## State Transitions
//!
//! ```text
//! idle(mode) --start--> running(mode) --pause--> paused(mode)
//! running(mode) --tick reaching target--> idle(mode')   (completion)
//! running|paused --reset--> idle(mode)                  (mode kept)
//! idle(mode) --toggle_mode--> idle(mode')
//! ```
//!
//! `running` implies `in_session`; a session can be open but paused. Every
//! command returns the [`Event`] it committed (if any); the coordinator
//! fans events out to observers and performs log writes.

use serde::{Deserialize, Serialize};

use super::session::{Metric, SampleBuffer, SessionSnapshot};
use super::Mode;
use crate::events::Event;

/// Core timer state machine.
///
/// Owns the single live session slot. One instance at a time; the
/// coordinator constructs it explicitly at startup and tears it down
/// explicitly -- there is no ambient shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    mode: Mode,
    /// Elapsed time within the current session, clamped to `target_ms`.
    elapsed_ms: u64,
    target_ms: u64,
    /// Wall-clock instant (epoch ms) the current running segment began.
    start_epoch_ms: Option<u64>,
    in_session: bool,
    running: bool,
    work_len_ms: u64,
    break_len_ms: u64,
    autostart: bool,
    expected_reward: Option<f64>,
    description: String,
    reward_samples: SampleBuffer,
    energy_samples: SampleBuffer,
    /// Elapsed-time deadline for the next sampling prompt. Cleared by any
    /// transition out of running work.
    #[serde(default)]
    prompt_due_ms: Option<u64>,
    /// Incremented every time a session opens. Prompt results carry the
    /// generation they were issued for; stale results are discarded.
    #[serde(default)]
    generation: u64,
    #[serde(default)]
    prompt_count: u32,
}

impl SessionTimer {
    /// Create a new timer in `idle(WORK)` with the given lengths (minutes).
    pub fn new(work_minutes: f64, break_minutes: f64, autostart: bool) -> Self {
        let work_len_ms = minutes_to_ms(work_minutes);
        Self {
            mode: Mode::Work,
            elapsed_ms: 0,
            target_ms: work_len_ms,
            start_epoch_ms: None,
            in_session: false,
            running: false,
            work_len_ms,
            break_len_ms: minutes_to_ms(break_minutes),
            autostart,
            expected_reward: None,
            description: String::new(),
            reward_samples: SampleBuffer::default(),
            energy_samples: SampleBuffer::default(),
            prompt_due_ms: None,
            generation: 0,
            prompt_count: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn in_session(&self) -> bool {
        self.in_session
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.target_ms.saturating_sub(self.elapsed_ms)
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub fn expected_reward(&self) -> Option<f64> {
        self.expected_reward
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_energy_samples(&self) -> bool {
        !self.energy_samples.is_empty()
    }

    pub fn is_first_prompt(&self) -> bool {
        self.prompt_count == 0
    }

    /// Copy of the live session, used at close time and for status output.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            start_epoch_ms: self.start_epoch_ms,
            elapsed_ms: self.elapsed_ms,
            target_ms: self.target_ms,
            finished: self.in_session && self.elapsed_ms == self.target_ms,
            description: self.description.clone(),
            expected_reward: self.expected_reward,
            reward_samples: self.reward_samples.samples().to_vec(),
            energy_samples: self.energy_samples.samples().to_vec(),
        }
    }

    /// Build a full state snapshot event.
    pub fn state_event(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            in_session: self.in_session,
            running: self.running,
            elapsed_ms: self.elapsed_ms,
            remaining_ms: self.remaining_ms(),
            target_ms: self.target_ms,
            remaining_human: super::format_mmss(self.remaining_ms()),
            at: chrono::Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open a session, or resume a paused one.
    ///
    /// Opening resets the session slot (elapsed, samples, description,
    /// expected reward) and bumps the generation counter. Resuming keeps
    /// all session data. Idempotent while already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.in_session {
            if self.running {
                return None;
            }
            self.running = true;
            return Some(Event::TimerResumed {
                remaining_ms: self.remaining_ms(),
                at: chrono::Utc::now(),
            });
        }
        self.elapsed_ms = 0;
        self.target_ms = self.len_for(self.mode);
        self.start_epoch_ms = Some(now_ms());
        self.expected_reward = None;
        self.description.clear();
        self.reward_samples.clear();
        self.energy_samples.clear();
        self.prompt_due_ms = None;
        self.prompt_count = 0;
        self.generation += 1;
        self.in_session = true;
        self.running = true;
        Some(Event::SessionOpened {
            mode: self.mode,
            target_ms: self.target_ms,
            generation: self.generation,
            at: chrono::Utc::now(),
        })
    }

    /// Freeze the clock without closing the session. No-op if not running.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        // A pending prompt deadline does not survive leaving running(WORK);
        // the coordinator reschedules on resume.
        self.prompt_due_ms = None;
        Some(Event::TimerPaused {
            remaining_ms: self.remaining_ms(),
            at: chrono::Utc::now(),
        })
    }

    /// Advance the session by `delta_ms`. Invoked only while running; the
    /// clock delivers ticks serially.
    ///
    /// Returns `SessionCompleted` when elapsed reaches the target (exactly
    /// once -- the session closes in the same transition), or
    /// `SamplePromptDue` when a scheduled prompt deadline passes.
    pub fn tick(&mut self, delta_ms: u64) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        if self.elapsed_ms >= self.target_ms {
            self.elapsed_ms = self.target_ms;
            let snapshot = self.snapshot();
            let autostart = self.autostart;
            self.close_session(true);
            return Some(Event::SessionCompleted {
                snapshot,
                autostart,
                at: chrono::Utc::now(),
            });
        }
        if let Some(due) = self.prompt_due_ms {
            if self.elapsed_ms >= due {
                self.prompt_due_ms = None;
                self.prompt_count += 1;
                return Some(Event::SamplePromptDue {
                    generation: self.generation,
                    at: chrono::Utc::now(),
                });
            }
        }
        None
    }

    /// Close the session without advancing the mode.
    ///
    /// A reset of a *running* session with nonzero elapsed is treated as an
    /// implicit end: the returned event carries a snapshot the coordinator
    /// logs exactly as it would a natural completion. Resetting a paused
    /// session discards it silently (policy choice, see DESIGN.md).
    pub fn reset(&mut self) -> Option<Event> {
        let snapshot = if self.running && self.in_session && self.elapsed_ms > 0 {
            Some(self.snapshot())
        } else {
            None
        };
        self.close_session(false);
        Some(Event::SessionReset {
            snapshot,
            at: chrono::Utc::now(),
        })
    }

    /// Force the alternation transition without reaching the target.
    ///
    /// Fires the same side effects as natural completion (session slot
    /// cleared, prompt cancelled) but no completion log event.
    pub fn toggle_mode(&mut self) -> Option<Event> {
        self.close_session(true);
        Some(Event::ModeToggled {
            mode: self.mode,
            at: chrono::Utc::now(),
        })
    }

    /// Reinterpret the timer length.
    ///
    /// While a session is open the requested value becomes the *remaining*
    /// time (target = elapsed + requested). While idle it becomes the
    /// configured length for the current mode, to be persisted by the host.
    /// Rejected while running.
    pub fn adjust_length(&mut self, requested_ms: u64) -> Option<Event> {
        if self.running {
            return None;
        }
        let configured = !self.in_session;
        if self.in_session {
            self.target_ms = requested_ms.saturating_add(self.elapsed_ms);
            if self.elapsed_ms > self.target_ms {
                self.elapsed_ms = self.target_ms;
            }
        } else {
            self.target_ms = requested_ms;
            self.elapsed_ms = 0;
            match self.mode {
                Mode::Work => self.work_len_ms = requested_ms,
                Mode::Break => self.break_len_ms = requested_ms,
            }
        }
        Some(Event::LengthAdjusted {
            target_ms: self.target_ms,
            configured,
            at: chrono::Utc::now(),
        })
    }

    pub fn set_autostart(&mut self, flag: bool) {
        self.autostart = flag;
    }

    /// Apply new configured lengths without disturbing an open session's
    /// remaining time.
    pub fn reconfigure(&mut self, work_minutes: f64, break_minutes: f64, autostart: bool) {
        self.work_len_ms = minutes_to_ms(work_minutes);
        self.break_len_ms = minutes_to_ms(break_minutes);
        self.autostart = autostart;
        if !self.in_session {
            self.target_ms = self.len_for(self.mode);
            self.elapsed_ms = 0;
        }
    }

    // ── Session data ─────────────────────────────────────────────────

    /// Record the start-of-session input collected by the host.
    ///
    /// An initial energy level is stored as a sample at elapsed 0.
    pub fn set_session_details(
        &mut self,
        description: &str,
        expected_reward: Option<f64>,
        initial_energy: Option<f64>,
    ) {
        if !self.in_session {
            return;
        }
        self.description = description.to_string();
        self.expected_reward = expected_reward;
        if let Some(energy) = initial_energy {
            self.energy_samples.push(energy, 0);
        }
    }

    /// Arm the sampling prompt `delay_ms` of session time from now.
    ///
    /// Only meaningful while running a work session with something to
    /// track (an expected reward, or an energy series already begun).
    /// Returns whether the prompt was armed.
    pub fn schedule_sample_prompt(&mut self, delay_ms: u64) -> bool {
        let trackable = self.expected_reward.is_some() || !self.energy_samples.is_empty();
        if !self.running || !self.in_session || self.mode != Mode::Work || !trackable {
            return false;
        }
        self.prompt_due_ms = Some(self.elapsed_ms.saturating_add(delay_ms));
        true
    }

    /// Append a prompt result, unless it is stale.
    ///
    /// `generation` is the value carried by the `SamplePromptDue` event the
    /// result answers; if the session closed or a new one opened in the
    /// meantime the result is discarded.
    pub fn apply_sample(&mut self, metric: Metric, value: f64, generation: u64) -> Option<Event> {
        if !self.in_session || self.mode != Mode::Work || generation != self.generation {
            return None;
        }
        let elapsed_ms = self.elapsed_ms;
        match metric {
            Metric::Reward => self.reward_samples.push(value, elapsed_ms),
            Metric::Energy => self.energy_samples.push(value, elapsed_ms),
        }
        Some(Event::SampleRecorded {
            metric,
            value,
            elapsed_ms,
            at: chrono::Utc::now(),
        })
    }

    pub fn reward_samples(&self) -> &[super::Sample] {
        self.reward_samples.samples()
    }

    pub fn energy_samples(&self) -> &[super::Sample] {
        self.energy_samples.samples()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn len_for(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work_len_ms,
            Mode::Break => self.break_len_ms,
        }
    }

    /// The single close path shared by completion, reset and mode toggle.
    ///
    /// `flip_mode` applies the alternation rule (skipping BREAK when its
    /// length is configured as zero); manual reset keeps the mode.
    fn close_session(&mut self, flip_mode: bool) {
        if flip_mode {
            self.mode = if self.break_len_ms == 0 {
                Mode::Work
            } else {
                self.mode.flip()
            };
        }
        self.target_ms = self.len_for(self.mode);
        self.in_session = false;
        self.running = false;
        self.start_epoch_ms = None;
        self.elapsed_ms = 0;
        self.prompt_due_ms = None;
        self.prompt_count = 0;
        self.expected_reward = None;
        self.description.clear();
        self.reward_samples.clear();
        self.energy_samples.clear();
    }
}

fn minutes_to_ms(minutes: f64) -> u64 {
    if minutes <= 0.0 {
        return 0;
    }
    (minutes * 60_000.0).round() as u64
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
