use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Metric, Mode, SessionSnapshot};

/// Every committed timer transition produces an Event.
///
/// The coordinator publishes events synchronously to registered observers
/// after the transition commits; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A session opened (first `start` from a non-open state).
    SessionOpened {
        mode: Mode,
        target_ms: u64,
        generation: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Elapsed reached the target; the session closed in this transition.
    SessionCompleted {
        snapshot: SessionSnapshot,
        autostart: bool,
        at: DateTime<Utc>,
    },
    /// Manual reset. `snapshot` is present only when the reset counts as
    /// an implicit end (running with nonzero elapsed).
    SessionReset {
        snapshot: Option<SessionSnapshot>,
        at: DateTime<Utc>,
    },
    ModeToggled {
        mode: Mode,
        at: DateTime<Utc>,
    },
    LengthAdjusted {
        target_ms: u64,
        /// True when the adjustment set the configured mode length
        /// (no session open) and should be persisted by the host.
        configured: bool,
        at: DateTime<Utc>,
    },
    /// A scheduled sampling prompt came due.
    SamplePromptDue {
        generation: u64,
        at: DateTime<Utc>,
    },
    SampleRecorded {
        metric: Metric,
        value: f64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// User-facing message (completion notices, capability failures).
    Notice {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        in_session: bool,
        running: bool,
        elapsed_ms: u64,
        remaining_ms: u64,
        target_ms: u64,
        remaining_human: String,
        at: DateTime<Utc>,
    },
}
