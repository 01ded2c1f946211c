//! The "Pomodoro Section" text transforms.
//!
//! A bounded region of a larger free-form markdown document is treated as an
//! append/update log for session events. Every operation here is a pure
//! function from full document text to full document text -- the host reads
//! the whole file, we compute the replacement in memory, the host writes it
//! back in a single call.

mod scan;
mod writer;

pub use scan::{section_range, SectionLines};
pub use writer::{append_event, update_sample_summary};

use serde::{Deserialize, Serialize};

use crate::host::TrackedTask;

/// The literal section title, matched case-insensitively under any heading
/// level. Created as an H2 when absent.
pub const SECTION_TITLE: &str = "Pomodoro Section";

/// Marker emoji carried by start lines.
pub const START_MARKER: &str = "\u{1F345}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    End,
}

/// One event line to merge into the section.
#[derive(Debug, Clone)]
pub struct SectionEvent {
    pub kind: EventKind,
    /// Rendered as `HH:mm`. For END events the caller supplies
    /// start time plus elapsed duration.
    pub time: chrono::NaiveTime,
    /// Tracked task to link from a START line, when known.
    pub task: Option<TrackedTask>,
    /// Expected-reward annotation on START lines.
    pub expected_reward: Option<f64>,
}

/// Which summary series a `update_sample_summary` call maintains.
///
/// Reward samples render as `ARV:` / `avg ARV:` lines, energy samples as
/// `EL:` / `avg EL:`. The two series are updated independently and may
/// coexist within one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Reward,
    Energy,
}

impl SummaryKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            SummaryKind::Reward => "ARV",
            SummaryKind::Energy => "EL",
        }
    }
}

/// A sample as it appears in a summary line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummarySample {
    pub value: f64,
    /// Minutes since session start, rendered with one decimal place.
    pub minutes_from_start: f64,
}

/// Render a numeric value the way the section does: no trailing zeros for
/// whole numbers ("3"), plain decimal otherwise ("3.5").
pub(crate) fn fmt_value(v: f64) -> String {
    format!("{v}")
}
