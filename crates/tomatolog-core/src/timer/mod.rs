mod engine;
mod sampling;
mod session;

pub use engine::SessionTimer;
pub use sampling::{draw_delay_ms, prompt_window, DelayWindow};
pub use session::{Metric, Sample, SampleBuffer, SessionSnapshot};

use serde::{Deserialize, Serialize};

/// The two alternating session modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

impl Mode {
    pub fn flip(self) -> Self {
        match self {
            Mode::Work => Mode::Break,
            Mode::Break => Mode::Work,
        }
    }

    /// Marker used in notices: tomato for work, cup for break.
    pub fn emoji(self) -> &'static str {
        match self {
            Mode::Work => "\u{1F345}",
            Mode::Break => "\u{1F964}",
        }
    }
}

/// Format a millisecond quantity as `MM:SS` for display.
pub fn format_mmss(ms: u64) -> String {
    let min = ms / 60_000;
    let sec = (ms % 60_000) / 1000;
    format!("{min:02}:{sec:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_alternates() {
        assert_eq!(Mode::Work.flip(), Mode::Break);
        assert_eq!(Mode::Break.flip(), Mode::Work);
    }

    #[test]
    fn mmss_pads_both_fields() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(61_000), "01:01");
        assert_eq!(format_mmss(25 * 60_000), "25:00");
        assert_eq!(format_mmss(9_500), "00:09");
    }
}
