//! Randomized sampling-prompt delay selection.
//!
//! Window selection is a pure function of "is this the first prompt" so it
//! can be tested separately from the engine that consumes it. The first
//! prompt fires from a shorter window to surface early feedback sooner.

use rand::Rng;

/// Inclusive delay window, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min_minutes: u64,
    pub max_minutes: u64,
}

/// The window to draw the next prompt delay from.
pub fn prompt_window(is_first: bool) -> DelayWindow {
    if is_first {
        DelayWindow {
            min_minutes: 2,
            max_minutes: 3,
        }
    } else {
        DelayWindow {
            min_minutes: 3,
            max_minutes: 6,
        }
    }
}

/// Draw a delay uniformly from the window, in milliseconds.
pub fn draw_delay_ms<R: Rng>(window: DelayWindow, rng: &mut R) -> u64 {
    let span = (window.max_minutes - window.min_minutes) as f64;
    let minutes = window.min_minutes as f64 + rng.gen::<f64>() * span;
    (minutes * 60_000.0).round() as u64
}
