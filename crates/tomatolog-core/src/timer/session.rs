//! Per-session data: sample buffers and the closing snapshot.

use serde::{Deserialize, Serialize};

use super::Mode;

/// The metrics sampled during a work session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Reward,
    Energy,
}

/// One timestamped observation within a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    /// Elapsed session time at the moment the sample was recorded.
    pub elapsed_ms: u64,
}

/// Append-only, time-stamped numeric series scoped to one session.
///
/// Insertion order is chronological order; samples are never reordered
/// or deduplicated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
}

impl SampleBuffer {
    pub fn push(&mut self, value: f64, elapsed_ms: u64) {
        self.samples.push(Sample { value, elapsed_ms });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Immutable copy of a session taken at the instant it closes.
///
/// The engine clears the live session slot when a session ends; the
/// snapshot is what flows to the logger and the history database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    /// Wall-clock instant (epoch ms) the running segment began, if known.
    pub start_epoch_ms: Option<u64>,
    pub elapsed_ms: u64,
    pub target_ms: u64,
    /// Whether elapsed reached the target (false for manual resets).
    pub finished: bool,
    pub description: String,
    pub expected_reward: Option<f64>,
    pub reward_samples: Vec<Sample>,
    pub energy_samples: Vec<Sample>,
}

impl SessionSnapshot {
    /// Whole minutes of elapsed session time.
    pub fn elapsed_min(&self) -> u64 {
        self.elapsed_ms / 60_000
    }
}
