//! Host capability boundaries.
//!
//! Everything the core needs from its environment -- documents, user input,
//! the tracked task -- comes in through these traits. The core never touches
//! the filesystem or a UI directly; the CLI supplies [`FsDocumentStore`] and
//! a stdin prompter, tests supply [`MemoryDocumentStore`] and scripted
//! prompters.

mod fs_store;
mod memory;

pub use fs_store::FsDocumentStore;
pub use memory::MemoryDocumentStore;

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Whole-document read/write. No incremental patching primitive exists:
/// every update reads the full text, computes the replacement in memory and
/// writes it back in one call.
pub trait DocumentStore {
    /// Canonical reference for an existing document, or `None`.
    fn resolve(&self, path: &str) -> Option<String>;

    /// Resolve the document, creating it (and parent folders) when missing.
    fn ensure_exists(&mut self, path: &str) -> Result<String, HostError>;

    fn read(&self, path: &str) -> Result<String, HostError>;

    fn write(&mut self, path: &str, text: &str) -> Result<(), HostError>;
}

/// What a scalar prompt is asking for. Determines wording and range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    ExpectedReward,
    ActualReward,
    EnergyLevel,
}

impl ScalarKind {
    /// The valid input range for this kind (reward 0-5, energy 0-10).
    pub fn range(self) -> ScalarRange {
        match self {
            ScalarKind::ExpectedReward | ScalarKind::ActualReward => {
                ScalarRange { min: 0.0, max: 5.0 }
            }
            ScalarKind::EnergyLevel => ScalarRange {
                min: 0.0,
                max: 10.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarRange {
    pub min: f64,
    pub max: f64,
}

/// Which inputs to collect when a session opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionDetailsRequest {
    pub include_reward: bool,
    pub include_energy: bool,
}

/// Start-of-session input.
#[derive(Debug, Clone, Default)]
pub struct SessionDetails {
    pub description: String,
    pub expected_reward: Option<f64>,
    pub initial_energy: Option<f64>,
}

/// Awaitable user-input capability. `Ok(None)` means the user cancelled;
/// `Err` is a capability failure the coordinator reports as a notice.
pub trait Prompter {
    fn ask_scalar(
        &mut self,
        kind: ScalarKind,
        range: ScalarRange,
        initial: Option<f64>,
    ) -> Result<Option<f64>, HostError>;

    fn ask_session_details(
        &mut self,
        request: SessionDetailsRequest,
    ) -> Result<Option<SessionDetails>, HostError>;
}

/// Prompter that never answers. Used where no interactive input is
/// possible, e.g. when catching a persisted timer up to wall-clock time.
#[derive(Debug, Default)]
pub struct NullPrompter;

impl Prompter for NullPrompter {
    fn ask_scalar(
        &mut self,
        _kind: ScalarKind,
        _range: ScalarRange,
        _initial: Option<f64>,
    ) -> Result<Option<f64>, HostError> {
        Ok(None)
    }

    fn ask_session_details(
        &mut self,
        _request: SessionDetailsRequest,
    ) -> Result<Option<SessionDetails>, HostError> {
        Ok(None)
    }
}

/// The task a session is attributed to, when the host tracks one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTask {
    /// Document path, e.g. `projects/parser.md`.
    pub path: String,
    /// Block anchor within the document, e.g. `^x1`.
    pub anchor: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Identification of the tracked task; supplied by the host environment.
pub trait TaskLookup {
    fn current(&self) -> Option<TrackedTask>;
}

/// Fixed task lookup, set once by the host.
#[derive(Debug, Clone, Default)]
pub struct StaticTaskLookup(pub Option<TrackedTask>);

impl TaskLookup for StaticTaskLookup {
    fn current(&self) -> Option<TrackedTask> {
        self.0.clone()
    }
}
