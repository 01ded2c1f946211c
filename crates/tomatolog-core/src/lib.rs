//! # Tomatolog Core Library
//!
//! This library provides the core business logic for Tomatolog, a work/break
//! interval timer that mirrors its sessions into a "Pomodoro Section" of a
//! plain-text markdown document. It implements a CLI-first philosophy where
//! all operations are available via a standalone CLI binary.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A caller-ticked state machine -- no internal threads.
//!   The host delivers elapsed-time deltas via `tick()`.
//! - **Section Writer**: Pure text-to-text transforms that locate or create
//!   the log section, assign monotonically increasing event ids, and keep
//!   running-sample summary lines in visual order.
//! - **Coordinator**: Wires timer lifecycle events to log writes and to the
//!   host's prompt capabilities.
//! - **Storage**: SQLite-based session history and TOML-based configuration.
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: Core timer state machine
//! - [`section`]: Pomodoro Section text transforms
//! - [`SessionCoordinator`]: Event sequencing glue
//! - [`Config`]: Application configuration management

pub mod coordinator;
pub mod error;
pub mod events;
pub mod host;
pub mod logger;
pub mod section;
pub mod storage;
pub mod timer;

pub use coordinator::{SamplingConfig, SessionCoordinator};
pub use error::{ConfigError, CoreError, HostError, StorageError};
pub use events::Event;
pub use host::{
    DocumentStore, Prompter, ScalarKind, ScalarRange, SessionDetails, SessionDetailsRequest,
    TaskLookup, TrackedTask,
};
pub use logger::{Logger, LogLevel, LogSettings};
pub use storage::{Config, Database};
pub use timer::{Metric, Mode, Sample, SessionSnapshot, SessionTimer};
