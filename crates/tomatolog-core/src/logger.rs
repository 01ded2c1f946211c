//! Gatekeeping and destination resolution in front of the section writer.
//!
//! A log call that does not apply -- logging disabled, wrong log level,
//! non-WORK session, no resolvable destination -- is a silent skip, not an
//! error. Capability failures (document read/write) are returned to the
//! coordinator, which turns them into notices; they never stall the timer.

use chrono::{Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::host::{DocumentStore, TrackedTask};
use crate::section::{self, EventKind, SectionEvent, SummaryKind, SummarySample};
use crate::timer::{Metric, Mode, Sample, SessionSnapshot};

/// Which session modes get logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    All,
    Work,
    Break,
}

impl LogLevel {
    fn matches(self, mode: Mode) -> bool {
        match self {
            LogLevel::All => true,
            LogLevel::Work => mode == Mode::Work,
            LogLevel::Break => mode == Mode::Break,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub enabled: bool,
    pub level: LogLevel,
    /// Configured log document, relative to the store root. `None` disables
    /// the fallback destination.
    pub path: Option<String>,
    /// Prefer the tracked task's own document over the configured path.
    pub prefer_focused: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::All,
            path: None,
            prefer_focused: false,
        }
    }
}

/// Writes session events and sample summaries into the Pomodoro Section of
/// the resolved log document.
pub struct Logger {
    store: Box<dyn DocumentStore>,
    settings: LogSettings,
}

impl Logger {
    pub fn new(store: Box<dyn DocumentStore>, settings: LogSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Append a start or end event line for the session.
    ///
    /// Only work sessions count as pomodoros; everything else is skipped.
    pub fn log_event(
        &mut self,
        snapshot: &SessionSnapshot,
        kind: EventKind,
        task: Option<&TrackedTask>,
    ) -> Result<(), HostError> {
        if !self.applies(snapshot.mode) {
            return Ok(());
        }
        let Some(doc) = self.resolve_destination(task)? else {
            return Ok(());
        };

        let begin = start_time(snapshot);
        let time = match kind {
            EventKind::Start => begin,
            // End time is start plus elapsed, not "now": a catch-up tick may
            // process a completion long after it happened.
            EventKind::End => begin + chrono::Duration::milliseconds(snapshot.elapsed_ms as i64),
        };
        let event = SectionEvent {
            kind,
            time,
            task: if kind == EventKind::Start {
                task.cloned()
            } else {
                None
            },
            expected_reward: if kind == EventKind::Start {
                snapshot.expected_reward
            } else {
                None
            },
        };

        let text = self.store.read(&doc)?;
        let updated = section::append_event(&text, &event);
        self.store.write(&doc, &updated)
    }

    /// Replace the summary lines for one metric in the current block.
    ///
    /// The series line updates on every new sample so the user sees it while
    /// the session runs; the average joins it once the end line exists.
    /// Skipped when the metric has no samples yet.
    pub fn update_summary(
        &mut self,
        snapshot: &SessionSnapshot,
        metric: Metric,
        task: Option<&TrackedTask>,
    ) -> Result<(), HostError> {
        if !self.applies(snapshot.mode) {
            return Ok(());
        }
        let samples = match metric {
            Metric::Reward => &snapshot.reward_samples,
            Metric::Energy => &snapshot.energy_samples,
        };
        if samples.is_empty() {
            return Ok(());
        }
        let Some(doc) = self.resolve_destination(task)? else {
            return Ok(());
        };

        let kind = match metric {
            Metric::Reward => SummaryKind::Reward,
            Metric::Energy => SummaryKind::Energy,
        };
        let summary: Vec<SummarySample> = samples.iter().map(to_summary_sample).collect();

        let text = self.store.read(&doc)?;
        if let Some(updated) = section::update_sample_summary(&text, kind, &summary) {
            self.store.write(&doc, &updated)?;
        }
        Ok(())
    }

    fn applies(&self, mode: Mode) -> bool {
        self.settings.enabled && self.settings.level.matches(mode) && mode == Mode::Work
    }

    /// The tracked task's own document has the highest priority; the
    /// configured path (created on demand) is the fallback. `None` means
    /// nowhere to log.
    fn resolve_destination(
        &mut self,
        task: Option<&TrackedTask>,
    ) -> Result<Option<String>, HostError> {
        if self.settings.prefer_focused {
            if let Some(task) = task {
                if task.path.to_lowercase().ends_with(".md") {
                    if let Some(doc) = self.store.resolve(&task.path) {
                        return Ok(Some(doc));
                    }
                    // fall through to the configured path
                }
            }
        }
        let Some(configured) = &self.settings.path else {
            return Ok(None);
        };
        let mut path = configured.clone();
        if !path.to_lowercase().ends_with(".md") {
            path.push_str(".md");
        }
        Ok(Some(self.store.ensure_exists(&path)?))
    }
}

fn start_time(snapshot: &SessionSnapshot) -> NaiveTime {
    snapshot
        .start_epoch_ms
        .and_then(|ms| Local.timestamp_millis_opt(ms as i64).single())
        .map(|dt| dt.time())
        .unwrap_or_else(|| Local::now().time())
}

fn to_summary_sample(sample: &Sample) -> SummarySample {
    SummarySample {
        value: sample.value,
        minutes_from_start: sample.elapsed_ms as f64 / 60_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDocumentStore;

    fn work_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            mode: Mode::Work,
            start_epoch_ms: None,
            elapsed_ms: 25 * 60_000,
            target_ms: 25 * 60_000,
            finished: true,
            description: "review".into(),
            expected_reward: Some(4.0),
            reward_samples: vec![],
            energy_samples: vec![],
        }
    }

    fn logger_with(settings: LogSettings) -> Logger {
        Logger::new(Box::new(MemoryDocumentStore::new()), settings)
    }

    fn configured() -> LogSettings {
        LogSettings {
            path: Some("log.md".into()),
            ..LogSettings::default()
        }
    }

    #[test]
    fn work_start_event_written_with_annotation() {
        let mut logger = logger_with(configured());
        logger
            .log_event(&work_snapshot(), EventKind::Start, None)
            .unwrap();
        let text = logger.store().read("log.md").unwrap();
        assert!(text.starts_with("## Pomodoro Section\n"));
        assert!(text.contains("1 start"));
        assert!(text.contains("ERV: 4"));
    }

    #[test]
    fn break_sessions_are_skipped() {
        let mut logger = logger_with(configured());
        let snapshot = SessionSnapshot {
            mode: Mode::Break,
            ..work_snapshot()
        };
        logger.log_event(&snapshot, EventKind::Start, None).unwrap();
        assert!(logger.store().read("log.md").is_err());
    }

    #[test]
    fn level_filter_skips_mismatched_mode() {
        let mut logger = logger_with(LogSettings {
            level: LogLevel::Break,
            ..configured()
        });
        logger
            .log_event(&work_snapshot(), EventKind::Start, None)
            .unwrap();
        assert!(logger.store().read("log.md").is_err());
    }

    #[test]
    fn disabled_logger_is_silent() {
        let mut logger = logger_with(LogSettings {
            enabled: false,
            ..configured()
        });
        logger
            .log_event(&work_snapshot(), EventKind::Start, None)
            .unwrap();
        assert!(logger.store().read("log.md").is_err());
    }

    #[test]
    fn no_destination_is_a_silent_noop() {
        let mut logger = logger_with(LogSettings::default());
        logger
            .log_event(&work_snapshot(), EventKind::Start, None)
            .unwrap();
    }

    #[test]
    fn focused_task_document_takes_priority() {
        let mut store = MemoryDocumentStore::new();
        store.insert("projects/parser.md", "# Parser\n");
        let mut logger = Logger::new(
            Box::new(store),
            LogSettings {
                prefer_focused: true,
                ..configured()
            },
        );
        let task = TrackedTask {
            path: "projects/parser.md".into(),
            anchor: "^t1".into(),
            name: "Parser".into(),
            description: String::new(),
        };
        logger
            .log_event(&work_snapshot(), EventKind::Start, Some(&task))
            .unwrap();
        let text = logger.store().read("projects/parser.md").unwrap();
        assert!(text.contains("[[projects/parser#^t1|Parser]]"));
        // Configured fallback untouched.
        assert!(logger.store().read("log.md").is_err());
    }

    #[test]
    fn unresolvable_focused_task_falls_back() {
        let mut logger = logger_with(LogSettings {
            prefer_focused: true,
            ..configured()
        });
        let task = TrackedTask {
            path: "gone.md".into(),
            anchor: "^t1".into(),
            ..TrackedTask::default()
        };
        logger
            .log_event(&work_snapshot(), EventKind::Start, Some(&task))
            .unwrap();
        assert!(logger.store().read("log.md").is_ok());
    }

    #[test]
    fn configured_path_gets_md_suffix() {
        let mut logger = logger_with(LogSettings {
            path: Some("daily/log".into()),
            ..LogSettings::default()
        });
        logger
            .log_event(&work_snapshot(), EventKind::Start, None)
            .unwrap();
        assert!(logger.store().read("daily/log.md").is_ok());
    }

    #[test]
    fn summary_written_and_empty_series_skipped() {
        let mut logger = logger_with(configured());
        let mut snapshot = work_snapshot();
        logger
            .log_event(&snapshot, EventKind::Start, None)
            .unwrap();

        // No samples yet: nothing changes.
        logger
            .update_summary(&snapshot, Metric::Reward, None)
            .unwrap();
        let before = logger.store().read("log.md").unwrap();
        assert!(!before.contains("ARV"));

        snapshot.reward_samples = vec![
            Sample {
                value: 3.0,
                elapsed_ms: 60_000,
            },
            Sample {
                value: 4.0,
                elapsed_ms: 120_000,
            },
        ];
        logger
            .update_summary(&snapshot, Metric::Reward, None)
            .unwrap();
        let text = logger.store().read("log.md").unwrap();
        assert!(text.contains(" ARV: 3, 1.0m; 4, 2.0m"));
    }
}
