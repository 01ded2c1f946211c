//! Line-level scanning for the Pomodoro Section.
//!
//! Scanners are deliberately forgiving: lines that do not match the id
//! pattern are ignored rather than treated as errors, so unrelated or
//! hand-mangled content in the section never makes an operation fail.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{EventKind, SummaryKind};

/// Header: any heading level followed by the literal section title.
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^#{1,6}\s+Pomodoro Section\s*$").unwrap());

/// Any heading line (bounds the section).
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+").unwrap());

/// Event line: `- [🍅] <id> start|end ...`. The marker emoji is optional so
/// END lines (which carry none) and legacy content both match.
static EVENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*-\s*(?:\u{1F345}\s+)?(\d+)\s+(start|end)\b").unwrap());

/// Reward summary line, optionally behind a quote/bullet marker.
static REWARD_SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:[>-]\s*)?(?:avg\s+)?ARV:").unwrap());

/// Energy summary line.
static ENERGY_SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:[>-]\s*)?(?:avg\s+)?EL:").unwrap());

/// A document split into lines, normalized to exactly one trailing newline
/// on rejoin.
#[derive(Debug, Clone)]
pub struct SectionLines {
    lines: Vec<String>,
}

impl SectionLines {
    pub fn split(text: &str) -> Self {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        // Drop the empty tail produced by a trailing newline so inserts at
        // "document end" land after the last real line.
        if lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        Self { lines }
    }

    pub fn join(self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> &str {
        &self.lines[index]
    }

    pub fn insert(&mut self, index: usize, line: String) {
        self.lines.insert(index, line);
    }

    pub fn remove(&mut self, index: usize) {
        self.lines.remove(index);
    }

    /// Index of the section header line, if present.
    pub fn find_header(&self) -> Option<usize> {
        self.lines.iter().position(|l| HEADER_RE.is_match(l))
    }

    /// Create the section header at the end of the document, returning its
    /// index. Trailing blank lines are trimmed so the section sits tight;
    /// one blank separator is kept before it when the document is non-empty.
    pub fn create_header(&mut self) -> usize {
        while self.lines.last().is_some_and(|l| l.trim().is_empty()) {
            self.lines.pop();
        }
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.push(format!("## {}", super::SECTION_TITLE));
        let header = self.lines.len() - 1;
        self.lines.push(String::new());
        header
    }

    /// Parse an event line, returning `(id, kind)` when it matches.
    pub fn parse_event(&self, index: usize) -> Option<(u64, EventKind)> {
        let caps = EVENT_RE.captures(&self.lines[index])?;
        let id: u64 = caps[1].parse().ok()?;
        let kind = if caps[2].eq_ignore_ascii_case("start") {
            EventKind::Start
        } else {
            EventKind::End
        };
        Some((id, kind))
    }

    /// Whether the line is a summary line of the given series.
    pub fn is_summary(&self, index: usize, kind: SummaryKind) -> bool {
        let re = match kind {
            SummaryKind::Reward => &REWARD_SUMMARY_RE,
            SummaryKind::Energy => &ENERGY_SUMMARY_RE,
        };
        re.is_match(&self.lines[index])
    }
}

/// End of the section's line range: the next heading of any level after the
/// header, or end of document.
pub fn section_range(lines: &SectionLines, header: usize) -> usize {
    for i in header + 1..lines.len() {
        if HEADING_RE.is_match(lines.get(i)) {
            return i;
        }
    }
    lines.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_match_is_case_insensitive_and_any_level() {
        let lines = SectionLines::split("# pomodoro section\n");
        assert_eq!(lines.find_header(), Some(0));
        let lines = SectionLines::split("intro\n\n#### POMODORO SECTION\n");
        assert_eq!(lines.find_header(), Some(2));
    }

    #[test]
    fn header_requires_exact_title() {
        let lines = SectionLines::split("## Pomodoro Sections\n");
        assert_eq!(lines.find_header(), None);
    }

    #[test]
    fn range_bounded_by_next_heading() {
        let lines = SectionLines::split("## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n\n## Notes\ntext\n");
        assert_eq!(section_range(&lines, 0), 4);
    }

    #[test]
    fn range_extends_to_document_end() {
        let lines = SectionLines::split("## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n");
        assert_eq!(section_range(&lines, 0), 3);
    }

    #[test]
    fn event_parse_accepts_optional_marker() {
        let lines = SectionLines::split("- \u{1F345} 3 start 09:00\n- 3 end 09:25\n- not an event\n");
        assert_eq!(lines.parse_event(0), Some((3, EventKind::Start)));
        assert_eq!(lines.parse_event(1), Some((3, EventKind::End)));
        assert_eq!(lines.parse_event(2), None);
    }

    #[test]
    fn malformed_ids_are_ignored() {
        let lines = SectionLines::split("- \u{1F345} x start 09:00\n- start 09:00\n");
        assert_eq!(lines.parse_event(0), None);
        assert_eq!(lines.parse_event(1), None);
    }

    #[test]
    fn summary_detection_is_per_series() {
        let lines = SectionLines::split(" ARV: 3, 1.0m\n avg ARV: 3.00\n EL: 7, 0.0m\n> avg EL: 7.00\n- 1 end 09:25\n");
        assert!(lines.is_summary(0, SummaryKind::Reward));
        assert!(lines.is_summary(1, SummaryKind::Reward));
        assert!(!lines.is_summary(0, SummaryKind::Energy));
        assert!(lines.is_summary(2, SummaryKind::Energy));
        assert!(lines.is_summary(3, SummaryKind::Energy));
        assert!(!lines.is_summary(4, SummaryKind::Reward));
    }

    #[test]
    fn split_join_normalizes_trailing_newline() {
        assert_eq!(SectionLines::split("").join(), "");
        assert_eq!(SectionLines::split("a\nb").join(), "a\nb\n");
        assert_eq!(SectionLines::split("a\nb\n").join(), "a\nb\n");
    }
}
