//! Insert/replace operations against the Pomodoro Section.

use super::scan::{section_range, SectionLines};
use super::{fmt_value, EventKind, SectionEvent, SummaryKind, SummarySample, START_MARKER};
use crate::host::TrackedTask;

/// Merge one event line into the section, creating the section when absent.
///
/// Ids are assigned per file: a START takes the next id after every id seen
/// in the section (so an END fallback id never collides with a later START);
/// an END attaches to the most recently started id, defaulting to 1 when no
/// start exists. The new line lands at the end of the section,
/// immediately before the next heading or at document end.
pub fn append_event(text: &str, event: &SectionEvent) -> String {
    let mut lines = SectionLines::split(text);
    let header = match lines.find_header() {
        Some(i) => i,
        None => lines.create_header(),
    };
    let end = section_range(&lines, header);

    let mut max_start = 0u64;
    let mut max_end = 0u64;
    for i in header + 1..end {
        match lines.parse_event(i) {
            Some((id, EventKind::Start)) => max_start = max_start.max(id),
            Some((id, EventKind::End)) => max_end = max_end.max(id),
            None => {}
        }
    }

    let id = match event.kind {
        EventKind::Start => max_start.max(max_end) + 1,
        EventKind::End => {
            if max_start == 0 {
                1
            } else {
                max_start
            }
        }
    };

    lines.insert(end, render_event_line(id, event));
    lines.join()
}

/// Replace the summary lines of one series within the current block.
///
/// The current block is the one opened by the *last* start line: it runs
/// until its matching end line, the next start line, or the section end,
/// whichever comes first. All prior summary lines of this series inside the
/// block are removed, then the fresh series line (and, once the end line
/// exists, an average line) is inserted at the block tail so both sit
/// immediately before the end line.
///
/// Returns `None` when the section or a start line does not exist -- the
/// caller leaves the document untouched. An empty sample list persists the
/// removal only.
pub fn update_sample_summary(
    text: &str,
    kind: SummaryKind,
    samples: &[SummarySample],
) -> Option<String> {
    let mut lines = SectionLines::split(text);
    let header = lines.find_header()?;
    let section_end = section_range(&lines, header);

    let mut last_start: Option<(usize, u64)> = None;
    for i in header + 1..section_end {
        if let Some((id, EventKind::Start)) = lines.parse_event(i) {
            last_start = Some((i, id));
        }
    }
    let (start_idx, start_id) = last_start?;

    let mut next_start = None;
    for i in start_idx + 1..section_end {
        if matches!(lines.parse_event(i), Some((_, EventKind::Start))) {
            next_start = Some(i);
            break;
        }
    }

    let search_limit = next_start.unwrap_or(section_end);
    let mut end_idx = None;
    for i in start_idx + 1..search_limit {
        if lines.parse_event(i) == Some((start_id, EventKind::End)) {
            end_idx = Some(i);
            break;
        }
    }
    let has_end = end_idx.is_some();
    let mut tail = end_idx.or(next_start).unwrap_or(section_end);

    let mut i = start_idx + 1;
    while i < tail {
        if lines.is_summary(i, kind) {
            lines.remove(i);
            tail -= 1;
        } else {
            i += 1;
        }
    }

    if samples.is_empty() {
        return Some(lines.join());
    }

    let parts: Vec<String> = samples
        .iter()
        .map(|s| format!("{}, {:.1}m", fmt_value(s.value), s.minutes_from_start))
        .collect();
    let series = format!(" {}: {}", kind.label(), parts.join("; "));
    lines.insert(tail, series);

    // The average is defined only for closed sessions.
    if has_end {
        let avg = samples.iter().map(|s| s.value).sum::<f64>() / samples.len() as f64;
        lines.insert(tail + 1, format!(" avg {}: {avg:.2}", kind.label()));
    }

    Some(lines.join())
}

fn render_event_line(id: u64, event: &SectionEvent) -> String {
    let time = event.time.format("%H:%M");
    match event.kind {
        EventKind::Start => {
            let mut line = format!("- {START_MARKER} {id} start {time}");
            if let Some(link) = event.task.as_ref().and_then(render_task_link) {
                line.push_str(&link);
            }
            if let Some(erv) = event.expected_reward {
                line.push_str(&format!(" ERV: {}", fmt_value(erv)));
            }
            line
        }
        EventKind::End => format!("- {id} end {time}"),
    }
}

/// Inline link to the tracked task: ` [[path#^anchor|alias]]`.
///
/// Requires both a path and an anchor; the alias falls back from the task
/// name to its description to the link path itself.
fn render_task_link(task: &TrackedTask) -> Option<String> {
    if task.path.is_empty() || task.anchor.is_empty() {
        return None;
    }
    let link_path = strip_md_suffix(&task.path);
    let anchor = task.anchor.trim();
    let alias = if !task.name.is_empty() {
        task.name.as_str()
    } else if !task.description.is_empty() {
        task.description.as_str()
    } else {
        link_path
    };
    Some(format!(" [[{link_path}#{anchor}|{alias}]]"))
}

fn strip_md_suffix(path: &str) -> &str {
    // The boundary check keeps the slice safe when the tail of the path is
    // multibyte (then it cannot be ".md" anyway).
    if path.len() >= 3
        && path.is_char_boundary(path.len() - 3)
        && path[path.len() - 3..].eq_ignore_ascii_case(".md")
    {
        &path[..path.len() - 3]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use indoc::indoc;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn start_event(time: NaiveTime) -> SectionEvent {
        SectionEvent {
            kind: EventKind::Start,
            time,
            task: None,
            expected_reward: None,
        }
    }

    fn end_event(time: NaiveTime) -> SectionEvent {
        SectionEvent {
            kind: EventKind::End,
            time,
            task: None,
            expected_reward: None,
        }
    }

    fn review_task() -> TrackedTask {
        TrackedTask {
            path: "a.md".into(),
            anchor: "^x1".into(),
            name: "Review".into(),
            description: String::new(),
        }
    }

    #[test]
    fn creates_section_in_empty_document() {
        let event = SectionEvent {
            task: Some(review_task()),
            ..start_event(at(9, 0))
        };
        let text = append_event("", &event);
        assert_eq!(
            text,
            "## Pomodoro Section\n\n- \u{1F345} 1 start 09:00 [[a#^x1|Review]]\n"
        );
    }

    #[test]
    fn end_lands_immediately_after_start() {
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(review_task()),
                ..start_event(at(9, 0))
            },
        );
        let text = append_event(&text, &end_event(at(9, 25)));
        assert_eq!(
            text,
            "## Pomodoro Section\n\n- \u{1F345} 1 start 09:00 [[a#^x1|Review]]\n- 1 end 09:25\n"
        );
    }

    #[test]
    fn reuses_existing_header() {
        let doc = indoc! {"
            # Daily note

            Some notes.

            ## Pomodoro Section

            - \u{1F345} 1 start 08:00
            - 1 end 08:25
        "};
        let text = append_event(doc, &start_event(at(9, 0)));
        assert_eq!(text.matches("Pomodoro Section").count(), 1);
        assert!(text.contains("- \u{1F345} 2 start 09:00"));
    }

    #[test]
    fn inserts_before_next_heading() {
        let doc = indoc! {"
            ## Pomodoro Section

            - \u{1F345} 1 start 08:00

            ## Notes

            unrelated
        "};
        let text = append_event(doc, &end_event(at(8, 25)));
        let expected = indoc! {"
            ## Pomodoro Section

            - \u{1F345} 1 start 08:00

            - 1 end 08:25
            ## Notes

            unrelated
        "};
        assert_eq!(text, expected);
    }

    #[test]
    fn section_created_after_trailing_blank_lines() {
        let text = append_event("existing content\n\n\n", &start_event(at(9, 0)));
        assert_eq!(
            text,
            "existing content\n\n## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n"
        );
    }

    #[test]
    fn start_ids_increase_within_file() {
        let mut text = String::new();
        for i in 0..3 {
            text = append_event(&text, &start_event(at(9, i)));
            text = append_event(&text, &end_event(at(9, i + 25)));
        }
        for id in 1..=3 {
            assert!(text.contains(&format!("- \u{1F345} {id} start")));
            assert!(text.contains(&format!("- {id} end")));
        }
    }

    #[test]
    fn end_without_start_falls_back_to_id_1() {
        let text = append_event("", &end_event(at(9, 0)));
        assert!(text.contains("- 1 end 09:00"));
        // A later proper START must not duplicate the fallback id.
        let text = append_event(&text, &start_event(at(9, 5)));
        assert!(text.contains("- \u{1F345} 2 start 09:05"));
    }

    #[test]
    fn expected_reward_annotated_on_start() {
        let event = SectionEvent {
            expected_reward: Some(4.0),
            ..start_event(at(10, 30))
        };
        let text = append_event("", &event);
        assert!(text.contains("- \u{1F345} 1 start 10:30 ERV: 4\n"));
    }

    #[test]
    fn link_alias_falls_back_to_description_then_path() {
        let mut task = review_task();
        task.name.clear();
        task.description = "review the parser".into();
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(task.clone()),
                ..start_event(at(9, 0))
            },
        );
        assert!(text.contains("[[a#^x1|review the parser]]"));

        task.description.clear();
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(task.clone()),
                ..start_event(at(9, 0))
            },
        );
        assert!(text.contains("[[a#^x1|a]]"));

        // Without an anchor there is no link at all.
        task.anchor.clear();
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(task),
                ..start_event(at(9, 0))
            },
        );
        assert!(text.contains("- \u{1F345} 1 start 09:00\n"));
    }

    #[test]
    fn multibyte_task_paths_link_safely() {
        // A path whose tail bytes straddle a char boundary must not panic
        // in the suffix strip.
        let mut task = review_task();
        task.path = "\u{e9}\u{e9}".into();
        task.name.clear();
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(task.clone()),
                ..start_event(at(9, 0))
            },
        );
        assert!(text.contains("[[\u{e9}\u{e9}#^x1|\u{e9}\u{e9}]]"));

        // A multibyte stem with a real .md suffix still strips it.
        task.path = "caf\u{e9}.md".into();
        let text = append_event(
            "",
            &SectionEvent {
                task: Some(task),
                ..start_event(at(9, 0))
            },
        );
        assert!(text.contains("[[caf\u{e9}#^x1|caf\u{e9}]]"));
    }

    #[test]
    fn malformed_lines_do_not_feed_id_scan() {
        let doc = indoc! {"
            ## Pomodoro Section

            - \u{1F345} seven start 09:00
            - 2 started late
            - \u{1F345} 1 start 09:00
        "};
        let text = append_event(doc, &start_event(at(10, 0)));
        assert!(text.contains("- \u{1F345} 2 start 10:00"));
    }

    // ── Summary lines ────────────────────────────────────────────────

    fn samples() -> Vec<SummarySample> {
        vec![
            SummarySample {
                value: 3.0,
                minutes_from_start: 1.0,
            },
            SummarySample {
                value: 4.0,
                minutes_from_start: 2.0,
            },
        ]
    }

    #[test]
    fn series_only_while_session_open() {
        let text = append_event("", &start_event(at(9, 0)));
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        assert_eq!(
            text,
            "## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n ARV: 3, 1.0m; 4, 2.0m\n"
        );
        assert!(!text.contains("avg"));
    }

    #[test]
    fn average_appears_once_end_line_exists() {
        let text = append_event("", &start_event(at(9, 0)));
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        let text = append_event(&text, &end_event(at(9, 25)));
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        // Prior ARV-only line replaced; series then average, both right
        // before the end line.
        assert_eq!(
            text,
            "## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n ARV: 3, 1.0m; 4, 2.0m\n avg ARV: 3.50\n- 1 end 09:25\n"
        );
    }

    #[test]
    fn update_is_idempotent() {
        let text = append_event("", &start_event(at(9, 0)));
        let text = append_event(&text, &end_event(at(9, 25)));
        let once = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        let twice = update_sample_summary(&once, SummaryKind::Reward, &samples()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_sample_list_clears_summary() {
        let text = append_event("", &start_event(at(9, 0)));
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        let text = update_sample_summary(&text, SummaryKind::Reward, &[]).unwrap();
        assert_eq!(text, "## Pomodoro Section\n\n- \u{1F345} 1 start 09:00\n");
    }

    #[test]
    fn no_section_or_no_start_is_noop() {
        assert!(update_sample_summary("# Other\n", SummaryKind::Reward, &samples()).is_none());
        assert!(update_sample_summary(
            "## Pomodoro Section\n\nno events yet\n",
            SummaryKind::Reward,
            &samples()
        )
        .is_none());
    }

    #[test]
    fn only_last_block_is_updated() {
        let doc = indoc! {"
            ## Pomodoro Section

            - \u{1F345} 1 start 08:00
             ARV: 2, 1.0m
             avg ARV: 2.00
            - 1 end 08:25
            - \u{1F345} 2 start 09:00
        "};
        let text = update_sample_summary(doc, SummaryKind::Reward, &samples()).unwrap();
        // Block 1 untouched.
        assert!(text.contains(" avg ARV: 2.00\n- 1 end 08:25"));
        // Block 2 got the open-session series.
        assert!(text.ends_with("- \u{1F345} 2 start 09:00\n ARV: 3, 1.0m; 4, 2.0m\n"));
    }

    #[test]
    fn reward_and_energy_series_coexist() {
        let text = append_event("", &start_event(at(9, 0)));
        let text = append_event(&text, &end_event(at(9, 25)));
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        let energy = vec![SummarySample {
            value: 7.0,
            minutes_from_start: 0.0,
        }];
        let text = update_sample_summary(&text, SummaryKind::Energy, &energy).unwrap();
        let expected = indoc! {"
            ## Pomodoro Section

            - \u{1F345} 1 start 09:00
             ARV: 3, 1.0m; 4, 2.0m
             avg ARV: 3.50
             EL: 7, 0.0m
             avg EL: 7.00
            - 1 end 09:25
        "};
        assert_eq!(text, expected);

        // Refreshing one series must not disturb the other.
        let text = update_sample_summary(&text, SummaryKind::Reward, &samples()).unwrap();
        assert!(text.contains(" EL: 7, 0.0m\n avg EL: 7.00\n"));
    }

    #[test]
    fn quoted_summary_lines_are_replaced_too() {
        let doc = indoc! {"
            ## Pomodoro Section

            - \u{1F345} 1 start 09:00
            > ARV: 1, 0.5m
            - 1 end 09:25
        "};
        let text = update_sample_summary(doc, SummaryKind::Reward, &samples()).unwrap();
        assert!(!text.contains("> ARV"));
        assert!(text.contains(" ARV: 3, 1.0m; 4, 2.0m\n avg ARV: 3.50\n- 1 end 09:25"));
    }

    proptest! {
        /// N starts with ends interleaved per the "most recent unclosed
        /// start" rule: starts get ids 1..N, each end gets the id of the
        /// latest start seen so far.
        #[test]
        fn ids_are_monotonic(ops in proptest::collection::vec(any::<bool>(), 1..24)) {
            let mut text = String::new();
            let mut max_start = 0u64;
            let mut max_end = 0u64;
            let mut expected: Vec<(u64, bool)> = Vec::new();
            for is_start in ops {
                if is_start {
                    text = append_event(&text, &start_event(at(9, 0)));
                    max_start = max_start.max(max_end) + 1;
                    expected.push((max_start, true));
                } else {
                    text = append_event(&text, &end_event(at(9, 25)));
                    let id = max_start.max(1);
                    max_end = max_end.max(id);
                    expected.push((id, false));
                }
            }
            let lines = crate::section::SectionLines::split(&text);
            let mut observed = Vec::new();
            for i in 0..lines.len() {
                if let Some((id, kind)) = lines.parse_event(i) {
                    observed.push((id, kind == EventKind::Start));
                }
            }
            prop_assert_eq!(observed, expected);
        }
    }
}
