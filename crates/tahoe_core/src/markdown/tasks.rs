//! Checklist extraction and index-addressed toggling.
//!
//! A task line is any line whose trimmed form starts with `- [ ] ` or
//! `- [x] `. Line indices are positions in `content.split('\n')`, so they stay
//! aligned with [`toggle_task_line`].

use crate::model::note::{Note, NoteId};

const OPEN_TASK_PREFIX: &str = "- [ ] ";
const DONE_TASK_PREFIX: &str = "- [x] ";
const OPEN_MARKER: &str = "[ ]";
const DONE_MARKER: &str = "[x]";

/// One task line recognized inside a single line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLine<'a> {
    pub done: bool,
    pub text: &'a str,
}

/// A task found in one note's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTask {
    /// 0-based index into `content.split('\n')`.
    pub line_index: usize,
    pub done: bool,
    pub text: String,
}

/// A task projected into the cross-note checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalTask {
    pub note_id: NoteId,
    pub note_title: String,
    pub text: String,
    pub done: bool,
    pub line_index: usize,
}

/// Parses one line as a task line.
pub fn parse_task_line(line: &str) -> Option<TaskLine<'_>> {
    let trimmed = line.trim();
    if let Some(text) = trimmed.strip_prefix(OPEN_TASK_PREFIX) {
        return Some(TaskLine { done: false, text });
    }
    if let Some(text) = trimmed.strip_prefix(DONE_TASK_PREFIX) {
        return Some(TaskLine { done: true, text });
    }
    None
}

/// Extracts all task lines from one note's content, in line order.
pub fn extract_tasks(content: &str) -> Vec<ExtractedTask> {
    content
        .split('\n')
        .enumerate()
        .filter_map(|(line_index, line)| {
            parse_task_line(line).map(|task| ExtractedTask {
                line_index,
                done: task.done,
                text: task.text.to_string(),
            })
        })
        .collect()
}

/// Collects tasks across notes, preserving note order and line order.
pub fn collect_tasks(notes: &[Note]) -> Vec<GlobalTask> {
    notes
        .iter()
        .flat_map(|note| {
            extract_tasks(&note.content)
                .into_iter()
                .map(move |task| GlobalTask {
                    note_id: note.id,
                    note_title: note.title.clone(),
                    text: task.text,
                    done: task.done,
                    line_index: task.line_index,
                })
        })
        .collect()
}

/// Flips the done marker on line `line_index` and returns the new content.
///
/// The line is not re-validated against what was extracted earlier: on a
/// non-task line the first `[ ]` becomes `[x]`, or else the first `[x]` becomes
/// `[ ]`. An out-of-range index returns the content unchanged.
pub fn toggle_task_line(content: &str, line_index: usize) -> String {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let Some(line) = lines.get_mut(line_index) else {
        return content.to_string();
    };
    *line = toggle_marker(line);
    lines.join("\n")
}

fn toggle_marker(line: &str) -> String {
    match parse_task_line(line) {
        Some(task) if task.done => line.replacen(DONE_MARKER, OPEN_MARKER, 1),
        Some(_) => line.replacen(OPEN_MARKER, DONE_MARKER, 1),
        None if line.contains(OPEN_MARKER) => line.replacen(OPEN_MARKER, DONE_MARKER, 1),
        None => line.replacen(DONE_MARKER, OPEN_MARKER, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_tasks, parse_task_line, toggle_task_line};

    #[test]
    fn parse_task_line_requires_full_prefix() {
        let task = parse_task_line("  - [ ] buy milk  ").expect("indented task");
        assert!(!task.done);
        assert_eq!(task.text, "buy milk");

        assert!(parse_task_line("- [x] done").expect("done task").done);
        assert!(parse_task_line("- [ ]").is_none());
        assert!(parse_task_line("- [X] upper").is_none());
        assert!(parse_task_line("* [ ] star").is_none());
    }

    #[test]
    fn extract_tasks_reports_split_line_indices() {
        let tasks = extract_tasks("# Todo\n\n- [ ] one\ntext\n- [x] two");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].line_index, 2);
        assert_eq!(tasks[1].line_index, 4);
        assert!(tasks[1].done);
    }

    #[test]
    fn toggle_only_touches_the_addressed_line() {
        let content = "- [ ] a\n- [ ] b\n";
        assert_eq!(toggle_task_line(content, 1), "- [ ] a\n- [x] b\n");
    }

    #[test]
    fn toggle_on_non_task_line_swaps_first_marker() {
        assert_eq!(toggle_task_line("see [ ] and [x]", 0), "see [x] and [x]");
        assert_eq!(toggle_task_line("see [x] and [x]", 0), "see [ ] and [x]");
        assert_eq!(toggle_task_line("plain", 0), "plain");
    }

    #[test]
    fn toggle_out_of_range_is_noop() {
        assert_eq!(toggle_task_line("- [ ] a", 5), "- [ ] a");
    }
}
