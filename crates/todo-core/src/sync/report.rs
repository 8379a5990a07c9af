//! CSV report over a pushed task snapshot
//!
//! Layout:
//!
//! ```text
//! total_tasks,todo_count,doing_count,done_count,completion_rate_percent
//! 2,1,0,1,50.00
//!
//! id,title,status,dueDate
//! 1,"A",DONE,2024-01-01
//! 2,"B",TODO,
//! ```
//!
//! The blank line separates the summary section from the detail section.
//! Detail rows keep push order.

use crate::models::{Task, TaskStatus};

pub const SUMMARY_HEADER: &str =
    "total_tasks,todo_count,doing_count,done_count,completion_rate_percent";

pub const DETAIL_HEADER: &str = "id,title,status,dueDate";

/// Per-status counts of a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub todo: usize,
    pub doing: usize,
    pub done: usize,
}

impl ReportSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut summary = ReportSummary {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Todo => summary.todo += 1,
                TaskStatus::Doing => summary.doing += 1,
                TaskStatus::Done => summary.done += 1,
            }
        }
        summary
    }

    /// Completion rate as a percentage with two decimals, `0.00` for no tasks.
    ///
    /// Computed in integer hundredths, rounding halves up, so the text does
    /// not depend on float formatting.
    pub fn completion_rate(&self) -> String {
        if self.total == 0 {
            return "0.00".to_string();
        }
        let total = self.total as u128;
        let hundredths = (self.done as u128 * 20_000 + total) / (2 * total);
        format!("{}.{:02}", hundredths / 100, hundredths % 100)
    }
}

/// Build the CSV report for `tasks`
pub fn build_csv_report(tasks: &[Task]) -> String {
    let summary = ReportSummary::from_tasks(tasks);
    let mut csv = String::new();

    csv.push_str(SUMMARY_HEADER);
    csv.push('\n');
    csv.push_str(&format!(
        "{},{},{},{},{}\n",
        summary.total,
        summary.todo,
        summary.doing,
        summary.done,
        summary.completion_rate()
    ));
    csv.push('\n');

    csv.push_str(DETAIL_HEADER);
    csv.push('\n');
    for task in tasks {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            task.id,
            escape_csv(&task.title),
            task.status,
            task.due_date.as_deref().unwrap_or("")
        ));
    }

    csv
}

/// Quote a field, doubling embedded quotes
pub fn escape_csv(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
