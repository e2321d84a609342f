//! Task views
//!
//! Pure derivations over the task collection: the filtered and sorted
//! projection used for display, and the aggregate counters. Nothing here is
//! cached; callers recompute after every change.

use crate::models::{Task, TaskFilter, TaskSort};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Aggregate counters over the whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Rounded share of completed tasks, 0 when there are none
    pub completion_percent: u8,
}

/// Filtered, sorted copy of `tasks`. Sorting is stable.
pub fn project(tasks: &[Task], filter: TaskFilter, sort: TaskSort, now: DateTime<Utc>) -> Vec<Task> {
    let mut result: Vec<Task> = tasks
        .iter()
        .filter(|t| matches_filter(t, filter, now))
        .cloned()
        .collect();

    match sort {
        TaskSort::Date => result.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
        TaskSort::Priority => result.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        TaskSort::Name => result.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }

    result
}

/// Counters recomputed from scratch
pub fn stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();

    let completion_percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    };

    TaskStats {
        total,
        completed,
        pending: total - completed,
        overdue,
        completion_percent,
    }
}

fn matches_filter(task: &Task, filter: TaskFilter, now: DateTime<Utc>) -> bool {
    match filter {
        TaskFilter::All => true,
        TaskFilter::Today => same_local_day(task.due_date, now),
        TaskFilter::Upcoming => !task.completed && task.due_date > now,
        TaskFilter::Completed => task.completed,
    }
}

/// Calendar-day comparison in the user's local time zone
fn same_local_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.with_timezone(&Local).date_naive() == b.with_timezone(&Local).date_naive()
}

/// Case-insensitive ordering with a case-sensitive tie break, so "apple"
/// sorts before "Banana" the way a human-facing list expects.
fn compare_titles(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| a.cmp(b))
}
