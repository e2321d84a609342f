//! Task-related commands
//!
//! CRUD operations, views and counters for tasks.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::models::{Priority, Task, TaskDraft, TaskFilter, TaskSort, TaskUpdate};
use crate::services::view::{self, TaskStats};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Create a new task
pub async fn create_task(
    state: &AppState,
    title: String,
    description: Option<String>,
    priority: Option<Priority>,
    due_date: Option<DateTime<Utc>>,
    sub_tasks: Vec<String>,
) -> Result<Task> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Task title must not be empty".to_string()));
    }

    state
        .tasks_service
        .add(TaskDraft {
            title: Some(title),
            description,
            priority,
            due_date,
            sub_tasks: Some(sub_tasks),
        })
        .await
}

/// Get a task by ID
pub async fn get_task(state: &AppState, id: &str) -> Result<Task> {
    state
        .tasks_service
        .get(id)
        .await
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
}

/// Resolve a full task ID from an exact ID or a unique prefix
pub async fn resolve_task_id(state: &AppState, input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::TaskNotFound(input.to_string()));
    }

    let tasks = state.tasks_service.list().await;
    if tasks.iter().any(|t| t.id == input) {
        return Ok(input.to_string());
    }

    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(input)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(AppError::TaskNotFound(input.to_string())),
        _ => Err(AppError::InvalidInput(format!(
            "Task ID prefix '{}' matches {} tasks",
            input,
            matches.len()
        ))),
    }
}

/// Filtered and sorted task list
pub async fn list_tasks(state: &AppState, filter: TaskFilter, sort: TaskSort) -> Vec<Task> {
    let tasks = state.tasks_service.list().await;
    view::project(&tasks, filter, sort, Utc::now())
}

/// Aggregate counters
pub async fn get_stats(state: &AppState) -> TaskStats {
    let tasks = state.tasks_service.list().await;
    view::stats(&tasks, Utc::now())
}

/// Edit a task
pub async fn update_task(state: &AppState, id: &str, update: TaskUpdate) -> Result<Task> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::InvalidInput("Task title must not be empty".to_string()));
    }

    state
        .tasks_service
        .update(id, update)
        .await?
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
}

/// Flip a task's completed flag
pub async fn toggle_task(state: &AppState, id: &str) -> Result<Task> {
    state
        .tasks_service
        .toggle_completed(id)
        .await?
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
}

/// Delete a task
pub async fn delete_task(state: &AppState, id: &str) -> Result<()> {
    if !state.tasks_service.delete(id).await? {
        return Err(AppError::TaskNotFound(id.to_string()));
    }
    Ok(())
}

/// Remove one checklist step (zero-based index)
pub async fn remove_task_step(state: &AppState, id: &str, index: usize) -> Result<Task> {
    state
        .tasks_service
        .remove_subtask(id, index)
        .await?
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
}

/// Parse a due date given on the command line.
///
/// Accepts RFC 3339 timestamps, local "YYYY-MM-DD HH:MM" or "YYYY-MM-DD"
/// (start of day), "now", and relative offsets such as "+30m", "+2h", "+1d".
pub fn parse_due_date(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = input.trim();

    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(offset) = s.strip_prefix('+') {
        return parse_offset(offset).map(|d| now + d);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid due date: {}", s)))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::InvalidInput(format!("Due date does not exist locally: {}", s)))
}

/// Parse "<number><unit>" with unit m, h or d
fn parse_offset(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let Some(unit) = s.chars().last() else {
        return Err(AppError::InvalidInput("Empty offset".to_string()));
    };
    let number_part = &s[..s.len() - unit.len_utf8()];

    let value: i64 = number_part
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid number in offset: {}", s)))?;

    if value <= 0 {
        return Err(AppError::InvalidInput(
            "Offset value must be greater than 0".to_string(),
        ));
    }

    match unit {
        'm' => Ok(Duration::minutes(value)),
        'h' => Ok(Duration::hours(value)),
        'd' => Ok(Duration::days(value)),
        _ => Err(AppError::InvalidInput(format!(
            "Invalid offset unit '{}'. Use 'm' (minutes), 'h' (hours), or 'd' (days)",
            unit
        ))),
    }
}
