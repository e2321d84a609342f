//! Assistant commands
//!
//! AI task breakdown and daily summary.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::models::{Task, TaskUpdate};

/// Ask the assistant for steps and store them as the task's checklist.
///
/// An empty suggestion leaves the task unchanged.
pub async fn breakdown_task(state: &AppState, id: &str) -> Result<Task> {
    let task = state
        .tasks_service
        .get(id)
        .await
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;

    let steps = state
        .assistant_service
        .breakdown(&task.title, &task.description)
        .await;

    if steps.is_empty() {
        tracing::info!("No steps suggested for task {}", id);
        return Ok(task);
    }

    state
        .tasks_service
        .update(
            id,
            TaskUpdate {
                sub_tasks: Some(steps),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))
}

/// Motivational summary of pending work
pub async fn get_daily_summary(state: &AppState) -> String {
    let tasks = state.tasks_service.list().await;
    state.assistant_service.daily_summary(&tasks).await
}
