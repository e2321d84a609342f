//! Commands exposed to the CLI
//!
//! This module organizes commands into logical submodules:
//! - `tasks`: Task CRUD, views and counters
//! - `reminders`: Alarm inspection and resolution
//! - `assistant`: AI breakdown and daily summary
//! - `settings`: Theme preference
//! - `watch`: Foreground alarm loop

pub mod assistant;
pub mod reminders;
pub mod settings;
pub mod tasks;
pub mod watch;

use crate::app::AppState;
use crate::models::Task;
use chrono::Local;

pub use assistant::*;
pub use reminders::*;
pub use settings::*;
pub use tasks::*;
pub use watch::{run_watch, WatchInput};

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.app_data_dir.to_string_lossy().to_string(),
        assistant_enabled: state.assistant_service.is_enabled(),
    }
}

/// Application information structure
#[derive(serde::Serialize)]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
    pub assistant_enabled: bool,
}

/// One-line rendering of a task for terminal output
pub fn describe_task(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    let due = task.due_date.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let steps = if task.sub_tasks.is_empty() {
        String::new()
    } else {
        format!(" ({} steps)", task.sub_tasks.len())
    };

    format!(
        "[{}] {} {:<6} {}  {}{}",
        check,
        short_id(&task.id),
        task.priority.to_string(),
        due,
        task.title,
        steps
    )
}

/// First segment of a UUID, enough to recognise a task in listings
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}
