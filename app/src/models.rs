//! Domain models
//!
//! Rust structs representing persisted and derived entities.
//! Persisted models serialize with the camelCase field names used by the
//! stored task blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Severity rank used by priority sorting (higher is more urgent)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority '{}'. Use low, medium or high",
                other
            )),
        }
    }
}

/// A task with an optional checklist of sub-steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Set once the alarm for the current due date has been resolved
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub sub_tasks: Vec<String>,
}

impl Task {
    /// Whether this task should raise an alarm at `now`
    pub fn is_triggered(&self, now: DateTime<Utc>) -> bool {
        !self.completed && !self.reminder_sent && self.due_date <= now
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date < now
    }
}

/// Create task request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub sub_tasks: Option<Vec<String>>,
}

/// Partial update request; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub reminder_sent: Option<bool>,
    pub sub_tasks: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
            && self.reminder_sent.is_none()
            && self.sub_tasks.is_none()
    }
}

/// Appearance preference, persisted as its own blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppTheme {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

fn default_accent_color() -> String {
    crate::config::DEFAULT_ACCENT_COLOR.to_string()
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            dark_mode: false,
            accent_color: default_accent_color(),
        }
    }
}

/// Currently surfaced alarm (never persisted)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlarmState {
    pub active: bool,
    pub task: Option<Task>,
}

/// View filter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Today,
    Upcoming,
    Completed,
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "today" => Ok(TaskFilter::Today),
            "upcoming" => Ok(TaskFilter::Upcoming),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!(
                "Invalid filter '{}'. Use all, today, upcoming or completed",
                other
            )),
        }
    }
}

/// View sort selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    Date,
    Priority,
    Name,
}

impl FromStr for TaskSort {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" | "due" => Ok(TaskSort::Date),
            "priority" => Ok(TaskSort::Priority),
            "name" | "title" => Ok(TaskSort::Name),
            other => Err(format!(
                "Invalid sort '{}'. Use date, priority or name",
                other
            )),
        }
    }
}
