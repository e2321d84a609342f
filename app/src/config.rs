//! Application configuration constants
//!
//! Central location for storage keys, scheduling intervals, fallback
//! texts and validation boundaries used throughout the application.

// ===== Storage Keys =====

/// Blob key holding the full task collection
pub const TASKS_STORAGE_KEY: &str = "taskflow_tasks";

/// Blob key holding the appearance preference
pub const THEME_STORAGE_KEY: &str = "taskflow_theme";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKFLOW_DATA_DIR";

// ===== Alarm Settings =====

/// Interval between alarm checks in seconds
pub const ALARM_CHECK_INTERVAL_SECS: u64 = 10;

/// Snooze presets offered by the alarm prompt, in minutes
pub const SNOOZE_PRESETS_MINUTES: &[u32] = &[5, 15];

/// Title used for system notifications
pub const NOTIFICATION_TITLE: &str = "TaskFlow Reminder";

/// Interval between bell repeats while an alarm is sounding
pub const ALARM_BELL_REPEAT_MS: u64 = 1_500;

// ===== Task Defaults =====

/// Title assigned when a draft arrives without one
pub const UNTITLED_TASK_TITLE: &str = "Untitled";

// ===== Theme Settings =====

/// Default accent colour (indigo)
pub const DEFAULT_ACCENT_COLOR: &str = "#4f46e5";

// ===== AI Assistant =====

/// Environment variables consulted, in order, for the assistant API key
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Base URL of the generative language REST API
pub const ASSISTANT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for breakdowns and summaries
pub const ASSISTANT_MODEL: &str = "gemini-3-flash-preview";

/// Sub-task count requested from the assistant
pub const MIN_SUBTASKS: usize = 3;
pub const MAX_SUBTASKS: usize = 5;

/// Summary shown when nothing is pending (no assistant call is made)
pub const SUMMARY_ALL_CAUGHT_UP: &str =
    "All caught up! Why not take a break or plan something new?";

/// Summary used when the assistant returns an empty answer
pub const SUMMARY_EMPTY_FALLBACK: &str = "Let's crush those goals today!";

/// Summary used when the assistant call fails
pub const SUMMARY_ERROR_FALLBACK: &str = "You've got tasks to do. Stay focused!";
