//! Reminder-related commands
//!
//! Inspect and resolve the active alarm.

use crate::app::AppState;
use crate::error::Result;
use crate::models::{AlarmState, Task};

/// Current alarm session
pub async fn get_alarm(state: &AppState) -> AlarmState {
    state.reminders_service.current().await
}

/// Run one alarm check now
pub async fn check_alarms(state: &AppState) -> Option<Task> {
    state.reminders_service.check_and_trigger().await
}

/// Dismiss the active alarm
pub async fn dismiss_alarm(state: &AppState) -> Result<Option<Task>> {
    state.reminders_service.dismiss().await
}

/// Snooze the active alarm
pub async fn snooze_alarm(state: &AppState, minutes: u32) -> Result<Option<Task>> {
    state.reminders_service.snooze(minutes).await
}

/// Complete the alarming task
pub async fn complete_alarm(state: &AppState) -> Result<Option<Task>> {
    state.reminders_service.complete().await
}
