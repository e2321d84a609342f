//! Integration tests for TaskFlow
//!
//! These tests verify end-to-end functionality including:
//! - Task lifecycle and persistence across restarts
//! - Alarm triggering and resolution
//! - Assistant breakdown and summary fallbacks

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use taskflow::app::{self, AppState, Collaborators};
use taskflow::commands;
use taskflow::config::{SUMMARY_ALL_CAUGHT_UP, TASKS_STORAGE_KEY};
use taskflow::error::Result;
use taskflow::models::{Priority, TaskFilter, TaskSort, TaskUpdate};
use taskflow::services::{
    AlarmSound, AssistantService, GenerationRequest, NotificationPermission, Notifier,
    TextGenerator,
};
use taskflow::storage::BlobStore;
use tempfile::TempDir;

#[derive(Default)]
struct SilentSound {
    plays: AtomicUsize,
}

impl AlarmSound for SilentSound {
    fn play(&self) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {}
}

#[derive(Default)]
struct CountingNotifier {
    requests: AtomicUsize,
    sent: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn permission(&self) -> NotificationPermission {
        if self.requests.load(Ordering::SeqCst) > 0 {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Default
        }
    }

    fn request_permission(&self) -> NotificationPermission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        NotificationPermission::Granted
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StepsGenerator;

#[async_trait]
impl TextGenerator for StepsGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        if request.response_schema.is_some() {
            Ok(r#"{"subTasks": ["Gather receipts", "Fill in form", "Submit online"]}"#.to_string())
        } else {
            Ok("One task left. Finish strong!".to_string())
        }
    }
}

/// Helper to start the application against a data directory
async fn start_app(
    data_dir: &Path,
    assistant: AssistantService,
) -> (AppState, Arc<SilentSound>, Arc<CountingNotifier>) {
    let sound = Arc::new(SilentSound::default());
    let notifier = Arc::new(CountingNotifier::default());

    let state = app::setup(
        data_dir.to_path_buf(),
        Collaborators {
            notifier: notifier.clone(),
            sound: sound.clone(),
            assistant,
        },
    )
    .await
    .unwrap();

    (state, sound, notifier)
}

#[tokio::test]
async fn test_task_crud_operations() {
    let temp = TempDir::new().unwrap();
    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    // Create
    let task = commands::create_task(
        &state,
        "File taxes".to_string(),
        Some("Before the deadline".to_string()),
        Some(Priority::High),
        Some(Utc::now() + Duration::days(2)),
        Vec::new(),
    )
    .await
    .unwrap();
    assert_eq!(task.title, "File taxes");

    // Empty titles are rejected by the caller-facing command
    assert!(commands::create_task(&state, "  ".to_string(), None, None, None, Vec::new())
        .await
        .is_err());

    // Update
    let updated = commands::update_task(
        &state,
        &task.id,
        TaskUpdate {
            title: Some("File 2026 taxes".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "File 2026 taxes");
    assert_eq!(updated.priority, Priority::High);

    // Prefix lookup
    let prefix = &task.id[..8];
    assert_eq!(commands::resolve_task_id(&state, prefix).await.unwrap(), task.id);

    // Toggle and list
    commands::toggle_task(&state, &task.id).await.unwrap();
    let done = commands::list_tasks(&state, TaskFilter::Completed, TaskSort::Date).await;
    assert_eq!(done.len(), 1);

    // Delete
    commands::delete_task(&state, &task.id).await.unwrap();
    assert!(commands::get_task(&state, &task.id).await.is_err());
    assert!(commands::delete_task(&state, &task.id).await.is_err());
}

#[tokio::test]
async fn test_tasks_survive_restart() {
    let temp = TempDir::new().unwrap();

    let before = {
        let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
        for title in ["Alpha", "Beta", "Gamma"] {
            commands::create_task(&state, title.to_string(), None, None, None, vec![
                "step".to_string(),
            ])
            .await
            .unwrap();
        }
        state.tasks_service.list().await
    };

    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    assert_eq!(state.tasks_service.list().await, before);

    let titles: Vec<String> = before.into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Gamma", "Beta", "Alpha"]);
}

#[tokio::test]
async fn test_corrupt_task_blob_starts_empty() {
    let temp = TempDir::new().unwrap();

    let store = BlobStore::new(temp.path().join("blobs"));
    store.initialize().await.unwrap();
    store.write(TASKS_STORAGE_KEY, b"not json at all").await.unwrap();

    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    assert!(state.tasks_service.list().await.is_empty());
    assert_eq!(commands::get_stats(&state).await.total, 0);
}

#[tokio::test]
async fn test_alarm_queue_follows_store_order() {
    let temp = TempDir::new().unwrap();
    let (state, sound, notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    // Permission was requested once during setup
    assert_eq!(notifier.requests.load(Ordering::SeqCst), 1);

    let now = Utc::now();
    let b = commands::create_task(&state, "B".to_string(), None, None, Some(now - Duration::minutes(2)), Vec::new())
        .await
        .unwrap();
    let a = commands::create_task(&state, "A".to_string(), None, None, Some(now - Duration::minutes(1)), Vec::new())
        .await
        .unwrap();

    let first = commands::check_alarms(&state).await.unwrap();
    assert_eq!(first.id, a.id);
    assert!(commands::check_alarms(&state).await.is_none());
    assert_eq!(commands::get_alarm(&state).await.task.unwrap().id, a.id);

    let dismissed = commands::dismiss_alarm(&state).await.unwrap().unwrap();
    assert!(dismissed.reminder_sent);
    assert!(!dismissed.completed);

    let second = commands::check_alarms(&state).await.unwrap();
    assert_eq!(second.id, b.id);

    let completed = commands::complete_alarm(&state).await.unwrap().unwrap();
    assert!(completed.completed);
    assert!(completed.reminder_sent);

    assert!(commands::check_alarms(&state).await.is_none());
    assert_eq!(sound.plays.load(Ordering::SeqCst), 2);
    assert_eq!(notifier.sent.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_watch_sees_tasks_from_other_invocations() {
    let temp = TempDir::new().unwrap();
    let (watch, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    let now = Utc::now();
    let first = commands::create_task(&watch, "Old".to_string(), None, None, Some(now - Duration::minutes(3)), Vec::new())
        .await
        .unwrap();
    assert_eq!(commands::check_alarms(&watch).await.unwrap().id, first.id);

    // A separate one-shot run adds and edits while the alarm is up
    let (cli, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    let added = commands::create_task(&cli, "New".to_string(), None, None, Some(now - Duration::minutes(1)), Vec::new())
        .await
        .unwrap();

    commands::complete_alarm(&watch).await.unwrap();

    let (fresh, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    let on_disk = fresh.tasks_service.list().await;
    assert_eq!(on_disk.len(), 2);
    assert!(on_disk.iter().any(|t| t.id == added.id && !t.completed));
    assert!(on_disk.iter().any(|t| t.id == first.id && t.completed));

    assert_eq!(commands::check_alarms(&watch).await.unwrap().id, added.id);
}

#[tokio::test]
async fn test_snooze_moves_due_date_and_persists() {
    let temp = TempDir::new().unwrap();
    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    let task = commands::create_task(&state, "Stand up".to_string(), None, None, None, Vec::new())
        .await
        .unwrap();

    commands::check_alarms(&state).await.unwrap();
    let before = Utc::now();
    let snoozed = commands::snooze_alarm(&state, 15).await.unwrap().unwrap();

    assert!(!snoozed.reminder_sent);
    assert!(snoozed.due_date >= before + Duration::minutes(15));
    assert!(!state.reminders_service.is_alarming().await);

    // Not due again yet
    assert!(commands::check_alarms(&state).await.is_none());

    let (reloaded, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    let persisted = commands::get_task(&reloaded, &task.id).await.unwrap();
    assert_eq!(persisted.due_date, snoozed.due_date);
}

#[tokio::test]
async fn test_summary_and_breakdown() {
    let temp = TempDir::new().unwrap();
    let assistant = AssistantService::new(Some(Arc::new(StepsGenerator)));
    let (state, _sound, _notifier) = start_app(temp.path(), assistant).await;

    assert_eq!(commands::get_daily_summary(&state).await, SUMMARY_ALL_CAUGHT_UP);

    let task = commands::create_task(&state, "Taxes".to_string(), None, None, None, Vec::new())
        .await
        .unwrap();

    let broken_down = commands::breakdown_task(&state, &task.id).await.unwrap();
    assert_eq!(
        broken_down.sub_tasks,
        vec!["Gather receipts", "Fill in form", "Submit online"]
    );

    assert_eq!(
        commands::get_daily_summary(&state).await,
        "One task left. Finish strong!"
    );
}

#[tokio::test]
async fn test_breakdown_without_assistant_keeps_task() {
    let temp = TempDir::new().unwrap();
    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    let task = commands::create_task(
        &state,
        "Clean garage".to_string(),
        None,
        None,
        None,
        vec!["Sort boxes".to_string()],
    )
    .await
    .unwrap();

    let unchanged = commands::breakdown_task(&state, &task.id).await.unwrap();
    assert_eq!(unchanged, task);
}

#[tokio::test]
async fn test_theme_round_trip() {
    let temp = TempDir::new().unwrap();
    let (state, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;

    let theme = commands::update_theme(&state, Some(true), Some("#10b981".to_string()))
        .await
        .unwrap();
    assert!(theme.dark_mode);

    // Invalid colour leaves everything as it was
    assert!(commands::update_theme(&state, Some(false), Some("green".to_string()))
        .await
        .is_err());

    let (reloaded, _sound, _notifier) = start_app(temp.path(), AssistantService::new(None)).await;
    let theme = commands::get_theme(&reloaded).await.unwrap();
    assert!(theme.dark_mode);
    assert_eq!(theme.accent_color, "#10b981");
}
