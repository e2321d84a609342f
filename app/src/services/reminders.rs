//! Reminders service
//!
//! Evaluates due tasks and manages the single active alarm.
//!
//! Each check scans the task collection in store order and surfaces the first
//! task that is due, incomplete and not yet acknowledged. While an alarm is
//! active further checks do nothing; the alarm only ends when the user
//! dismisses, snoozes or completes it.

use crate::config::NOTIFICATION_TITLE;
use crate::error::{AppError, Result};
use crate::models::{AlarmState, Task, TaskUpdate};
use crate::services::alerts::{AlarmSound, NotificationPermission, Notifier};
use crate::services::TasksService;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// How an alarm was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AlarmResolution {
    Dismissed,
    Snoozed { minutes: u32 },
    Completed,
}

/// Alarm lifecycle events for UI surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AlarmEvent {
    Triggered {
        task: Task,
    },
    Resolved {
        task_id: String,
        resolution: AlarmResolution,
    },
}

/// Reminders service holding the alarm session
#[derive(Clone)]
pub struct RemindersService {
    tasks: TasksService,
    session: Arc<Mutex<AlarmState>>,
    notifier: Arc<dyn Notifier>,
    sound: Arc<dyn AlarmSound>,
    events: broadcast::Sender<AlarmEvent>,
}

impl RemindersService {
    pub fn new(tasks: TasksService, notifier: Arc<dyn Notifier>, sound: Arc<dyn AlarmSound>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tasks,
            session: Arc::new(Mutex::new(AlarmState::default())),
            notifier,
            sound,
            events,
        }
    }

    /// Subscribe to alarm events
    pub fn subscribe(&self) -> broadcast::Receiver<AlarmEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current alarm session
    pub async fn current(&self) -> AlarmState {
        self.session.lock().await.clone()
    }

    pub async fn is_alarming(&self) -> bool {
        self.session.lock().await.active
    }

    /// Check for a due task at the current time
    pub async fn check_and_trigger(&self) -> Option<Task> {
        self.check_and_trigger_at(Utc::now()).await
    }

    /// Check for a due task at `now` and start an alarm for the first match.
    ///
    /// Returns the task that started alarming, or `None` when an alarm is
    /// already active or nothing is due.
    pub async fn check_and_trigger_at(&self, now: DateTime<Utc>) -> Option<Task> {
        let mut session = self.session.lock().await;

        if session.active {
            tracing::debug!("Alarm already active, skipping check");
            return None;
        }

        self.tasks.reload().await;
        let task = self.tasks.find_first(|t| t.is_triggered(now)).await?;

        tracing::info!("Triggering alarm for task {}: {}", task.id, task.title);

        *session = AlarmState {
            active: true,
            task: Some(task.clone()),
        };
        drop(session);

        self.start_alerts(&task);
        let _ = self.events.send(AlarmEvent::Triggered { task: task.clone() });

        Some(task)
    }

    /// Acknowledge the alarm without changing the task's schedule
    pub async fn dismiss(&self) -> Result<Option<Task>> {
        self.resolve(AlarmResolution::Dismissed, |tasks, id| async move {
            tasks
                .update(
                    &id,
                    TaskUpdate {
                        reminder_sent: Some(true),
                        ..Default::default()
                    },
                )
                .await
        })
        .await
    }

    /// Push the due date `minutes` into the future from now
    pub async fn snooze(&self, minutes: u32) -> Result<Option<Task>> {
        self.snooze_at(minutes, Utc::now()).await
    }

    /// Push the due date to `now + minutes` and re-arm the reminder
    pub async fn snooze_at(&self, minutes: u32, now: DateTime<Utc>) -> Result<Option<Task>> {
        if minutes == 0 {
            return Err(AppError::InvalidInput(
                "Snooze length must be at least one minute".to_string(),
            ));
        }

        let due_date = now + Duration::minutes(i64::from(minutes));
        self.resolve(AlarmResolution::Snoozed { minutes }, move |tasks, id| async move {
            tasks
                .update(
                    &id,
                    TaskUpdate {
                        due_date: Some(due_date),
                        reminder_sent: Some(false),
                        ..Default::default()
                    },
                )
                .await
        })
        .await
    }

    /// Mark the alarming task as done
    pub async fn complete(&self) -> Result<Option<Task>> {
        self.resolve(AlarmResolution::Completed, |tasks, id| async move {
            tasks
                .update(
                    &id,
                    TaskUpdate {
                        completed: Some(true),
                        reminder_sent: Some(true),
                        ..Default::default()
                    },
                )
                .await
        })
        .await
    }

    /// End the active session after applying `apply` to its task.
    ///
    /// The session ends and the sound stops even if persisting the change
    /// fails; the error is still returned to the caller.
    async fn resolve<F, Fut>(&self, resolution: AlarmResolution, apply: F) -> Result<Option<Task>>
    where
        F: FnOnce(TasksService, String) -> Fut,
        Fut: std::future::Future<Output = Result<Option<Task>>>,
    {
        let mut session = self.session.lock().await;

        let task = match (session.active, session.task.clone()) {
            (true, Some(task)) => task,
            _ => {
                tracing::debug!("No active alarm, ignoring {:?}", resolution);
                return Ok(None);
            }
        };

        let result = apply(self.tasks.clone(), task.id.clone()).await;

        *session = AlarmState::default();
        drop(session);

        self.sound.stop();

        tracing::info!("Alarm for task {} resolved: {:?}", task.id, resolution);
        let _ = self.events.send(AlarmEvent::Resolved {
            task_id: task.id,
            resolution,
        });

        result
    }

    /// Stop the audible alert without resolving the alarm (used on shutdown)
    pub fn silence(&self) {
        self.sound.stop();
    }

    /// Fire-and-forget sound and notification; failures are only logged
    fn start_alerts(&self, task: &Task) {
        if let Err(e) = self.sound.play() {
            tracing::warn!("Alarm sound failed to start: {}", e);
        }

        if self.notifier.permission() == NotificationPermission::Granted {
            if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, &task.title) {
                tracing::warn!("Failed to send notification: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use crate::storage::BlobStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSound {
        fail: bool,
        plays: AtomicUsize,
        stops: AtomicUsize,
    }

    impl AlarmSound for RecordingSound {
        fn play(&self) -> Result<()> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Playback("autoplay blocked".to_string()));
            }
            Ok(())
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordingNotifier {
        permission: NotificationPermission,
        sent: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new(permission: NotificationPermission) -> Self {
            Self {
                permission,
                sent: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> NotificationPermission {
            self.permission
        }

        fn request_permission(&self) -> NotificationPermission {
            self.permission
        }

        fn notify(&self, _title: &str, body: &str) -> Result<()> {
            self.sent.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    struct Fixture {
        service: RemindersService,
        tasks: TasksService,
        store: BlobStore,
        sound: Arc<RecordingSound>,
        notifier: Arc<RecordingNotifier>,
        _temp: TempDir,
    }

    async fn create_fixture(permission: NotificationPermission, sound_fails: bool) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path().join("blobs"));
        store.initialize().await.unwrap();

        let tasks = TasksService::load(store.clone()).await;
        let sound = Arc::new(RecordingSound {
            fail: sound_fails,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::new(permission));
        let service = RemindersService::new(tasks.clone(), notifier.clone(), sound.clone());

        Fixture {
            service,
            tasks,
            store,
            sound,
            notifier,
            _temp: temp_dir,
        }
    }

    async fn add_due(tasks: &TasksService, title: &str, due: DateTime<Utc>) -> Task {
        tasks
            .add(TaskDraft {
                title: Some(title.to_string()),
                due_date: Some(due),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_nothing_due_stays_idle() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        add_due(&fx.tasks, "Later", now + Duration::hours(1)).await;

        assert!(fx.service.check_and_trigger_at(now).await.is_none());
        assert!(!fx.service.is_alarming().await);
        assert_eq!(fx.sound.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_in_store_order_wins_then_next_after_dismiss() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();

        // Added B first so store order (newest first) is [A, B]
        let b = add_due(&fx.tasks, "B", now - Duration::minutes(2)).await;
        let a = add_due(&fx.tasks, "A", now - Duration::minutes(1)).await;

        let triggered = fx.service.check_and_trigger_at(now).await.unwrap();
        assert_eq!(triggered.id, a.id);

        // Still alarming: further checks do nothing
        assert!(fx.service.check_and_trigger_at(now).await.is_none());

        fx.service.dismiss().await.unwrap();

        let next = fx.service.check_and_trigger_at(now).await.unwrap();
        assert_eq!(next.id, b.id);
    }

    #[tokio::test]
    async fn test_alert_side_effects() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        add_due(&fx.tasks, "Stretch", now).await;

        fx.service.check_and_trigger_at(now).await.unwrap();

        assert_eq!(fx.sound.plays.load(Ordering::SeqCst), 1);
        assert_eq!(*fx.notifier.sent.lock().unwrap(), vec!["Stretch"]);

        fx.service.dismiss().await.unwrap();
        assert_eq!(fx.sound.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_notification_without_permission() {
        let fx = create_fixture(NotificationPermission::Default, false).await;
        let now = Utc::now();
        add_due(&fx.tasks, "Quiet", now).await;

        fx.service.check_and_trigger_at(now).await.unwrap();
        assert!(fx.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sound_failure_keeps_alarm_active() {
        let fx = create_fixture(NotificationPermission::Denied, true).await;
        let now = Utc::now();
        let task = add_due(&fx.tasks, "Loud", now).await;

        let triggered = fx.service.check_and_trigger_at(now).await.unwrap();
        assert_eq!(triggered.id, task.id);

        let state = fx.service.current().await;
        assert!(state.active);
        assert_eq!(state.task.unwrap().id, task.id);
    }

    #[tokio::test]
    async fn test_dismiss_only_acknowledges() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        let task = add_due(&fx.tasks, "Dismiss me", now - Duration::minutes(1)).await;

        fx.service.check_and_trigger_at(now).await.unwrap();
        let dismissed = fx.service.dismiss().await.unwrap().unwrap();

        assert!(dismissed.reminder_sent);
        assert!(!dismissed.completed);
        assert_eq!(dismissed.due_date, task.due_date);
        assert!(!fx.service.is_alarming().await);

        // Never re-triggers for the same due date
        assert!(fx
            .service
            .check_and_trigger_at(now + Duration::hours(5))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_alarms_for_task_added_by_another_instance() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        let old = add_due(&fx.tasks, "old", now - Duration::minutes(5)).await;

        let first = fx.service.check_and_trigger_at(now).await.unwrap();
        assert_eq!(first.id, old.id);

        let other = TasksService::load(fx.store.clone()).await;
        let added = add_due(&other, "added from other terminal", now - Duration::minutes(1)).await;

        fx.service.dismiss().await.unwrap();

        let on_disk = TasksService::load(fx.store.clone()).await;
        let titles: Vec<String> = on_disk.list().await.into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["added from other terminal", "old"]);

        let next = fx.service.check_and_trigger_at(now).await.unwrap();
        assert_eq!(next.id, added.id);
    }

    #[tokio::test]
    async fn test_snooze_rearms_and_retriggers() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        let task = add_due(&fx.tasks, "Snooze me", now - Duration::minutes(1)).await;

        fx.service.check_and_trigger_at(now).await.unwrap();
        let snoozed = fx.service.snooze_at(5, now).await.unwrap().unwrap();

        assert_eq!(snoozed.due_date, now + Duration::minutes(5));
        assert!(!snoozed.reminder_sent);

        // Not yet due
        assert!(fx
            .service
            .check_and_trigger_at(now + Duration::minutes(4))
            .await
            .is_none());

        let again = fx
            .service
            .check_and_trigger_at(now + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(again.id, task.id);
    }

    #[tokio::test]
    async fn test_snooze_rejects_zero_and_keeps_session() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        add_due(&fx.tasks, "Zero", now).await;

        fx.service.check_and_trigger_at(now).await.unwrap();

        assert!(fx.service.snooze_at(0, now).await.is_err());
        assert!(fx.service.is_alarming().await);
    }

    #[tokio::test]
    async fn test_complete_sets_both_flags() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        add_due(&fx.tasks, "Finish", now).await;

        fx.service.check_and_trigger_at(now).await.unwrap();
        let done = fx.service.complete().await.unwrap().unwrap();

        assert!(done.completed);
        assert!(done.reminder_sent);
        assert!(!fx.service.is_alarming().await);
    }

    #[tokio::test]
    async fn test_actions_without_session_are_noops() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let now = Utc::now();
        let task = add_due(&fx.tasks, "Untouched", now + Duration::hours(1)).await;

        assert!(fx.service.dismiss().await.unwrap().is_none());
        assert!(fx.service.snooze_at(5, now).await.unwrap().is_none());
        assert!(fx.service.complete().await.unwrap().is_none());

        assert_eq!(fx.tasks.get(&task.id).await.unwrap(), task);
        assert_eq!(fx.sound.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let fx = create_fixture(NotificationPermission::Granted, false).await;
        let mut events = fx.service.subscribe();
        let now = Utc::now();
        let task = add_due(&fx.tasks, "Observed", now).await;

        fx.service.check_and_trigger_at(now).await.unwrap();
        fx.service.snooze_at(15, now).await.unwrap();

        match events.recv().await.unwrap() {
            AlarmEvent::Triggered { task: t } => assert_eq!(t.id, task.id),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(
            events.recv().await.unwrap(),
            AlarmEvent::Resolved {
                task_id: task.id,
                resolution: AlarmResolution::Snoozed { minutes: 15 },
            }
        );
    }
}
