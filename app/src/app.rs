//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::DATA_DIR_ENV;
use crate::error::{AppError, Result};
use crate::services::{
    alerts, AlarmSound, AssistantService, Notifier, RemindersService, SettingsService,
    TasksService, TerminalBell, TerminalNotifier,
};
use crate::storage::BlobStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub tasks_service: TasksService,
    pub reminders_service: RemindersService,
    pub settings_service: SettingsService,
    pub assistant_service: AssistantService,
}

/// Collaborators injected at startup
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub sound: Arc<dyn AlarmSound>,
    pub assistant: AssistantService,
}

impl Collaborators {
    /// Terminal notifier and bell, Gemini assistant when a key is configured
    pub fn terminal(notifications_enabled: bool) -> Self {
        Self {
            notifier: Arc::new(TerminalNotifier::new(notifications_enabled)),
            sound: Arc::new(TerminalBell::new()),
            assistant: AssistantService::from_env(),
        }
    }
}

/// Resolve the data directory: explicit path, then environment, then the
/// platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }

    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    directories::ProjectDirs::from("", "", "taskflow")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| AppError::Generic("Could not determine data directory".to_string()))
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf, collaborators: Collaborators) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    let store = BlobStore::new(app_data_dir.join("blobs"));
    store.initialize().await?;

    let tasks_service = TasksService::load(store.clone()).await;
    let settings_service = SettingsService::new(store);

    alerts::ensure_notification_permission(collaborators.notifier.as_ref());

    let reminders_service = RemindersService::new(
        tasks_service.clone(),
        collaborators.notifier,
        collaborators.sound,
    );

    tracing::info!("Application initialized successfully");

    Ok(AppState {
        app_data_dir,
        tasks_service,
        reminders_service,
        settings_service,
        assistant_service: collaborators.assistant,
    })
}
