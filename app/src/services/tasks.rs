//! Tasks service
//!
//! Owns the canonical, ordered task collection (newest first) and mirrors it
//! to the task blob after every mutation. Loading and persisting are the only
//! points where the collection crosses the storage boundary.

use crate::config::{TASKS_STORAGE_KEY, UNTITLED_TASK_TITLE};
use crate::error::Result;
use crate::models::{Task, TaskDraft, TaskUpdate};
use crate::storage::BlobStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Service for managing the task collection
#[derive(Clone)]
pub struct TasksService {
    store: BlobStore,
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl TasksService {
    /// Load the persisted collection.
    ///
    /// A missing or unreadable blob yields an empty collection; the failure is
    /// logged and never propagated.
    pub async fn load(store: BlobStore) -> Self {
        let tasks = match read_tasks(&store).await {
            Ok(tasks) => {
                tracing::info!("Loaded {} tasks", tasks.len());
                tasks
            }
            Err(e) => {
                tracing::warn!("Failed to load tasks, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            store,
            tasks: Arc::new(Mutex::new(tasks)),
        }
    }

    /// Current collection in store order
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Get a task by ID
    pub async fn get(&self, id: &str) -> Option<Task> {
        self.tasks.lock().await.iter().find(|t| t.id == id).cloned()
    }

    /// First task in store order matching `predicate`
    pub async fn find_first<F>(&self, predicate: F) -> Option<Task>
    where
        F: Fn(&Task) -> bool,
    {
        self.tasks.lock().await.iter().find(|t| predicate(t)).cloned()
    }

    /// Re-read the collection from the task blob.
    ///
    /// Other processes write the same blob, so long-lived holders call this
    /// before acting on the collection. An unreadable blob keeps the current
    /// in-memory copy.
    pub async fn reload(&self) {
        let mut tasks = self.tasks.lock().await;
        self.refresh(&mut tasks).await;
    }

    /// Create a new task and prepend it to the collection
    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        let mut tasks = self.tasks.lock().await;
        self.refresh(&mut tasks).await;
        let now = Utc::now();

        let mut id = Uuid::new_v4().to_string();
        while tasks.iter().any(|t| t.id == id) {
            id = Uuid::new_v4().to_string();
        }

        let title = draft
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED_TASK_TITLE.to_string());

        let task = Task {
            id,
            title,
            description: draft.description.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            due_date: draft.due_date.unwrap_or(now),
            completed: false,
            created_at: now,
            reminder_sent: false,
            sub_tasks: draft.sub_tasks.unwrap_or_default(),
        };

        tracing::info!("Creating task {}: {}", task.id, task.title);

        let mut next = Vec::with_capacity(tasks.len() + 1);
        next.push(task.clone());
        next.extend(tasks.iter().cloned());

        self.persist(&next).await?;
        *tasks = next;

        Ok(task)
    }

    /// Apply a partial update. Returns `None` if the task does not exist.
    ///
    /// Moving the due date re-arms the reminder unless the update sets
    /// `reminder_sent` explicitly.
    pub async fn update(&self, id: &str, update: TaskUpdate) -> Result<Option<Task>> {
        if update.is_empty() {
            self.reload().await;
            return Ok(self.get(id).await);
        }

        self.mutate(id, move |task| {
            if let Some(title) = update.title {
                task.title = title;
            }
            if let Some(description) = update.description {
                task.description = description;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(due_date) = update.due_date {
                if due_date != task.due_date {
                    task.due_date = due_date;
                    task.reminder_sent = false;
                }
            }
            if let Some(completed) = update.completed {
                task.completed = completed;
            }
            if let Some(reminder_sent) = update.reminder_sent {
                task.reminder_sent = reminder_sent;
            }
            if let Some(sub_tasks) = update.sub_tasks {
                task.sub_tasks = sub_tasks;
            }
            true
        })
        .await
    }

    /// Flip the completed flag
    pub async fn toggle_completed(&self, id: &str) -> Result<Option<Task>> {
        self.mutate(id, |task| {
            task.completed = !task.completed;
            true
        })
        .await
    }

    /// Remove one checklist step by position; out-of-range is a no-op
    pub async fn remove_subtask(&self, id: &str, index: usize) -> Result<Option<Task>> {
        self.mutate(id, |task| {
            if index >= task.sub_tasks.len() {
                return false;
            }
            task.sub_tasks.remove(index);
            true
        })
        .await
    }

    /// Delete a task. Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        self.refresh(&mut tasks).await;

        if !tasks.iter().any(|t| t.id == id) {
            tracing::debug!("Delete ignored, task not found: {}", id);
            return Ok(false);
        }

        let next: Vec<Task> = tasks.iter().filter(|t| t.id != id).cloned().collect();
        self.persist(&next).await?;
        *tasks = next;
        tracing::info!("Deleted task: {}", id);

        Ok(true)
    }

    /// Re-read, run `f` on a copy of the task and persist if it reports a change.
    ///
    /// The in-memory collection is only replaced once the write succeeded.
    async fn mutate<F>(&self, id: &str, f: F) -> Result<Option<Task>>
    where
        F: FnOnce(&mut Task) -> bool,
    {
        let mut tasks = self.tasks.lock().await;
        self.refresh(&mut tasks).await;

        let Some(position) = tasks.iter().position(|t| t.id == id) else {
            tracing::debug!("Update ignored, task not found: {}", id);
            return Ok(None);
        };

        let mut next = tasks.clone();
        if !f(&mut next[position]) {
            return Ok(Some(next[position].clone()));
        }
        let updated = next[position].clone();

        self.persist(&next).await?;
        *tasks = next;
        tracing::debug!("Task updated: {}", id);

        Ok(Some(updated))
    }

    /// Replace `tasks` with the blob contents, keeping them on a read failure
    async fn refresh(&self, tasks: &mut Vec<Task>) {
        match read_tasks(&self.store).await {
            Ok(fresh) => *tasks = fresh,
            Err(e) => tracing::warn!(
                "Failed to re-read tasks, keeping {} in memory: {}",
                tasks.len(),
                e
            ),
        }
    }

    /// Rewrite the full collection blob
    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_vec(tasks)?;
        if let Err(e) = self.store.write(TASKS_STORAGE_KEY, &content).await {
            tracing::error!("Failed to persist {} tasks: {}", tasks.len(), e);
            return Err(e);
        }
        Ok(())
    }
}

async fn read_tasks(store: &BlobStore) -> Result<Vec<Task>> {
    match store.read(TASKS_STORAGE_KEY).await? {
        Some(data) => Ok(serde_json::from_slice(&data)?),
        None => Ok(Vec::new()),
    }
}
