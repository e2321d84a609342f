//! Scheduler Service
//!
//! Runs the repeating alarm check as a job on a tokio-cron-scheduler instance
//! so the timer can be cancelled and shut down explicitly.

use crate::error::{AppError, Result};
use crate::services::RemindersService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Scheduler service for periodic alarm checks
pub struct SchedulerService {
    scheduler: Arc<RwLock<JobScheduler>>,
    reminders: RemindersService,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
}

impl SchedulerService {
    /// Create new scheduler service
    pub async fn new(reminders: RemindersService) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            reminders,
            current_job_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<()> {
        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        tracing::info!("Alarm scheduler started");
        Ok(())
    }

    /// Schedule alarm checks every `interval`, replacing any previous job
    pub async fn schedule_alarm_checks(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(AppError::InvalidInput(
                "Alarm check interval must be greater than 0".to_string(),
            ));
        }

        self.cancel_alarm_checks().await?;

        let reminders = self.reminders.clone();

        let job = Job::new_repeated_async(interval, move |_uuid, _l| {
            let reminders = reminders.clone();
            Box::pin(async move {
                if let Some(task) = reminders.check_and_trigger().await {
                    tracing::debug!("Scheduled check raised alarm for {}", task.id);
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Failed to create alarm job: {}", e)))?;

        let job_id = job.guid();

        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to schedule job: {}", e)))?;

        let mut current_job = self.current_job_id.write().await;
        *current_job = Some(job_id);

        tracing::info!("Alarm checks scheduled every {:?}", interval);
        Ok(())
    }

    /// Whether an alarm check job is currently registered
    pub async fn is_scheduled(&self) -> bool {
        self.current_job_id.read().await.is_some()
    }

    /// Cancel scheduled alarm checks
    pub async fn cancel_alarm_checks(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;

        if let Some(job_id) = *current_job {
            let scheduler = self.scheduler.write().await;
            scheduler
                .remove(&job_id)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to remove job: {}", e)))?;

            *current_job = None;
            tracing::info!("Alarm checks cancelled");
        }

        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel_alarm_checks().await?;

        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        tracing::info!("Alarm scheduler shutdown");
        Ok(())
    }
}
