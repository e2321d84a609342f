//! Alarm side effects
//!
//! Seams for the two fire-and-forget effects raised when an alarm starts:
//! a system notification and a looping audible alert. The terminal
//! implementations here back the CLI; tests substitute recording fakes.

use crate::config::ALARM_BELL_REPEAT_MS;
use crate::error::{AppError, Result};
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use tokio::task::JoinHandle;

/// Notification permission as last decided by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Not asked yet
    Default,
    Granted,
    Denied,
}

impl NotificationPermission {
    fn to_u8(self) -> u8 {
        match self {
            NotificationPermission::Default => 0,
            NotificationPermission::Granted => 1,
            NotificationPermission::Denied => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => NotificationPermission::Granted,
            2 => NotificationPermission::Denied,
            _ => NotificationPermission::Default,
        }
    }
}

/// System notification collaborator
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;

    /// Ask the user for permission and return the decision
    fn request_permission(&self) -> NotificationPermission;

    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Audible alert collaborator
pub trait AlarmSound: Send + Sync {
    /// Start looping playback
    fn play(&self) -> Result<()>;

    /// Stop playback and rewind; safe to call when not playing
    fn stop(&self);
}

/// Ask for notification permission once, if it has not been decided yet
pub fn ensure_notification_permission(notifier: &dyn Notifier) -> NotificationPermission {
    match notifier.permission() {
        NotificationPermission::Default => {
            let decision = notifier.request_permission();
            tracing::info!("Notification permission decided: {:?}", decision);
            decision
        }
        decided => decided,
    }
}

/// Prints notifications as a banner on stderr.
///
/// Permission is granted on request when notifications are enabled.
pub struct TerminalNotifier {
    enabled: bool,
    permission: AtomicU8,
}

impl TerminalNotifier {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            permission: AtomicU8::new(NotificationPermission::Default.to_u8()),
        }
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::from_u8(self.permission.load(Ordering::SeqCst))
    }

    fn request_permission(&self) -> NotificationPermission {
        let decision = if self.enabled {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        };
        self.permission.store(decision.to_u8(), Ordering::SeqCst);
        decision
    }

    fn notify(&self, title: &str, body: &str) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\n*** {} ***\n    {}\n", title, body)
            .map_err(|e| AppError::Notification(e.to_string()))
    }
}

/// Rings the terminal bell repeatedly until stopped
#[derive(Default)]
pub struct TerminalBell {
    ringing: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalBell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.ringing
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl AlarmSound for TerminalBell {
    fn play(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Playback(format!("No async runtime for bell: {}", e)))?;

        let mut ringing = self
            .ringing
            .lock()
            .map_err(|_| AppError::Playback("Bell state poisoned".to_string()))?;

        if ringing.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }

        *ringing = Some(runtime.spawn(async {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_millis(ALARM_BELL_REPEAT_MS));
            loop {
                interval.tick().await;
                let rung = {
                    let mut stderr = std::io::stderr().lock();
                    stderr.write_all(b"\x07").is_ok() && stderr.flush().is_ok()
                };
                if !rung {
                    tracing::warn!("Terminal bell write failed, stopping bell");
                    return;
                }
            }
        }));

        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut ringing) = self.ringing.lock() {
            if let Some(handle) = ringing.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for TerminalBell {
    fn drop(&mut self) {
        self.stop();
    }
}
