//! Services module
//!
//! Business logic services that coordinate between commands and storage.

pub mod alerts;
pub mod assistant;
pub mod reminders;
pub mod scheduler;
pub mod settings;
pub mod tasks;
pub mod view;

pub use alerts::{AlarmSound, NotificationPermission, Notifier, TerminalBell, TerminalNotifier};
pub use assistant::{AssistantService, GeminiClient, GenerationRequest, TextGenerator};
pub use reminders::{AlarmEvent, AlarmResolution, RemindersService};
pub use scheduler::SchedulerService;
pub use settings::SettingsService;
pub use tasks::TasksService;
pub use view::TaskStats;
