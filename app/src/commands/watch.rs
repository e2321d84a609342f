//! Watch command
//!
//! Foreground alarm loop: runs the scheduled alarm checks, prints alarms as
//! they fire and reads resolutions from stdin until the user quits.

use crate::app::AppState;
use crate::commands::describe_task;
use crate::config::SNOOZE_PRESETS_MINUTES;
use crate::error::Result;
use crate::services::{AlarmEvent, AlarmResolution, SchedulerService};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

/// A line typed at the watch prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchInput {
    Dismiss,
    Snooze(u32),
    Complete,
    Status,
    Quit,
}

impl FromStr for WatchInput {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts.next().unwrap_or("").to_lowercase();
        let argument = parts.next();

        match command.as_str() {
            "d" | "dismiss" => Ok(WatchInput::Dismiss),
            "c" | "complete" | "done" => Ok(WatchInput::Complete),
            "?" | "status" => Ok(WatchInput::Status),
            "q" | "quit" | "exit" => Ok(WatchInput::Quit),
            "s" | "snooze" => {
                let minutes = match argument {
                    Some(m) => m
                        .trim_end_matches('m')
                        .parse::<u32>()
                        .map_err(|_| format!("Invalid snooze minutes: {}", m))?,
                    None => SNOOZE_PRESETS_MINUTES[0],
                };
                Ok(WatchInput::Snooze(minutes))
            }
            "" => Err("Empty input".to_string()),
            other => Err(format!(
                "Unknown input '{}'. Use d (dismiss), s [minutes] (snooze), c (complete), ? (status) or q (quit)",
                other
            )),
        }
    }
}

/// Run the alarm loop in the foreground
pub async fn run_watch(state: &AppState, interval: Duration) -> Result<()> {
    let scheduler = SchedulerService::new(state.reminders_service.clone()).await?;
    scheduler.start().await?;
    scheduler.schedule_alarm_checks(interval).await?;

    let mut events = state.reminders_service.subscribe();

    println!(
        "Watching for due tasks every {}s. Commands: d, s [minutes], c, ?, q",
        interval.as_secs()
    );

    // Surface anything already overdue without waiting for the first tick
    state.reminders_service.check_and_trigger().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} alarm events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<WatchInput>() {
                        Ok(WatchInput::Quit) => break,
                        Ok(input) => handle_input(state, input).await,
                        Err(e) => println!("{}", e),
                    }
                }
                Ok(None) => {
                    tracing::info!("Stdin closed, watching until interrupted");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    state.reminders_service.silence();
    scheduler.shutdown().await?;
    println!("Stopped watching.");

    Ok(())
}

/// Apply one prompt input; failures are reported and the loop continues
async fn handle_input(state: &AppState, input: WatchInput) {
    let reminders = &state.reminders_service;

    let outcome = match input {
        WatchInput::Dismiss => reminders.dismiss().await,
        WatchInput::Snooze(minutes) => reminders.snooze(minutes).await,
        WatchInput::Complete => reminders.complete().await,
        WatchInput::Status => {
            let alarm = reminders.current().await;
            match alarm.task {
                Some(task) if alarm.active => println!("Alarming: {}", describe_task(&task)),
                _ => println!("No active alarm."),
            }
            return;
        }
        WatchInput::Quit => return,
    };

    match outcome {
        Ok(Some(_)) => {}
        Ok(None) => println!("No active alarm."),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_event(event: &AlarmEvent) {
    match event {
        AlarmEvent::Triggered { task } => {
            println!("\nREMINDER: {}", task.title);
            if !task.description.is_empty() {
                println!("  {}", task.description);
            }
            let presets: Vec<String> = SNOOZE_PRESETS_MINUTES
                .iter()
                .map(|m| format!("s {}", m))
                .collect();
            println!("  [d] dismiss  [{}] snooze  [c] complete", presets.join("] ["));
        }
        AlarmEvent::Resolved { task_id, resolution } => match resolution {
            AlarmResolution::Dismissed => println!("Dismissed reminder for {}", task_id),
            AlarmResolution::Snoozed { minutes } => {
                println!("Snoozed {} for {} minutes", task_id, minutes)
            }
            AlarmResolution::Completed => println!("Completed {}", task_id),
        },
    }
}
