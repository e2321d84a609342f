// TaskFlow - Personal task manager with due-date alarms
// Entry point and command-line dispatch

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskflow::app::{self, AppState, Collaborators};
use taskflow::commands::{self, describe_task};
use taskflow::config::ALARM_CHECK_INTERVAL_SECS;
use taskflow::models::{Priority, Task, TaskFilter, TaskSort, TaskUpdate};

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(version, about = "Personal task manager with due-date alarms")]
struct Cli {
    /// Directory holding persisted tasks and theme
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Never show system notifications for alarms
    #[arg(long, global = true)]
    no_notify: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// RFC 3339, "YYYY-MM-DD HH:MM", "now" or "+30m"/"+2h"/"+1d"
        #[arg(long, value_parser = parse_due_arg)]
        due: Option<DateTime<Utc>>,
        /// Checklist step (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Ask the assistant to suggest steps
        #[arg(long)]
        breakdown: bool,
    },
    /// List tasks
    List {
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
        #[arg(short, long, default_value = "date")]
        sort: TaskSort,
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its steps
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_due_arg)]
        due: Option<DateTime<Utc>>,
        /// Replace the checklist (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    /// Toggle completion
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Remove a checklist step (1-based)
    RemoveStep { id: String, step: usize },
    /// Let the assistant break a task into steps
    Breakdown { id: String },
    /// Motivational summary of pending tasks
    Summary,
    /// Task counters
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show or change the theme
    Theme {
        #[arg(long, conflicts_with_all = ["light", "toggle"])]
        dark: bool,
        #[arg(long, conflicts_with = "toggle")]
        light: bool,
        #[arg(long)]
        toggle: bool,
        #[arg(long)]
        accent: Option<String>,
    },
    /// Watch for due tasks and raise alarms
    Watch {
        /// Seconds between checks
        #[arg(short, long, default_value_t = ALARM_CHECK_INTERVAL_SECS)]
        interval: u64,
    },
    /// Version and data location
    Info,
}

fn parse_due_arg(s: &str) -> Result<DateTime<Utc>, String> {
    commands::parse_due_date(s, Utc::now()).map_err(|e| e.to_string())
}

/// Initialize tracing on stderr so stdout stays clean for output
fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Commands::Watch { .. } => "taskflow=info,warn",
        _ => "taskflow=warn",
    };
    init_tracing(default_filter);

    let data_dir = app::resolve_data_dir(cli.data_dir)?;
    let state = app::setup(data_dir, Collaborators::terminal(!cli.no_notify)).await?;

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Add {
            title,
            description,
            priority,
            due,
            steps,
            breakdown,
        } => {
            let mut task =
                commands::create_task(state, title, description, priority, due, steps).await?;
            if breakdown {
                task = commands::breakdown_task(state, &task.id).await?;
            }
            println!("Created {}", describe_task(&task));
        }
        Commands::List { filter, sort, json } => {
            let tasks = commands::list_tasks(state, filter, sort).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("Nothing on your plate right now.");
            } else {
                for task in &tasks {
                    println!("{}", describe_task(task));
                }
            }
        }
        Commands::Show { id, json } => {
            let id = commands::resolve_task_id(state, &id).await?;
            let task = commands::get_task(state, &id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print_task_details(&task);
            }
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            due,
            steps,
        } => {
            let id = commands::resolve_task_id(state, &id).await?;
            let update = TaskUpdate {
                title,
                description,
                priority,
                due_date: due,
                sub_tasks: (!steps.is_empty()).then_some(steps),
                ..Default::default()
            };
            let task = commands::update_task(state, &id, update).await?;
            println!("Updated {}", describe_task(&task));
        }
        Commands::Toggle { id } => {
            let id = commands::resolve_task_id(state, &id).await?;
            let task = commands::toggle_task(state, &id).await?;
            println!("{}", describe_task(&task));
        }
        Commands::Delete { id } => {
            let id = commands::resolve_task_id(state, &id).await?;
            commands::delete_task(state, &id).await?;
            println!("Deleted {}", commands::short_id(&id));
        }
        Commands::RemoveStep { id, step } => {
            let id = commands::resolve_task_id(state, &id).await?;
            let index = step
                .checked_sub(1)
                .ok_or_else(|| anyhow::anyhow!("Steps are numbered from 1"))?;
            let task = commands::remove_task_step(state, &id, index).await?;
            print_task_details(&task);
        }
        Commands::Breakdown { id } => {
            if !state.assistant_service.is_enabled() {
                eprintln!("Assistant disabled: set GEMINI_API_KEY to enable it.");
            }
            let id = commands::resolve_task_id(state, &id).await?;
            let task = commands::breakdown_task(state, &id).await?;
            print_task_details(&task);
        }
        Commands::Summary => {
            println!("{}", commands::get_daily_summary(state).await);
        }
        Commands::Stats { json } => {
            let stats = commands::get_stats(state).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{}/{} done ({}%), {} pending, {} overdue",
                    stats.completed,
                    stats.total,
                    stats.completion_percent,
                    stats.pending,
                    stats.overdue
                );
                if stats.overdue > 0 {
                    println!(
                        "You have {} tasks past due date. They should be your focus.",
                        stats.overdue
                    );
                }
            }
        }
        Commands::Theme {
            dark,
            light,
            toggle,
            accent,
        } => {
            let theme = if toggle {
                let theme = commands::toggle_dark_mode(state).await?;
                match accent {
                    Some(accent) => commands::update_theme(state, None, Some(accent)).await?,
                    None => theme,
                }
            } else {
                let dark_mode = match (dark, light) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                commands::update_theme(state, dark_mode, accent).await?
            };
            println!("{}", serde_json::to_string_pretty(&theme)?);
        }
        Commands::Watch { interval } => {
            commands::run_watch(state, Duration::from_secs(interval)).await?;
        }
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&commands::get_app_info(state))?);
        }
    }

    Ok(())
}

fn print_task_details(task: &Task) {
    println!("{}", describe_task(task));
    println!("  id:       {}", task.id);
    if !task.description.is_empty() {
        println!("  details:  {}", task.description);
    }
    println!("  created:  {}", task.created_at.to_rfc3339());
    println!("  reminder: {}", if task.reminder_sent { "acknowledged" } else { "armed" });
    for (i, step) in task.sub_tasks.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}
