// trackdesk - single-user desktop habit and task tracker
// CLI entry point; every command prints its result as JSON.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackdesk::app::AppState;
use trackdesk::config;
use trackdesk::data::{
    Frequency, GoalPatch, HabitFilter, HabitPatch, NewGoal, NewHabit, NewTask, Priority,
    TaskFilter, TaskPatch,
};
use trackdesk::services::analytics::TrendBucket;

#[derive(Parser)]
#[command(name = "trackdesk", about = "Single-user habit and task tracker")]
struct Cli {
    /// Data directory (defaults to the platform application-data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage one-off tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage recurring habits
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Manage goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Full analytics document
    Stats,
    /// Time-tracking rollups
    Time {
        #[command(subcommand)]
        command: TimeCommands,
    },
    /// Journal entries
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Create a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "Next")]
        priority: Priority,
        #[arg(long)]
        due_date: Option<NaiveDate>,
        #[arg(long)]
        goal: Option<u64>,
    },
    /// List all tasks
    List,
    /// Update fields of a task; omitted flags are left untouched
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due_date")]
        due_date: Option<NaiveDate>,
        #[arg(long)]
        clear_due_date: bool,
        #[arg(long, conflicts_with = "clear_goal")]
        goal: Option<u64>,
        #[arg(long)]
        clear_goal: bool,
    },
    /// Toggle completion
    Done { id: u64 },
    /// Delete a task
    Rm { id: u64 },
    /// Search title and description
    Search { query: String },
    /// Filter by exact-match criteria
    Filter {
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long)]
        due_date: Option<NaiveDate>,
        #[arg(long)]
        goal: Option<u64>,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Create a habit
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "Next")]
        priority: Priority,
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        #[arg(long)]
        goal: Option<u64>,
        #[arg(long)]
        track_time: bool,
    },
    /// List all habits
    List,
    /// Update fields of a habit; omitted flags are left untouched
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        frequency: Option<Frequency>,
        #[arg(long, conflicts_with = "clear_goal")]
        goal: Option<u64>,
        #[arg(long)]
        clear_goal: bool,
        #[arg(long)]
        track_time: Option<bool>,
    },
    /// Check in for a date (defaults to today)
    Check {
        id: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Remove the check-in for a date (defaults to today)
    Uncheck {
        id: u64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Current streak as of a date (defaults to today)
    Streak {
        id: u64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Recent check-in history ending at a date (defaults to today)
    History {
        id: u64,
        #[arg(long, default_value_t = config::DEFAULT_HISTORY_DAYS)]
        days: u32,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Delete a habit
    Rm { id: u64 },
    /// Search title and description
    Search { query: String },
    /// Filter by exact-match criteria
    Filter {
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        frequency: Option<Frequency>,
        #[arg(long)]
        goal: Option<u64>,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Create a goal
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all goals
    List,
    /// Update fields of a goal
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a goal, unlinking its tasks and habits
    Rm { id: u64 },
    /// Progress rollup as of a date (defaults to today)
    Progress {
        id: u64,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum TimeCommands {
    /// Total tracked minutes by habit and goal
    Summary,
    /// Tracked-minutes trend over a trailing period
    Trend {
        #[arg(long, default_value = "day")]
        bucket: TrendBucket,
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Write a journal entry
    Add {
        content: String,
        #[arg(long, default_value_t = 0)]
        duration_seconds: u64,
        #[arg(long)]
        continued: bool,
    },
    /// List recent entries, newest first
    List {
        #[arg(long, default_value_t = config::DEFAULT_JOURNAL_DAYS)]
        days: i64,
        /// Ignore the day window and list everything
        #[arg(long)]
        all: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackdesk=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    let state = AppState::new(data_dir);

    let today = Local::now().date_naive();
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Task { command } => match command {
            TaskCommands::Add {
                title,
                description,
                priority,
                due_date,
                goal,
            } => {
                let task = state
                    .tasks
                    .create(NewTask {
                        title,
                        description,
                        priority,
                        due_date,
                        goal_id: goal,
                    })
                    .await?;
                print_json(&task)?;
            }
            TaskCommands::List => print_json(&state.tasks.list().await)?,
            TaskCommands::Update {
                id,
                title,
                description,
                priority,
                due_date,
                clear_due_date,
                goal,
                clear_goal,
            } => {
                let patch = TaskPatch {
                    title,
                    description,
                    priority,
                    due_date: patch_field(due_date, clear_due_date),
                    goal_id: patch_field(goal, clear_goal),
                };
                print_json(&state.tasks.update(id, patch).await?)?;
            }
            TaskCommands::Done { id } => print_json(&state.tasks.toggle(id).await?)?,
            TaskCommands::Rm { id } => {
                let deleted = state.tasks.delete(id).await?;
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            }
            TaskCommands::Search { query } => print_json(&state.tasks.search(&query).await)?,
            TaskCommands::Filter {
                priority,
                completed,
                due_date,
                goal,
            } => {
                let filter = TaskFilter {
                    priority,
                    completed,
                    due_date,
                    goal_id: goal,
                };
                print_json(&state.tasks.filter(&filter).await)?;
            }
        },
        Commands::Habit { command } => match command {
            HabitCommands::Add {
                title,
                description,
                priority,
                frequency,
                goal,
                track_time,
            } => {
                let habit = state
                    .habits
                    .create(NewHabit {
                        title,
                        description,
                        priority,
                        frequency,
                        goal_id: goal,
                        track_time,
                    })
                    .await?;
                print_json(&habit)?;
            }
            HabitCommands::List => print_json(&state.habits.list().await)?,
            HabitCommands::Update {
                id,
                title,
                description,
                priority,
                frequency,
                goal,
                clear_goal,
                track_time,
            } => {
                let patch = HabitPatch {
                    title,
                    description,
                    priority,
                    frequency,
                    goal_id: patch_field(goal, clear_goal),
                    track_time,
                };
                print_json(&state.habits.update(id, patch).await?)?;
            }
            HabitCommands::Check { id, date, minutes } => {
                let habit = state
                    .habits
                    .check_in(id, date.unwrap_or(today), minutes)
                    .await?;
                print_json(&habit)?;
            }
            HabitCommands::Uncheck { id, date } => {
                print_json(&state.habits.uncheck(id, date.unwrap_or(today)).await?)?;
            }
            HabitCommands::Streak { id, as_of } => {
                let streak = state.habits.streak(id, as_of.unwrap_or(today)).await;
                print_json(&serde_json::json!({ "streak": streak }))?;
            }
            HabitCommands::History { id, days, as_of } => {
                let history = state.habits.history(id, days, as_of.unwrap_or(today)).await;
                print_json(&history)?;
            }
            HabitCommands::Rm { id } => {
                let deleted = state.habits.delete(id).await?;
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            }
            HabitCommands::Search { query } => print_json(&state.habits.search(&query).await)?,
            HabitCommands::Filter {
                priority,
                frequency,
                goal,
            } => {
                let filter = HabitFilter {
                    priority,
                    frequency,
                    goal_id: goal,
                };
                print_json(&state.habits.filter(&filter).await)?;
            }
        },
        Commands::Goal { command } => match command {
            GoalCommands::Add { title, description } => {
                print_json(&state.goals.create(NewGoal { title, description }).await?)?;
            }
            GoalCommands::List => print_json(&state.goals.list().await)?,
            GoalCommands::Update {
                id,
                title,
                description,
            } => {
                print_json(&state.goals.update(id, GoalPatch { title, description }).await?)?;
            }
            GoalCommands::Rm { id } => {
                let deleted = state.goals.delete(id).await?;
                print_json(&serde_json::json!({ "deleted": deleted }))?;
            }
            GoalCommands::Progress { id, as_of } => {
                print_json(&state.goals.progress(id, as_of.unwrap_or(today)).await)?;
            }
        },
        Commands::Stats => print_json(&state.analytics.analytics(now).await)?,
        Commands::Time { command } => match command {
            TimeCommands::Summary => print_json(&state.analytics.time_summary().await)?,
            TimeCommands::Trend {
                bucket,
                days,
                as_of,
            } => {
                let trend = state
                    .analytics
                    .time_trend(bucket, days, as_of.unwrap_or(today))
                    .await;
                print_json(&trend)?;
            }
        },
        Commands::Journal { command } => match command {
            JournalCommands::Add {
                content,
                duration_seconds,
                continued,
            } => {
                let entry = state
                    .journal
                    .add_entry(content, duration_seconds, continued, now)
                    .await?;
                print_json(&entry)?;
            }
            JournalCommands::List { days, all } => {
                let entries = if all {
                    state.journal.all_entries().await?
                } else {
                    state.journal.recent_entries(days, now).await?
                };
                print_json(&entries)?;
            }
        },
    }

    Ok(())
}

/// Fold a set-value flag and a clear flag into one patch field:
/// `None` leaves the field untouched, `Some(None)` clears it.
fn patch_field<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}
