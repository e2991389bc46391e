//! Application configuration constants
//!
//! Central location for configuration constants, aggregation windows,
//! and storage layout used throughout the application.

use std::path::PathBuf;

// ===== Storage Layout =====

/// File name (without extension) of the task collection
pub const TASKS_COLLECTION: &str = "tasks";
/// File name (without extension) of the habit collection
pub const HABITS_COLLECTION: &str = "habits";
/// File name (without extension) of the goal collection
pub const GOALS_COLLECTION: &str = "goals";

/// Subdirectory of the data directory holding journal entries
pub const JOURNAL_DIR: &str = "Journal";

// ===== Aggregation Windows =====

/// Number of calendar days covered by a habit's recent-history window
pub const DEFAULT_HISTORY_DAYS: u32 = 7;

/// A task counts as "due soon" when its due date falls within this many days
pub const DUE_SOON_DAYS: i64 = 7;

/// Default look-back window for listing journal entries, in days
pub const DEFAULT_JOURNAL_DAYS: i64 = 30;

// ===== Productivity Insights =====

/// Minimum number of linked tasks before a goal is eligible to be
/// reported as "most productive". Tiny samples make the percentage
/// meaningless (one completed task reads as 100%).
pub const MIN_GOAL_SAMPLE: usize = 3;

/// Maximum number of goals reported in the task-distribution breakdown
pub const DISTRIBUTION_TOP_N: usize = 5;

// ===== Data Directory =====

/// Resolve the default data directory for persistent storage.
///
/// Uses the platform application-data location (Application Support on
/// macOS, AppData on Windows, XDG data dir on Linux) so data survives
/// app rebuilds. Falls back to `./trackdesk-data` when no home directory
/// can be determined.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "trackdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("trackdesk-data"))
}
