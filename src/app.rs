//! Application state and initialization
//!
//! Builds the storage, repository, and services once per process and
//! hands them to the outer collaborator (CLI here, any UI shell in
//! general) as one state value.

use std::path::PathBuf;

use crate::config::JOURNAL_DIR;
use crate::data::Repository;
use crate::services::{AnalyticsService, GoalService, HabitService, JournalService, TaskService};
use crate::storage::JsonStore;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub tasks: TaskService,
    pub habits: HabitService,
    pub goals: GoalService,
    pub analytics: AnalyticsService,
    pub journal: JournalService,
}

impl AppState {
    /// Wire up all services over the given data directory.
    /// Nothing touches the filesystem until the first operation runs.
    pub fn new(data_dir: PathBuf) -> Self {
        tracing::info!("Data directory: {:?}", data_dir);

        let store = JsonStore::new(data_dir.clone());
        let repo = Repository::new(store);

        Self {
            tasks: TaskService::new(repo.clone()),
            habits: HabitService::new(repo.clone()),
            goals: GoalService::new(repo.clone()),
            analytics: AnalyticsService::new(repo),
            journal: JournalService::new(data_dir.join(JOURNAL_DIR)),
            data_dir,
        }
    }
}
