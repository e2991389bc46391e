//! Habits service
//!
//! High-level operations for recurring habits: CRUD, daily check-ins,
//! and the streak/history views built on them.

use chrono::NaiveDate;

use super::streaks::{self, DayRecord};
use crate::data::{Habit, HabitFilter, HabitPatch, NewHabit, Repository};
use crate::error::Result;

/// Service for managing habits
#[derive(Clone)]
pub struct HabitService {
    repo: Repository,
}

impl HabitService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new habit
    pub async fn create(&self, req: NewHabit) -> Result<Habit> {
        tracing::info!("Creating habit: {}", req.title);
        let habit = self.repo.create_habit(req).await?;
        tracing::info!("Habit created: {}", habit.id);
        Ok(habit)
    }

    /// List all habits
    pub async fn list(&self) -> Vec<Habit> {
        self.repo.list_habits().await
    }

    /// Apply a partial update
    pub async fn update(&self, id: u64, patch: HabitPatch) -> Result<Habit> {
        tracing::debug!("Updating habit: {}", id);
        self.repo.update_habit(id, patch).await
    }

    /// Check in for a date, optionally recording minutes spent
    pub async fn check_in(
        &self,
        id: u64,
        date: NaiveDate,
        time_spent: Option<u32>,
    ) -> Result<Habit> {
        tracing::debug!("Check-in for habit {} on {}", id, date);
        self.repo.check_in_habit(id, date, time_spent).await
    }

    /// Remove the check-in for a date
    pub async fn uncheck(&self, id: u64, date: NaiveDate) -> Result<Habit> {
        tracing::debug!("Uncheck habit {} on {}", id, date);
        self.repo.uncheck_habit(id, date).await
    }

    /// Delete a habit, reporting whether it existed
    pub async fn delete(&self, id: u64) -> Result<bool> {
        tracing::info!("Deleting habit: {}", id);
        self.repo.delete_habit(id).await
    }

    /// Search by title or description
    pub async fn search(&self, query: &str) -> Vec<Habit> {
        self.repo.search_habits(query).await
    }

    /// Filter by AND-combined criteria
    pub async fn filter(&self, filter: &HabitFilter) -> Vec<Habit> {
        self.repo.filter_habits(filter).await
    }

    /// Current streak as of the given date. An unknown habit id has no
    /// run to count, so it reports 0 rather than an error.
    pub async fn streak(&self, id: u64, as_of: NaiveDate) -> u32 {
        match self.find(id).await {
            Some(habit) => streaks::streak(&habit.check_ins, as_of),
            None => 0,
        }
    }

    /// Fixed-length recent history ending at `as_of`, oldest first.
    /// Empty for an unknown habit id.
    pub async fn history(&self, id: u64, window_days: u32, as_of: NaiveDate) -> Vec<DayRecord> {
        match self.find(id).await {
            Some(habit) => streaks::recent_history(&habit, window_days, as_of),
            None => Vec::new(),
        }
    }

    async fn find(&self, id: u64) -> Option<Habit> {
        self.list().await.into_iter().find(|h| h.id == id)
    }
}
