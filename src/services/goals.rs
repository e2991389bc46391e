//! Goals service
//!
//! Goal CRUD plus the progress rollup over linked tasks and habits.
//! Deleting a goal unlinks its entities; the repository guarantees that
//! happens in the same critical section as the removal.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{Goal, GoalPatch, Habit, NewGoal, Repository, Task};
use crate::error::Result;

/// Progress rollup for one goal.
///
/// A task counts as completed via its terminal flag; a habit counts as
/// completed when it is checked in on the reference date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoalProgress {
    pub total: usize,
    pub completed: usize,
    pub percentage: f64,
    pub tasks_total: usize,
    pub tasks_completed: usize,
    pub habits_total: usize,
    pub habits_completed: usize,
}

/// Service for managing goals
#[derive(Clone)]
pub struct GoalService {
    repo: Repository,
}

impl GoalService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new goal
    pub async fn create(&self, req: NewGoal) -> Result<Goal> {
        tracing::info!("Creating goal: {}", req.title);
        let goal = self.repo.create_goal(req).await?;
        tracing::info!("Goal created: {}", goal.id);
        Ok(goal)
    }

    /// List all goals
    pub async fn list(&self) -> Vec<Goal> {
        self.repo.list_goals().await
    }

    /// Apply a partial update
    pub async fn update(&self, id: u64, patch: GoalPatch) -> Result<Goal> {
        tracing::debug!("Updating goal: {}", id);
        self.repo.update_goal(id, patch).await
    }

    /// Delete a goal and unlink its tasks and habits
    pub async fn delete(&self, id: u64) -> Result<bool> {
        tracing::info!("Deleting goal: {}", id);
        self.repo.delete_goal(id).await
    }

    /// Progress for a goal as of the given date. A goal with no linked
    /// entities (or an unknown id) reports the zero rollup, not an error.
    pub async fn progress(&self, goal_id: u64, as_of: NaiveDate) -> GoalProgress {
        let tasks = self.repo.list_tasks().await;
        let habits = self.repo.list_habits().await;
        compute_progress(goal_id, &tasks, &habits, as_of)
    }
}

/// Pure progress computation over already-loaded collections
pub fn compute_progress(
    goal_id: u64,
    tasks: &[Task],
    habits: &[Habit],
    as_of: NaiveDate,
) -> GoalProgress {
    let goal_tasks: Vec<&Task> = tasks.iter().filter(|t| t.goal_id == Some(goal_id)).collect();
    let goal_habits: Vec<&Habit> = habits
        .iter()
        .filter(|h| h.goal_id == Some(goal_id))
        .collect();

    let tasks_total = goal_tasks.len();
    let tasks_completed = goal_tasks.iter().filter(|t| t.completed).count();
    let habits_total = goal_habits.len();
    let habits_completed = goal_habits.iter().filter(|h| h.checked_on(as_of)).count();

    let total = tasks_total + habits_total;
    let completed = tasks_completed + habits_completed;
    let percentage = if total > 0 {
        round2(completed as f64 / total as f64 * 100.0)
    } else {
        0.0
    };

    GoalProgress {
        total,
        completed,
        percentage,
        tasks_total,
        tasks_completed,
        habits_total,
        habits_completed,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
