//! Repository layer for collection operations
//!
//! Provides CRUD operations for tasks, habits, and goals over the
//! whole-collection JSON store. Every mutation runs load-mutate-save as a
//! single critical section behind one write lock, so the on-disk document
//! always reflects exactly one operation at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;

use super::models::*;
use crate::config::{GOALS_COLLECTION, HABITS_COLLECTION, TASKS_COLLECTION};
use crate::error::{AppError, Result};
use crate::storage::JsonStore;

/// Per-collection id high-water marks.
///
/// New ids are `max(stored ids, highest id issued this process) + 1`, so a
/// delete followed by a create never reissues an id the process has
/// already handed out.
#[derive(Default)]
struct IdCounters {
    tasks: AtomicU64,
    habits: AtomicU64,
    goals: AtomicU64,
}

fn next_id(counter: &AtomicU64, stored_max: u64) -> u64 {
    let id = counter.load(Ordering::Relaxed).max(stored_max) + 1;
    counter.store(id, Ordering::Relaxed);
    id
}

/// Repository for collection operations
#[derive(Clone)]
pub struct Repository {
    store: JsonStore,
    write_lock: Arc<Mutex<()>>,
    ids: Arc<IdCounters>,
}

impl Repository {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
            ids: Arc::new(IdCounters::default()),
        }
    }

    fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        Ok(())
    }

    // ===== Tasks =====

    /// List all tasks in storage order
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.store.load(TASKS_COLLECTION).await
    }

    /// Create a new task
    pub async fn create_task(&self, req: NewTask) -> Result<Task> {
        Self::validate_title(&req.title)?;

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load::<Task>(TASKS_COLLECTION).await;

        let stored_max = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let task = Task {
            id: next_id(&self.ids.tasks, stored_max),
            title: req.title,
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            goal_id: req.goal_id,
            completed: false,
            created_at: Local::now().naive_local(),
            completed_at: None,
        };

        tasks.push(task.clone());
        self.store.save(TASKS_COLLECTION, &tasks).await?;

        tracing::debug!("Created task {}", task.id);
        Ok(task)
    }

    /// Apply a partial update to a task. Absent patch fields are left
    /// untouched.
    pub async fn update_task(&self, id: u64, patch: TaskPatch) -> Result<Task> {
        if let Some(title) = &patch.title {
            Self::validate_title(title)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load::<Task>(TASKS_COLLECTION).await;

        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::TaskNotFound(id))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(goal_id) = patch.goal_id {
            task.goal_id = goal_id;
        }

        let updated = task.clone();
        self.store.save(TASKS_COLLECTION, &tasks).await?;

        tracing::debug!("Updated task {}", id);
        Ok(updated)
    }

    /// Flip a task's completed flag, stamping or clearing `completed_at`
    pub async fn toggle_task(&self, id: u64) -> Result<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load::<Task>(TASKS_COLLECTION).await;

        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::TaskNotFound(id))?;

        task.completed = !task.completed;
        task.completed_at = task.completed.then(|| Local::now().naive_local());

        let updated = task.clone();
        self.store.save(TASKS_COLLECTION, &tasks).await?;

        tracing::debug!("Toggled task {} -> completed={}", id, updated.completed);
        Ok(updated)
    }

    /// Delete a task by id, returning whether a record was removed.
    /// The collection is persisted either way.
    pub async fn delete_task(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.store.load::<Task>(TASKS_COLLECTION).await;

        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() < before;

        self.store.save(TASKS_COLLECTION, &tasks).await?;

        tracing::debug!("Deleted task {} (removed={})", id, removed);
        Ok(removed)
    }

    /// Case-insensitive substring search over title and description
    pub async fn search_tasks(&self, query: &str) -> Vec<Task> {
        let query = query.to_lowercase();
        self.list_tasks()
            .await
            .into_iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&query)
                    || t.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Filter tasks by AND-combined exact-match criteria
    pub async fn filter_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        self.list_tasks()
            .await
            .into_iter()
            .filter(|t| {
                filter.priority.is_none_or(|p| t.priority == p)
                    && filter.completed.is_none_or(|c| t.completed == c)
                    && filter.due_date.is_none_or(|d| t.due_date == Some(d))
                    && filter.goal_id.is_none_or(|g| t.goal_id == Some(g))
            })
            .collect()
    }

    // ===== Habits =====

    /// List all habits in storage order
    pub async fn list_habits(&self) -> Vec<Habit> {
        self.store.load(HABITS_COLLECTION).await
    }

    /// Create a new habit
    pub async fn create_habit(&self, req: NewHabit) -> Result<Habit> {
        Self::validate_title(&req.title)?;

        let _guard = self.write_lock.lock().await;
        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;

        let stored_max = habits.iter().map(|h| h.id).max().unwrap_or(0);
        let habit = Habit {
            id: next_id(&self.ids.habits, stored_max),
            title: req.title,
            description: req.description,
            priority: req.priority,
            frequency: req.frequency,
            check_ins: Vec::new(),
            track_time: req.track_time,
            goal_id: req.goal_id,
            created_at: Local::now().naive_local(),
        };

        habits.push(habit.clone());
        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Created habit {}", habit.id);
        Ok(habit)
    }

    /// Apply a partial update to a habit
    pub async fn update_habit(&self, id: u64, patch: HabitPatch) -> Result<Habit> {
        if let Some(title) = &patch.title {
            Self::validate_title(title)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;

        let habit = habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::HabitNotFound(id))?;

        if let Some(title) = patch.title {
            habit.title = title;
        }
        if let Some(description) = patch.description {
            habit.description = description;
        }
        if let Some(priority) = patch.priority {
            habit.priority = priority;
        }
        if let Some(frequency) = patch.frequency {
            habit.frequency = frequency;
        }
        if let Some(goal_id) = patch.goal_id {
            habit.goal_id = goal_id;
        }
        if let Some(track_time) = patch.track_time {
            habit.track_time = track_time;
        }

        let updated = habit.clone();
        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Updated habit {}", id);
        Ok(updated)
    }

    /// Record a check-in for the given date.
    ///
    /// If the date is already checked in, only `time_spent` is refreshed
    /// (and only when the habit tracks time). The check-in list is kept
    /// sorted by date with at most one record per calendar date.
    pub async fn check_in_habit(
        &self,
        id: u64,
        date: NaiveDate,
        time_spent: Option<u32>,
    ) -> Result<Habit> {
        let _guard = self.write_lock.lock().await;
        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;

        let habit = habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::HabitNotFound(id))?;

        let time_spent = if habit.track_time { time_spent } else { None };

        match habit.check_ins.iter_mut().find(|c| c.date == date) {
            Some(existing) => {
                if time_spent.is_some() {
                    existing.time_spent = time_spent;
                }
            }
            None => {
                habit.check_ins.push(CheckIn { date, time_spent });
                habit.check_ins.sort_by_key(|c| c.date);
            }
        }

        let updated = habit.clone();
        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Checked in habit {} for {}", id, date);
        Ok(updated)
    }

    /// Remove the check-in for the given date. Removing a date that was
    /// never checked in is a no-op that still persists.
    pub async fn uncheck_habit(&self, id: u64, date: NaiveDate) -> Result<Habit> {
        let _guard = self.write_lock.lock().await;
        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;

        let habit = habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(AppError::HabitNotFound(id))?;

        habit.check_ins.retain(|c| c.date != date);

        let updated = habit.clone();
        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Unchecked habit {} for {}", id, date);
        Ok(updated)
    }

    /// Delete a habit by id, returning whether a record was removed
    pub async fn delete_habit(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;

        let before = habits.len();
        habits.retain(|h| h.id != id);
        let removed = habits.len() < before;

        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Deleted habit {} (removed={})", id, removed);
        Ok(removed)
    }

    /// Case-insensitive substring search over title and description
    pub async fn search_habits(&self, query: &str) -> Vec<Habit> {
        let query = query.to_lowercase();
        self.list_habits()
            .await
            .into_iter()
            .filter(|h| {
                h.title.to_lowercase().contains(&query)
                    || h.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Filter habits by AND-combined exact-match criteria
    pub async fn filter_habits(&self, filter: &HabitFilter) -> Vec<Habit> {
        self.list_habits()
            .await
            .into_iter()
            .filter(|h| {
                filter.priority.is_none_or(|p| h.priority == p)
                    && filter.frequency.is_none_or(|f| h.frequency == f)
                    && filter.goal_id.is_none_or(|g| h.goal_id == Some(g))
            })
            .collect()
    }

    // ===== Goals =====

    /// List all goals in storage order
    pub async fn list_goals(&self) -> Vec<Goal> {
        self.store.load(GOALS_COLLECTION).await
    }

    /// Create a new goal
    pub async fn create_goal(&self, req: NewGoal) -> Result<Goal> {
        Self::validate_title(&req.title)?;

        let _guard = self.write_lock.lock().await;
        let mut goals = self.store.load::<Goal>(GOALS_COLLECTION).await;

        let stored_max = goals.iter().map(|g| g.id).max().unwrap_or(0);
        let goal = Goal {
            id: next_id(&self.ids.goals, stored_max),
            title: req.title,
            description: req.description,
            created_at: Local::now().naive_local(),
        };

        goals.push(goal.clone());
        self.store.save(GOALS_COLLECTION, &goals).await?;

        tracing::debug!("Created goal {}", goal.id);
        Ok(goal)
    }

    /// Apply a partial update to a goal
    pub async fn update_goal(&self, id: u64, patch: GoalPatch) -> Result<Goal> {
        if let Some(title) = &patch.title {
            Self::validate_title(title)?;
        }

        let _guard = self.write_lock.lock().await;
        let mut goals = self.store.load::<Goal>(GOALS_COLLECTION).await;

        let goal = goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(AppError::GoalNotFound(id))?;

        if let Some(title) = patch.title {
            goal.title = title;
        }
        if let Some(description) = patch.description {
            goal.description = description;
        }

        let updated = goal.clone();
        self.store.save(GOALS_COLLECTION, &goals).await?;

        tracing::debug!("Updated goal {}", id);
        Ok(updated)
    }

    /// Delete a goal and unlink every task and habit that referenced it.
    /// Linked entities are never cascade-deleted; the unlink happens in
    /// the same critical section as the goal removal.
    pub async fn delete_goal(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut goals = self.store.load::<Goal>(GOALS_COLLECTION).await;

        let before = goals.len();
        goals.retain(|g| g.id != id);
        let removed = goals.len() < before;

        self.store.save(GOALS_COLLECTION, &goals).await?;

        let mut tasks = self.store.load::<Task>(TASKS_COLLECTION).await;
        for task in tasks.iter_mut().filter(|t| t.goal_id == Some(id)) {
            task.goal_id = None;
        }
        self.store.save(TASKS_COLLECTION, &tasks).await?;

        let mut habits = self.store.load::<Habit>(HABITS_COLLECTION).await;
        for habit in habits.iter_mut().filter(|h| h.goal_id == Some(id)) {
            habit.goal_id = None;
        }
        self.store.save(HABITS_COLLECTION, &habits).await?;

        tracing::debug!("Deleted goal {} (removed={})", id, removed);
        Ok(removed)
    }
}
