//! Tasks service
//!
//! High-level operations for one-off tasks.

use chrono::NaiveDate;

use crate::data::{NewTask, Repository, Task, TaskFilter, TaskPatch};
use crate::error::Result;

/// Service for managing tasks
#[derive(Clone)]
pub struct TaskService {
    repo: Repository,
}

impl TaskService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new task
    pub async fn create(&self, req: NewTask) -> Result<Task> {
        tracing::info!("Creating task: {}", req.title);
        let task = self.repo.create_task(req).await?;
        tracing::info!("Task created: {}", task.id);
        Ok(task)
    }

    /// List all tasks
    pub async fn list(&self) -> Vec<Task> {
        self.repo.list_tasks().await
    }

    /// Apply a partial update
    pub async fn update(&self, id: u64, patch: TaskPatch) -> Result<Task> {
        tracing::debug!("Updating task: {}", id);
        self.repo.update_task(id, patch).await
    }

    /// Flip completion state
    pub async fn toggle(&self, id: u64) -> Result<Task> {
        tracing::debug!("Toggling task: {}", id);
        self.repo.toggle_task(id).await
    }

    /// Delete a task, reporting whether it existed
    pub async fn delete(&self, id: u64) -> Result<bool> {
        tracing::info!("Deleting task: {}", id);
        self.repo.delete_task(id).await
    }

    /// Search by title or description
    pub async fn search(&self, query: &str) -> Vec<Task> {
        self.repo.search_tasks(query).await
    }

    /// Filter by AND-combined criteria
    pub async fn filter(&self, filter: &TaskFilter) -> Vec<Task> {
        self.repo.filter_tasks(filter).await
    }

    /// Incomplete tasks due strictly before `today`
    pub async fn overdue(&self, today: NaiveDate) -> Vec<Task> {
        self.list()
            .await
            .into_iter()
            .filter(|t| !t.completed && t.due_date.is_some_and(|d| d < today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    fn create_test_service() -> (TaskService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::new(temp_dir.path().join("data"));
        (TaskService::new(Repository::new(store)), temp_dir)
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (service, _temp) = create_test_service();

        let task = service
            .create(NewTask {
                title: "Write report".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tasks = service.list().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
    }

    #[tokio::test]
    async fn test_overdue_skips_completed() {
        let (service, _temp) = create_test_service();

        let today: NaiveDate = "2024-06-10".parse().unwrap();
        let past = service
            .create(NewTask {
                title: "Late".to_string(),
                due_date: Some("2024-06-01".parse().unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        let done = service
            .create(NewTask {
                title: "Late but done".to_string(),
                due_date: Some("2024-06-01".parse().unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        service.toggle(done.id).await.unwrap();
        service
            .create(NewTask {
                title: "Due today".to_string(),
                due_date: Some(today),
                ..Default::default()
            })
            .await
            .unwrap();

        let overdue = service.overdue(today).await;
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, past.id);
    }
}
