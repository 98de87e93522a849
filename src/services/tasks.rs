use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskQuery};
use crate::store::{Store, TaskFilter};

pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates an unassigned task in an existing project.
    pub async fn create(&self, input: TaskInput) -> Result<Task, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.lock_project(input.project_id).await?.is_none() {
            return Err(AppError::ProjectNotFound(input.project_id));
        }

        let task = Task::new(
            input.description,
            input.status.unwrap_or_default(),
            input.project_id,
        );
        tx.insert_task(&task).await?;
        tx.commit().await?;

        log::info!("Created task {} in project {}", task.id, task.project_id);
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> Result<Task, AppError> {
        log::debug!("Fetching task {}", id);
        let mut tx = self.store.begin().await?;
        tx.find_task(id).await?.ok_or(AppError::TaskNotFound(id))
    }

    pub async fn list(&self, query: TaskQuery) -> Result<Vec<Task>, AppError> {
        let filter = TaskFilter {
            status: query.status,
            unassigned: query.unassigned.unwrap_or(false),
            description: query.description,
            ..TaskFilter::default()
        };
        let mut tx = self.store.begin().await?;
        tx.list_tasks(&filter).await
    }

    /// Replaces description and project, and the status when one is given.
    /// The assignee is managed through [`AssignmentManager`](super::AssignmentManager).
    pub async fn update(&self, id: Uuid, input: TaskInput) -> Result<Task, AppError> {
        let mut tx = self.store.begin().await?;
        let current = tx.find_task(id).await?.ok_or(AppError::TaskNotFound(id))?;

        // Projects before the task, lower id first.
        let mut projects = vec![current.project_id, input.project_id];
        projects.sort();
        projects.dedup();
        for project_id in projects {
            let found = tx.lock_project(project_id).await?.is_some();
            if !found && project_id == input.project_id {
                return Err(AppError::ProjectNotFound(input.project_id));
            }
        }
        let mut task = tx.lock_task(id).await?.ok_or(AppError::TaskNotFound(id))?;

        task.description = input.description;
        task.project_id = input.project_id;
        if let Some(status) = input.status {
            task.status = status;
        }
        task.touch();
        tx.update_task(&task).await?;
        tx.commit().await?;

        log::info!("Updated task {}", id);
        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_task(id).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tx.commit().await?;

        log::info!("Deleted task {}", id);
        Ok(())
    }
}
