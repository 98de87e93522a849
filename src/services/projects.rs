use std::sync::Arc;

use uuid::Uuid;

use super::{employee_view, project_view};
use crate::error::AppError;
use crate::models::{EmployeeView, Project, ProjectInput, ProjectQuery, ProjectView, Task};
use crate::store::{ProjectFilter, Store, TaskFilter};

pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: ProjectInput) -> Result<ProjectView, AppError> {
        let project = Project::new(input.name);

        let mut tx = self.store.begin().await?;
        tx.insert_project(&project).await?;
        tx.commit().await?;

        log::info!("Created project {} ({})", project.id, project.name);
        Ok(ProjectView::new(project, Vec::new()))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProjectView, AppError> {
        log::debug!("Fetching project {}", id);
        let mut tx = self.store.begin().await?;
        let project = tx
            .find_project(id)
            .await?
            .ok_or(AppError::ProjectNotFound(id))?;
        project_view(tx.as_mut(), project).await
    }

    /// Projects ordered by name, optionally only those with exactly `query.name`.
    pub async fn list(&self, query: ProjectQuery) -> Result<Vec<ProjectView>, AppError> {
        let filter = ProjectFilter { name: query.name };
        let mut tx = self.store.begin().await?;
        let projects = tx.list_projects(&filter).await?;
        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            views.push(project_view(tx.as_mut(), project).await?);
        }
        Ok(views)
    }

    pub async fn update(&self, id: Uuid, input: ProjectInput) -> Result<ProjectView, AppError> {
        let mut tx = self.store.begin().await?;
        let mut project = tx
            .lock_project(id)
            .await?
            .ok_or(AppError::ProjectNotFound(id))?;
        project.name = input.name;
        tx.update_project(&project).await?;

        let view = project_view(tx.as_mut(), project).await?;
        tx.commit().await?;

        log::info!("Renamed project {}", id);
        Ok(view)
    }

    /// Deletes the project together with its tasks and memberships.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        // Project before its tasks, the order task updates lock in.
        if tx.lock_project(id).await?.is_none() {
            return Err(AppError::ProjectNotFound(id));
        }
        tx.delete_project(id).await?;
        tx.commit().await?;

        log::info!("Deleted project {}", id);
        Ok(())
    }

    pub async fn members(&self, id: Uuid) -> Result<Vec<EmployeeView>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_project(id).await?.is_none() {
            return Err(AppError::ProjectNotFound(id));
        }
        let members = tx.members_of(id).await?;
        let mut views = Vec::with_capacity(members.len());
        for employee in members {
            views.push(employee_view(tx.as_mut(), employee).await?);
        }
        Ok(views)
    }

    pub async fn tasks_of(&self, id: Uuid) -> Result<Vec<Task>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_project(id).await?.is_none() {
            return Err(AppError::ProjectNotFound(id));
        }
        tx.list_tasks(&TaskFilter::for_project(id)).await
    }
}
