//! Membership of employees in projects, and assignment of tasks to employees.
//!
//! Membership is a single `(employee, project)` record, so the employee's
//! project list and the project's member list can never disagree. Every
//! operation locks the rows it touches, employee first, and commits once at
//! the end; an error anywhere drops the transaction unapplied.

use std::sync::Arc;

use uuid::Uuid;

use super::employee_view;
use crate::error::{AppError, EmployeeKey};
use crate::models::{EmployeeView, Task};
use crate::store::Store;

pub struct AssignmentManager {
    store: Arc<dyn Store>,
}

impl AssignmentManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Makes the employee a member of the project. Already a member is a no-op.
    pub async fn assign_project(
        &self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<EmployeeView, AppError> {
        let mut tx = self.store.begin().await?;
        let employee = tx
            .lock_employee(employee_id)
            .await?
            .ok_or(AppError::EmployeeNotFound(EmployeeKey::Id(employee_id)))?;
        tx.lock_project(project_id)
            .await?
            .ok_or(AppError::ProjectNotFound(project_id))?;

        if tx.insert_membership(employee_id, project_id).await? {
            log::info!("Assigned employee {} to project {}", employee_id, project_id);
        }

        let view = employee_view(tx.as_mut(), employee).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Removes the employee from the project. Not a member is a no-op.
    pub async fn unassign_project(
        &self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<EmployeeView, AppError> {
        let mut tx = self.store.begin().await?;
        let employee = tx
            .lock_employee(employee_id)
            .await?
            .ok_or(AppError::EmployeeNotFound(EmployeeKey::Id(employee_id)))?;
        tx.lock_project(project_id)
            .await?
            .ok_or(AppError::ProjectNotFound(project_id))?;

        if tx.delete_membership(employee_id, project_id).await? {
            log::info!(
                "Unassigned employee {} from project {}",
                employee_id,
                project_id
            );
        }

        let view = employee_view(tx.as_mut(), employee).await?;
        tx.commit().await?;
        Ok(view)
    }

    /// Assigns the task to the employee, replacing any previous assignee.
    pub async fn assign_task(&self, task_id: Uuid, employee_id: Uuid) -> Result<Task, AppError> {
        let mut tx = self.store.begin().await?;
        tx.lock_employee(employee_id)
            .await?
            .ok_or(AppError::EmployeeNotFound(EmployeeKey::Id(employee_id)))?;
        let mut task = tx
            .lock_task(task_id)
            .await?
            .ok_or(AppError::TaskNotFound(task_id))?;

        task.employee_id = Some(employee_id);
        task.touch();
        tx.update_task(&task).await?;
        tx.commit().await?;

        log::info!("Assigned task {} to employee {}", task_id, employee_id);
        Ok(task)
    }

    /// Clears the task's assignee.
    pub async fn unassign_task(&self, task_id: Uuid) -> Result<Task, AppError> {
        let mut tx = self.store.begin().await?;
        let mut task = tx
            .lock_task(task_id)
            .await?
            .ok_or(AppError::TaskNotFound(task_id))?;

        task.employee_id = None;
        task.touch();
        tx.update_task(&task).await?;
        tx.commit().await?;

        log::info!("Unassigned task {}", task_id);
        Ok(task)
    }
}
