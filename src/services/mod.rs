//! Domain services. Each public operation runs in exactly one store transaction.

pub mod assignment;
pub mod employees;
pub mod projects;
pub mod tasks;

use crate::error::AppError;
use crate::models::{Employee, EmployeeView, Project, ProjectView};
use crate::store::StoreTx;

pub use assignment::AssignmentManager;
pub use employees::EmployeeService;
pub use projects::ProjectService;
pub use tasks::TaskService;

/// Builds the response view of an employee, memberships included.
pub(crate) async fn employee_view(
    tx: &mut dyn StoreTx,
    employee: Employee,
) -> Result<EmployeeView, AppError> {
    let projects = tx.projects_of(employee.id).await?;
    Ok(EmployeeView::new(employee, projects))
}

pub(crate) async fn project_view(
    tx: &mut dyn StoreTx,
    project: Project,
) -> Result<ProjectView, AppError> {
    let employee_ids = tx
        .members_of(project.id)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();
    Ok(ProjectView::new(project, employee_ids))
}
