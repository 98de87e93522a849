//! Persistence ports.
//!
//! Every service call runs inside exactly one [`StoreTx`]. A transaction that is
//! dropped without [`StoreTx::commit`] is rolled back, so an early return through
//! `?` never leaves partial state behind.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Employee, Position, Project, Task, TaskStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Filters applied when listing employees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Whole name, ignoring case.
    pub name: Option<String>,
    pub position: Option<Position>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        self.name
            .as_ref()
            .map_or(true, |n| employee.name.to_lowercase() == n.to_lowercase())
            && self.position.map_or(true, |p| employee.position == p)
    }
}

/// Filters applied when listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub name: Option<String>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        self.name.as_ref().map_or(true, |n| project.name == *n)
    }
}

/// Filters applied when listing tasks. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub employee_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Only tasks without an employee.
    pub unassigned: bool,
    pub description: Option<String>,
}

impl TaskFilter {
    pub fn for_employee(employee_id: Uuid) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Self::default()
        }
    }

    pub fn for_project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.employee_id.map_or(true, |e| task.employee_id == Some(e))
            && self.project_id.map_or(true, |p| task.project_id == p)
            && (!self.unassigned || task.employee_id.is_none())
            && self.description.as_ref().map_or(true, |d| task.description == *d)
    }
}

/// Entry point to a backing store.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

/// One unit of work against the store.
///
/// `lock_*` methods behave like their `find_*` counterparts but also hold the
/// row against concurrent writers until the transaction ends.
#[async_trait]
pub trait StoreTx: Send {
    async fn find_employee(&mut self, id: Uuid) -> Result<Option<Employee>, AppError>;

    async fn lock_employee(&mut self, id: Uuid) -> Result<Option<Employee>, AppError> {
        self.find_employee(id).await
    }

    /// `email` must already be normalized.
    async fn find_employee_by_email(&mut self, email: &str)
        -> Result<Option<Employee>, AppError>;

    /// Sorted by name, then id.
    async fn list_employees(&mut self, filter: &EmployeeFilter)
        -> Result<Vec<Employee>, AppError>;

    /// Fails with `EmployeeExists` if the email is taken.
    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), AppError>;

    async fn update_employee(&mut self, employee: &Employee) -> Result<(), AppError>;

    /// Removes the employee and its memberships, and unassigns its tasks.
    /// Returns false if there was no such employee.
    async fn delete_employee(&mut self, id: Uuid) -> Result<bool, AppError>;

    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError>;

    async fn lock_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        self.find_project(id).await
    }

    /// Sorted by name, then id.
    async fn list_projects(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError>;

    async fn insert_project(&mut self, project: &Project) -> Result<(), AppError>;

    async fn update_project(&mut self, project: &Project) -> Result<(), AppError>;

    /// Removes the project, its tasks and its memberships.
    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError>;

    /// Projects the employee is a member of, sorted by name.
    async fn projects_of(&mut self, employee_id: Uuid) -> Result<Vec<Project>, AppError>;

    /// Employees that are members of the project, sorted by name.
    async fn members_of(&mut self, project_id: Uuid) -> Result<Vec<Employee>, AppError>;

    /// Returns false if the membership already existed.
    async fn insert_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError>;

    /// Returns false if there was nothing to remove.
    async fn delete_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError>;

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn lock_task(&mut self, id: Uuid) -> Result<Option<Task>, AppError> {
        self.find_task(id).await
    }

    /// Sorted by creation time, then id.
    async fn list_tasks(&mut self, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    async fn insert_task(&mut self, task: &Task) -> Result<(), AppError>;

    async fn update_task(&mut self, task: &Task) -> Result<(), AppError>;

    async fn delete_task(&mut self, id: Uuid) -> Result<bool, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
