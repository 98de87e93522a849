use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Done,
}

/// Input structure for creating or updating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// What needs doing. Must not be blank.
    #[validate(length(min = 1, max = 1000), custom = "not_blank")]
    pub description: String,

    /// Defaults to `TODO` on creation when omitted.
    pub status: Option<TaskStatus>,

    /// The owning project. Must reference an existing project.
    pub project_id: Uuid,
}

/// Represents a task as stored and as returned by the API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub description: String,
    pub status: TaskStatus,
    /// The assigned employee, if any.
    pub employee_id: Option<Uuid>,
    /// The owning project. Never null.
    pub project_id: Uuid,
    /// Set once on creation.
    pub created_at: DateTime<Utc>,
    /// Bumped on every change, never moves backwards.
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing tasks.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<TaskStatus>,
    /// When true, only tasks without an assigned employee are returned.
    pub unassigned: Option<bool>,
    /// Exact description.
    pub description: Option<String>,
}

/// Current time at the precision the database keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Task {
    /// Creates a new, unassigned task in `project_id`.
    pub fn new(description: String, status: TaskStatus, project_id: Uuid) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            description,
            status,
            employee_id: None,
            project_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the task as modified.
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.updated_at);
    }
}
