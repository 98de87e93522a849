use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::project::Project;
use crate::validation::{not_blank, NAME_REGEX};

/// Job position of an employee.
/// Corresponds to the `employee_position` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "employee_position", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Developer,
    Designer,
    Tester,
    Manager,
    Analyst,
}

/// Access role of an employee. Every employee holds exactly one.
/// Corresponds to the `employee_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// The authority string carried in issued tokens.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

/// An employee as stored. Doubles as the credential record for authentication.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// service layer. Use [`EmployeeView`] for responses.
#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    /// Always stored normalized, see [`normalize_email`].
    pub email: String,
    pub password_hash: String,
    pub position: Position,
    pub role: Role,
}

impl Employee {
    /// Creates a new employee with a fresh identifier and the default role.
    pub fn new(name: String, email: String, password_hash: String, position: Position) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(&email),
            password_hash,
            position,
            role: Role::default(),
        }
    }

    pub fn authorities(&self) -> Vec<String> {
        vec![self.role.authority().to_string()]
    }
}

/// Lowercases an email for comparison and storage.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Payload for creating an employee directly (as opposed to self-registration).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmployeeInput {
    #[validate(
        length(min = 1, max = 100),
        custom = "not_blank",
        regex(path = "NAME_REGEX", message = "Name contains invalid characters")
    )]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub position: Position,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub password: String,
}

/// Payload for updating an employee's profile. Passwords are not changed here.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct EmployeeUpdate {
    #[validate(
        length(min = 1, max = 100),
        custom = "not_blank",
        regex(path = "NAME_REGEX", message = "Name contains invalid characters")
    )]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub position: Position,
}

/// Query parameters for listing employees.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct EmployeeQuery {
    /// Exact name, compared case-insensitively.
    pub name: Option<String>,
    pub position: Option<Position>,
}

/// Employee representation returned by the API, including project memberships.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmployeeView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub position: Position,
    pub role: Role,
    pub projects: Vec<Project>,
}

impl EmployeeView {
    pub fn new(employee: Employee, projects: Vec<Project>) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            position: employee.position,
            role: employee.role,
            projects,
        }
    }
}
