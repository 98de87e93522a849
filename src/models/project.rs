use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

/// A project. Its members and tasks live in their own tables and are
/// looked up by project id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
}

impl Project {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// Input for creating or renaming a project.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200), custom = "not_blank")]
    pub name: String,
}

/// Query parameters for listing projects.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ProjectQuery {
    /// Exact project name.
    pub name: Option<String>,
}

/// Project representation returned by the API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectView {
    pub id: Uuid,
    pub name: String,
    /// Identifiers of the member employees.
    pub employee_ids: Vec<Uuid>,
}

impl ProjectView {
    pub fn new(project: Project, employee_ids: Vec<Uuid>) -> Self {
        Self {
            id: project.id,
            name: project.name,
            employee_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_input_validation() {
        assert!(ProjectInput {
            name: "Apollo".to_string()
        }
        .validate()
        .is_ok());
        assert!(ProjectInput {
            name: "".to_string()
        }
        .validate()
        .is_err());
        assert!(ProjectInput {
            name: "  ".to_string()
        }
        .validate()
        .is_err());
    }
}
