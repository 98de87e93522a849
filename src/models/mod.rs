pub mod employee;
pub mod project;
pub mod task;

pub use employee::{
    normalize_email, Employee, EmployeeInput, EmployeeQuery, EmployeeUpdate, EmployeeView, Position,
    Role,
};
pub use project::{Project, ProjectInput, ProjectQuery, ProjectView};
pub use task::{Task, TaskInput, TaskQuery, TaskStatus};
