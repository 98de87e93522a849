use crate::{
    auth::AuthenticatedEmployee,
    error::AppError,
    models::{EmployeeInput, EmployeeQuery, EmployeeUpdate},
    services::{AssignmentManager, EmployeeService},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Lists employees with their project memberships, ordered by name.
///
/// ## Query Parameters:
/// - `name` (optional): Only employees with exactly this name, ignoring case.
/// - `position` (optional): Only employees in this position (`DEVELOPER`, `MANAGER`, ...).
#[get("")]
pub async fn list_employees(
    employees: web::Data<EmployeeService>,
    query_params: web::Query<EmployeeQuery>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.list(query_params.into_inner()).await?))
}

/// Creates an employee directly, with an explicit position and the default role.
///
/// ## Responses:
/// - `201 Created`: The new employee.
/// - `400 Bad Request`: Failed validation.
/// - `409 Conflict`: Email already in use.
#[post("")]
pub async fn create_employee(
    employees: web::Data<EmployeeService>,
    employee_data: web::Json<EmployeeInput>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    employee_data.validate()?;
    let employee = employees.create(employee_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(employee))
}

/// The employee the bearer token belongs to.
#[get("/me")]
pub async fn current_employee(
    employees: web::Data<EmployeeService>,
    auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.current(&auth.0).await?))
}

/// Tasks assigned to the employee the bearer token belongs to.
#[get("/me/tasks")]
pub async fn current_employee_tasks(
    employees: web::Data<EmployeeService>,
    auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.tasks_of(auth.0.employee_id).await?))
}

/// Finds an employee by email, matched case-insensitively.
#[get("/search")]
pub async fn search_employee(
    employees: web::Data<EmployeeService>,
    query: web::Query<EmailQuery>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.get_by_email(&query.email).await?))
}

#[get("/{id}")]
pub async fn get_employee(
    employees: web::Data<EmployeeService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.get(path.into_inner()).await?))
}

/// Replaces name, email and position.
///
/// ## Responses:
/// - `200 OK`: The updated employee.
/// - `400 Bad Request`: Failed validation.
/// - `404 Not Found`: No such employee.
/// - `409 Conflict`: The new email belongs to another employee.
#[put("/{id}")]
pub async fn update_employee(
    employees: web::Data<EmployeeService>,
    path: web::Path<Uuid>,
    employee_data: web::Json<EmployeeUpdate>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    employee_data.validate()?;
    let employee = employees
        .update(path.into_inner(), employee_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Deletes an employee. Their tasks stay, unassigned.
#[delete("/{id}")]
pub async fn delete_employee(
    employees: web::Data<EmployeeService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    employees.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{id}/tasks")]
pub async fn get_employee_tasks(
    employees: web::Data<EmployeeService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(employees.tasks_of(path.into_inner()).await?))
}

/// Adds the employee to the project. Repeating it changes nothing.
#[put("/{id}/projects/{project_id}")]
pub async fn assign_project(
    assignments: web::Data<AssignmentManager>,
    path: web::Path<(Uuid, Uuid)>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    let (employee_id, project_id) = path.into_inner();
    let employee = assignments.assign_project(employee_id, project_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Removes the employee from the project. Repeating it changes nothing.
#[delete("/{id}/projects/{project_id}")]
pub async fn unassign_project(
    assignments: web::Data<AssignmentManager>,
    path: web::Path<(Uuid, Uuid)>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    let (employee_id, project_id) = path.into_inner();
    let employee = assignments.unassign_project(employee_id, project_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}
