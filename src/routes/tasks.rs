use crate::{
    auth::AuthenticatedEmployee,
    error::AppError,
    models::{TaskInput, TaskQuery},
    services::{AssignmentManager, TaskService},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves a list of tasks, oldest first.
///
/// ## Query Parameters:
/// - `status` (optional): Only tasks in this status (`TODO`, `IN_PROGRESS`, `DONE`).
/// - `unassigned` (optional): When `true`, only tasks with no assigned employee.
/// - `description` (optional): Only tasks with exactly this description.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `400 Bad Request`: Unparseable query parameters.
/// - `401 Unauthorized`: If no identity was established for the request.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    query_params: web::Query<TaskQuery>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(tasks.list(query_params.into_inner()).await?))
}

/// Creates a new, unassigned task.
///
/// ## Request Body:
/// - `description`: What needs doing (required, not blank).
/// - `status` (optional): Defaults to `TODO`.
/// - `project_id`: The owning project (required, must exist).
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `400 Bad Request`: If the input data is invalid.
/// - `404 Not Found`: If the project does not exist.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    task_data: web::Json<TaskInput>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks.create(task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(tasks.get(task_id.into_inner()).await?))
}

/// Updates description, project and (if given) status of a task.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `400 Bad Request`: If validation fails.
/// - `404 Not Found`: If the task or the target project does not exist.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = tasks
        .update(task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    tasks.delete(task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Assigns the task to an employee, replacing any previous assignee.
#[put("/{id}/employees/{employee_id}")]
pub async fn assign_task(
    assignments: web::Data<AssignmentManager>,
    path: web::Path<(Uuid, Uuid)>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    let (task_id, employee_id) = path.into_inner();
    let task = assignments.assign_task(task_id, employee_id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Leaves the task without an assignee.
#[put("/{id}/employees")]
pub async fn unassign_task(
    assignments: web::Data<AssignmentManager>,
    task_id: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    let task = assignments.unassign_task(task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}
