use crate::{
    auth::AuthenticatedEmployee,
    error::AppError,
    models::{ProjectInput, ProjectQuery},
    services::ProjectService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Lists projects by name. `?name=` keeps only exact matches.
#[get("")]
pub async fn list_projects(
    projects: web::Data<ProjectService>,
    query_params: web::Query<ProjectQuery>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(projects.list(query_params.into_inner()).await?))
}

#[post("")]
pub async fn create_project(
    projects: web::Data<ProjectService>,
    project_data: web::Json<ProjectInput>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = projects.create(project_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(project))
}

#[get("/{id}")]
pub async fn get_project(
    projects: web::Data<ProjectService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(projects.get(path.into_inner()).await?))
}

#[put("/{id}")]
pub async fn update_project(
    projects: web::Data<ProjectService>,
    path: web::Path<Uuid>,
    project_data: web::Json<ProjectInput>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = projects
        .update(path.into_inner(), project_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Deletes a project along with all of its tasks.
#[delete("/{id}")]
pub async fn delete_project(
    projects: web::Data<ProjectService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    projects.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/{id}/employees")]
pub async fn get_project_employees(
    projects: web::Data<ProjectService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(projects.members(path.into_inner()).await?))
}

#[get("/{id}/tasks")]
pub async fn get_project_tasks(
    projects: web::Data<ProjectService>,
    path: web::Path<Uuid>,
    _auth: AuthenticatedEmployee,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(projects.tasks_of(path.into_inner()).await?))
}
