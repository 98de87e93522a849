pub mod auth;
pub mod employees;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register),
        )
        .service(
            web::scope("/employees")
                .service(employees::list_employees)
                .service(employees::create_employee)
                // Literal segments before "/{id}", which would otherwise swallow them.
                .service(employees::current_employee)
                .service(employees::current_employee_tasks)
                .service(employees::search_employee)
                .service(employees::get_employee)
                .service(employees::update_employee)
                .service(employees::delete_employee)
                .service(employees::get_employee_tasks)
                .service(employees::assign_project)
                .service(employees::unassign_project),
        )
        .service(
            web::scope("/projects")
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project)
                .service(projects::get_project_employees)
                .service(projects::get_project_tasks),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(tasks::assign_task)
                .service(tasks::unassign_task),
        );
}
