use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EmployeeFilter, ProjectFilter, Store, StoreTx, TaskFilter};
use crate::error::AppError;
use crate::models::{task, Employee, Project, Task};

const EMPLOYEE_COLUMNS: &str = "id, name, email, password_hash, position, role";
const TASK_COLUMNS: &str =
    "id, description, status, employee_id, project_id, created_at, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/` and is applied on connect.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Maps a violation of the unique email constraint to `EmployeeExists`.
fn employee_write_error(error: sqlx::Error, email: &str) -> AppError {
    if let Some(db_err) = error.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("employees_email_key") {
            return AppError::EmployeeExists(email.to_string());
        }
    }
    error.into()
}

fn expect_one_row(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::NotFound("Record not found".into()));
    }
    Ok(())
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_employee(&mut self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(employee)
    }

    async fn lock_employee(&mut self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let sql = format!(
            "SELECT {} FROM employees WHERE id = $1 FOR UPDATE",
            EMPLOYEE_COLUMNS
        );
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(employee)
    }

    async fn find_employee_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {} FROM employees WHERE email = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(employee)
    }

    async fn list_employees(
        &mut self,
        filter: &EmployeeFilter,
    ) -> Result<Vec<Employee>, AppError> {
        let mut sql = format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS);
        let mut conditions: Vec<String> = Vec::new();
        let mut param_count = 1;

        if filter.name.is_some() {
            conditions.push(format!("LOWER(name) = LOWER(${})", param_count));
            param_count += 1;
        }
        if filter.position.is_some() {
            conditions.push(format!("position = ${}", param_count));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY name, id");

        let mut query = sqlx::query_as::<_, Employee>(&sql);
        if let Some(name) = &filter.name {
            query = query.bind(name);
        }
        if let Some(position) = filter.position {
            query = query.bind(position);
        }

        let employees = query.fetch_all(&mut *self.tx).await?;
        Ok(employees)
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO employees (id, name, email, password_hash, position, role) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(employee.position)
        .bind(employee.role)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| employee_write_error(e, &employee.email))?;
        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE employees SET name = $2, email = $3, password_hash = $4, position = $5, role = $6 \
             WHERE id = $1",
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.password_hash)
        .bind(employee.position)
        .bind(employee.role)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| employee_write_error(e, &employee.email))?;
        expect_one_row(result.rows_affected())
    }

    async fn delete_employee(&mut self, id: Uuid) -> Result<bool, AppError> {
        // The foreign key would null these too, but without bumping updated_at.
        sqlx::query("UPDATE tasks SET employee_id = NULL, updated_at = $2 WHERE employee_id = $1")
            .bind(id)
            .bind(task::now())
            .execute(&mut *self.tx)
            .await?;
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>("SELECT id, name FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(project)
    }

    async fn lock_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(project)
    }

    async fn list_projects(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let projects = match &filter.name {
            Some(name) => {
                sqlx::query_as::<_, Project>(
                    "SELECT id, name FROM projects WHERE name = $1 ORDER BY name, id",
                )
                .bind(name)
                .fetch_all(&mut *self.tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, Project>("SELECT id, name FROM projects ORDER BY name, id")
                    .fetch_all(&mut *self.tx)
                    .await?
            }
        };
        Ok(projects)
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), AppError> {
        sqlx::query("INSERT INTO projects (id, name) VALUES ($1, $2)")
            .bind(project.id)
            .bind(&project.name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE projects SET name = $2 WHERE id = $1")
            .bind(project.id)
            .bind(&project.name)
            .execute(&mut *self.tx)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError> {
        // Tasks and memberships go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn projects_of(&mut self, employee_id: Uuid) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT p.id, p.name FROM projects p \
             JOIN employee_projects ep ON ep.project_id = p.id \
             WHERE ep.employee_id = $1 \
             ORDER BY p.name, p.id",
        )
        .bind(employee_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(projects)
    }

    async fn members_of(&mut self, project_id: Uuid) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT e.id, e.name, e.email, e.password_hash, e.position, e.role FROM employees e \
             JOIN employee_projects ep ON ep.employee_id = e.id \
             WHERE ep.project_id = $1 \
             ORDER BY e.name, e.id",
        )
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(employees)
    }

    async fn insert_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO employee_projects (employee_id, project_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(employee_id)
        .bind(project_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM employee_projects WHERE employee_id = $1 AND project_id = $2")
                .bind(employee_id)
                .bind(project_id)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(task)
    }

    async fn lock_task(&mut self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1 FOR UPDATE", TASK_COLUMNS);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(task)
    }

    async fn list_tasks(&mut self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut sql = format!("SELECT {} FROM tasks", TASK_COLUMNS);
        let mut conditions: Vec<String> = Vec::new();
        let mut param_count = 1;

        if filter.status.is_some() {
            conditions.push(format!("status = ${}", param_count));
            param_count += 1;
        }
        if filter.employee_id.is_some() {
            conditions.push(format!("employee_id = ${}", param_count));
            param_count += 1;
        }
        if filter.project_id.is_some() {
            conditions.push(format!("project_id = ${}", param_count));
            param_count += 1;
        }
        if filter.description.is_some() {
            conditions.push(format!("description = ${}", param_count));
        }
        if filter.unassigned {
            conditions.push("employee_id IS NULL".to_string());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut query = sqlx::query_as::<_, Task>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.bind(employee_id);
        }
        if let Some(project_id) = filter.project_id {
            query = query.bind(project_id);
        }
        if let Some(description) = &filter.description {
            query = query.bind(description);
        }

        let tasks = query.fetch_all(&mut *self.tx).await?;
        Ok(tasks)
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tasks (id, description, status, employee_id, project_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(task.id)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.employee_id)
        .bind(task.project_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_task(&mut self, task: &Task) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET description = $2, status = $3, employee_id = $4, project_id = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.employee_id)
        .bind(task.project_id)
        .bind(task.updated_at)
        .execute(&mut *self.tx)
        .await?;
        expect_one_row(result.rows_affected())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
