use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{EmployeeFilter, ProjectFilter, Store, StoreTx, TaskFilter};
use crate::error::AppError;
use crate::models::{Employee, Project, Task};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: HashMap<Uuid, Employee>,
    projects: HashMap<Uuid, Project>,
    tasks: HashMap<Uuid, Task>,
    /// (employee_id, project_id)
    memberships: BTreeSet<(Uuid, Uuid)>,
}

/// In-process store used when no database is configured, and by the tests.
///
/// A transaction takes the store's lock for its whole lifetime, so
/// transactions are fully serialized. Reads go straight to the locked state.
/// The first write copies the whole state and later operations work on that
/// copy; commit swaps it in and dropping the transaction discards it. A
/// read-only transaction therefore costs no copy, but every writing one costs
/// a copy proportional to the store's size.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            working: None,
        }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    /// Copy taken on the first write. `None` while the transaction only reads.
    working: Option<MemoryState>,
}

impl MemoryTx {
    fn state(&self) -> &MemoryState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        let committed = &self.guard;
        self.working.get_or_insert_with(|| MemoryState::clone(committed))
    }

    /// Whether this transaction has copied the state yet.
    #[cfg(test)]
    fn has_copy(&self) -> bool {
        self.working.is_some()
    }
}

fn sort_employees(employees: &mut [Employee]) {
    employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_employee(&mut self, id: Uuid) -> Result<Option<Employee>, AppError> {
        Ok(self.state().employees.get(&id).cloned())
    }

    async fn find_employee_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Employee>, AppError> {
        Ok(self
            .state()
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn list_employees(
        &mut self,
        filter: &EmployeeFilter,
    ) -> Result<Vec<Employee>, AppError> {
        let mut employees: Vec<Employee> = self
            .state()
            .employees
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        sort_employees(&mut employees);
        Ok(employees)
    }

    async fn insert_employee(&mut self, employee: &Employee) -> Result<(), AppError> {
        if self
            .state()
            .employees
            .values()
            .any(|e| e.email == employee.email)
        {
            return Err(AppError::EmployeeExists(employee.email.clone()));
        }
        self.state_mut()
            .employees
            .insert(employee.id, employee.clone());
        Ok(())
    }

    async fn update_employee(&mut self, employee: &Employee) -> Result<(), AppError> {
        if self
            .state()
            .employees
            .values()
            .any(|e| e.email == employee.email && e.id != employee.id)
        {
            return Err(AppError::EmployeeExists(employee.email.clone()));
        }
        if !self.state().employees.contains_key(&employee.id) {
            return Err(AppError::NotFound("Record not found".into()));
        }
        self.state_mut()
            .employees
            .insert(employee.id, employee.clone());
        Ok(())
    }

    async fn delete_employee(&mut self, id: Uuid) -> Result<bool, AppError> {
        if !self.state().employees.contains_key(&id) {
            return Ok(false);
        }
        let state = self.state_mut();
        state.employees.remove(&id);
        state.memberships.retain(|(e, _)| *e != id);
        for task in state.tasks.values_mut() {
            if task.employee_id == Some(id) {
                task.employee_id = None;
                task.touch();
            }
        }
        Ok(true)
    }

    async fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.state().projects.get(&id).cloned())
    }

    async fn list_projects(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let mut projects: Vec<Project> = self
            .state()
            .projects
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort_projects(&mut projects);
        Ok(projects)
    }

    async fn insert_project(&mut self, project: &Project) -> Result<(), AppError> {
        self.state_mut()
            .projects
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(&mut self, project: &Project) -> Result<(), AppError> {
        if !self.state().projects.contains_key(&project.id) {
            return Err(AppError::NotFound("Record not found".into()));
        }
        self.state_mut()
            .projects
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError> {
        if !self.state().projects.contains_key(&id) {
            return Ok(false);
        }
        let state = self.state_mut();
        state.projects.remove(&id);
        state.memberships.retain(|(_, p)| *p != id);
        state.tasks.retain(|_, task| task.project_id != id);
        Ok(true)
    }

    async fn projects_of(&mut self, employee_id: Uuid) -> Result<Vec<Project>, AppError> {
        let state = self.state();
        let mut projects: Vec<Project> = state
            .memberships
            .iter()
            .filter(|(e, _)| *e == employee_id)
            .filter_map(|(_, p)| state.projects.get(p).cloned())
            .collect();
        sort_projects(&mut projects);
        Ok(projects)
    }

    async fn members_of(&mut self, project_id: Uuid) -> Result<Vec<Employee>, AppError> {
        let state = self.state();
        let mut members: Vec<Employee> = state
            .memberships
            .iter()
            .filter(|(_, p)| *p == project_id)
            .filter_map(|(e, _)| state.employees.get(e).cloned())
            .collect();
        sort_employees(&mut members);
        Ok(members)
    }

    async fn insert_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        let key = (employee_id, project_id);
        if self.state().memberships.contains(&key) {
            return Ok(false);
        }
        Ok(self.state_mut().memberships.insert(key))
    }

    async fn delete_membership(
        &mut self,
        employee_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool, AppError> {
        let key = (employee_id, project_id);
        if !self.state().memberships.contains(&key) {
            return Ok(false);
        }
        Ok(self.state_mut().memberships.remove(&key))
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.state().tasks.get(&id).cloned())
    }

    async fn list_tasks(&mut self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .state()
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), AppError> {
        self.state_mut().tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update_task(&mut self, task: &Task) -> Result<(), AppError> {
        if !self.state().tasks.contains_key(&task.id) {
            return Err(AppError::NotFound("Record not found".into()));
        }
        self.state_mut().tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete_task(&mut self, id: Uuid) -> Result<bool, AppError> {
        if !self.state().tasks.contains_key(&id) {
            return Ok(false);
        }
        Ok(self.state_mut().tasks.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTx { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, TaskStatus};

    fn employee(name: &str, email: &str) -> Employee {
        Employee::new(
            name.to_string(),
            email.to_string(),
            "hash".to_string(),
            Position::Developer,
        )
    }

    #[actix_rt::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::new();
        let ada = employee("Ada", "ada@x.com");

        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&ada).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_employee(ada.id).await.unwrap().is_some());
        assert_eq!(
            tx.find_employee_by_email("ada@x.com").await.unwrap().map(|e| e.id),
            Some(ada.id)
        );
    }

    #[actix_rt::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        let ada = employee("Ada", "ada@x.com");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_employee(&ada).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_employee(ada.id).await.unwrap().is_none());
        assert!(tx
            .list_employees(&EmployeeFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_rt::test]
    async fn test_reads_do_not_copy_state() {
        let store = MemoryStore::new();
        let ada = employee("Ada", "ada@x.com");
        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&ada).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = MemoryTx {
            guard: store.state.clone().lock_owned().await,
            working: None,
        };
        assert!(tx.find_employee_by_email("ada@x.com").await.unwrap().is_some());
        assert!(tx.projects_of(ada.id).await.unwrap().is_empty());
        assert!(!tx.has_copy());

        // A no-op membership removal is still a read.
        assert!(!tx.delete_membership(ada.id, Uuid::new_v4()).await.unwrap());
        assert!(!tx.has_copy());

        tx.insert_project(&Project::new("Apollo".to_string()))
            .await
            .unwrap();
        assert!(tx.has_copy());
        assert_eq!(
            tx.find_employee(ada.id).await.unwrap().map(|e| e.id),
            Some(ada.id)
        );
    }

    #[actix_rt::test]
    async fn test_list_filters_employees_and_projects() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let ada = employee("Ada", "ada@x.com");
        let mut grace = employee("Grace", "grace@x.com");
        grace.position = Position::Manager;
        tx.insert_employee(&ada).await.unwrap();
        tx.insert_employee(&grace).await.unwrap();
        tx.insert_project(&Project::new("Apollo".to_string()))
            .await
            .unwrap();
        let gemini = Project::new("Gemini".to_string());
        tx.insert_project(&gemini).await.unwrap();

        let named = tx
            .list_employees(&EmployeeFilter {
                name: Some("GRACE".to_string()),
                ..EmployeeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(named.into_iter().map(|e| e.id).collect::<Vec<_>>(), vec![grace.id]);

        let developers = tx
            .list_employees(&EmployeeFilter {
                position: Some(Position::Developer),
                ..EmployeeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(developers.into_iter().map(|e| e.id).collect::<Vec<_>>(), vec![ada.id]);

        let projects = tx
            .list_projects(&ProjectFilter {
                name: Some("Gemini".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(projects, vec![gemini]);
        assert_eq!(tx.list_projects(&ProjectFilter::default()).await.unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&employee("Ada", "ada@x.com")).await.unwrap();

        let result = tx.insert_employee(&employee("Other Ada", "ADA@x.com")).await;
        assert!(matches!(result, Err(AppError::EmployeeExists(email)) if email == "ada@x.com"));
    }

    #[actix_rt::test]
    async fn test_membership_insert_and_delete_report_changes() {
        let store = MemoryStore::new();
        let ada = employee("Ada", "ada@x.com");
        let apollo = Project::new("Apollo".to_string());

        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&ada).await.unwrap();
        tx.insert_project(&apollo).await.unwrap();

        assert!(tx.insert_membership(ada.id, apollo.id).await.unwrap());
        assert!(!tx.insert_membership(ada.id, apollo.id).await.unwrap());
        assert_eq!(tx.projects_of(ada.id).await.unwrap(), vec![apollo.clone()]);
        assert_eq!(
            tx.members_of(apollo.id)
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.id)
                .collect::<Vec<_>>(),
            vec![ada.id]
        );

        assert!(tx.delete_membership(ada.id, apollo.id).await.unwrap());
        assert!(!tx.delete_membership(ada.id, apollo.id).await.unwrap());
        assert!(tx.projects_of(ada.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_deletes_cascade_and_detach() {
        let store = MemoryStore::new();
        let ada = employee("Ada", "ada@x.com");
        let apollo = Project::new("Apollo".to_string());
        let gemini = Project::new("Gemini".to_string());
        let mut apollo_task = Task::new("Launch".to_string(), TaskStatus::Todo, apollo.id);
        apollo_task.employee_id = Some(ada.id);
        let mut gemini_task = Task::new("Dock".to_string(), TaskStatus::Todo, gemini.id);
        gemini_task.employee_id = Some(ada.id);

        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&ada).await.unwrap();
        tx.insert_project(&apollo).await.unwrap();
        tx.insert_project(&gemini).await.unwrap();
        tx.insert_membership(ada.id, apollo.id).await.unwrap();
        tx.insert_membership(ada.id, gemini.id).await.unwrap();
        tx.insert_task(&apollo_task).await.unwrap();
        tx.insert_task(&gemini_task).await.unwrap();

        assert!(tx.delete_project(apollo.id).await.unwrap());
        assert!(tx.find_task(apollo_task.id).await.unwrap().is_none());
        assert_eq!(tx.projects_of(ada.id).await.unwrap(), vec![gemini.clone()]);

        assert!(tx.delete_employee(ada.id).await.unwrap());
        let survivor = tx.find_task(gemini_task.id).await.unwrap().unwrap();
        assert_eq!(survivor.employee_id, None);
        assert!(tx.members_of(gemini.id).await.unwrap().is_empty());

        assert!(!tx.delete_employee(ada.id).await.unwrap());
        assert!(!tx.delete_project(apollo.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_list_tasks_applies_filter_in_creation_order() {
        let store = MemoryStore::new();
        let project = Project::new("Apollo".to_string());
        let first = Task::new("First".to_string(), TaskStatus::Todo, project.id);
        let mut second = Task::new("Second".to_string(), TaskStatus::Done, project.id);
        second.created_at = first.created_at + chrono::Duration::seconds(1);

        let mut tx = store.begin().await.unwrap();
        tx.insert_project(&project).await.unwrap();
        tx.insert_task(&second).await.unwrap();
        tx.insert_task(&first).await.unwrap();

        let all = tx.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );

        let done = tx
            .list_tasks(&TaskFilter {
                status: Some(TaskStatus::Done),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(done, vec![second]);
    }
}
