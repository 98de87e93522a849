use std::sync::Arc;

use uuid::Uuid;

use super::employee_view;
use crate::auth::{Identity, PasswordHasher};
use crate::error::{AppError, EmployeeKey};
use crate::models::{
    normalize_email, Employee, EmployeeInput, EmployeeQuery, EmployeeUpdate, EmployeeView, Task,
};
use crate::store::{EmployeeFilter, Store, TaskFilter};

pub struct EmployeeService {
    store: Arc<dyn Store>,
    hasher: Arc<PasswordHasher>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn Store>, hasher: Arc<PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Creates an employee with the default role. The email is normalized and must be unused.
    pub async fn create(&self, input: EmployeeInput) -> Result<EmployeeView, AppError> {
        let email = normalize_email(&input.email);
        // bcrypt is slow; keep it outside the transaction.
        let password_hash = self.hasher.hash(&input.password)?;
        let employee = Employee::new(input.name, email, password_hash, input.position);

        let mut tx = self.store.begin().await?;
        if tx.find_employee_by_email(&employee.email).await?.is_some() {
            log::warn!("Rejected duplicate email {}", employee.email);
            return Err(AppError::EmployeeExists(employee.email));
        }
        tx.insert_employee(&employee).await?;
        tx.commit().await?;

        log::info!("Created employee {} ({})", employee.id, employee.email);
        Ok(EmployeeView::new(employee, Vec::new()))
    }

    pub async fn get(&self, id: Uuid) -> Result<EmployeeView, AppError> {
        log::debug!("Fetching employee {}", id);
        let mut tx = self.store.begin().await?;
        let employee = tx
            .find_employee(id)
            .await?
            .ok_or(AppError::EmployeeNotFound(EmployeeKey::Id(id)))?;
        employee_view(tx.as_mut(), employee).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<EmployeeView, AppError> {
        let email = normalize_email(email);
        log::debug!("Fetching employee by email {}", email);
        let mut tx = self.store.begin().await?;
        let employee = match tx.find_employee_by_email(&email).await? {
            Some(employee) => employee,
            None => return Err(AppError::EmployeeNotFound(EmployeeKey::Email(email))),
        };
        employee_view(tx.as_mut(), employee).await
    }

    /// The employee a request was authenticated as.
    pub async fn current(&self, identity: &Identity) -> Result<EmployeeView, AppError> {
        self.get_by_email(&identity.email).await
    }

    /// Employees ordered by name, narrowed by whole name (any case) and position.
    pub async fn list(&self, query: EmployeeQuery) -> Result<Vec<EmployeeView>, AppError> {
        let filter = EmployeeFilter {
            name: query.name,
            position: query.position,
        };
        let mut tx = self.store.begin().await?;
        let employees = tx.list_employees(&filter).await?;
        let mut views = Vec::with_capacity(employees.len());
        for employee in employees {
            views.push(employee_view(tx.as_mut(), employee).await?);
        }
        Ok(views)
    }

    /// Replaces name, email and position. Role and password are left alone.
    pub async fn update(&self, id: Uuid, update: EmployeeUpdate) -> Result<EmployeeView, AppError> {
        let email = normalize_email(&update.email);

        let mut tx = self.store.begin().await?;
        let mut employee = tx
            .lock_employee(id)
            .await?
            .ok_or(AppError::EmployeeNotFound(EmployeeKey::Id(id)))?;

        if let Some(holder) = tx.find_employee_by_email(&email).await? {
            if holder.id != id {
                log::warn!("Rejected email change of {} to taken {}", id, email);
                return Err(AppError::EmployeeExists(email));
            }
        }

        employee.name = update.name;
        employee.email = email;
        employee.position = update.position;
        tx.update_employee(&employee).await?;

        let view = employee_view(tx.as_mut(), employee).await?;
        tx.commit().await?;

        log::info!("Updated employee {}", id);
        Ok(view)
    }

    /// Deletes the employee. Its tasks survive unassigned; its memberships go.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        // Employee before its tasks, the order assignments lock in.
        if tx.lock_employee(id).await?.is_none() {
            return Err(AppError::EmployeeNotFound(EmployeeKey::Id(id)));
        }
        tx.delete_employee(id).await?;
        tx.commit().await?;

        log::info!("Deleted employee {}", id);
        Ok(())
    }

    /// Tasks currently assigned to the employee.
    pub async fn tasks_of(&self, id: Uuid) -> Result<Vec<Task>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_employee(id).await?.is_none() {
            return Err(AppError::EmployeeNotFound(EmployeeKey::Id(id)));
        }
        tx.list_tasks(&TaskFilter::for_employee(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::services::test_support::{employee_input, hasher, store, RecordingStore};

    fn service() -> EmployeeService {
        EmployeeService::new(store(), hasher())
    }

    #[actix_rt::test]
    async fn test_create_normalizes_email_and_hides_password() {
        let service = service();
        let view = service
            .create(employee_input("Ada", "Ada@X.com"))
            .await
            .unwrap();
        assert_eq!(view.email, "ada@x.com");
        assert!(view.projects.is_empty());

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[actix_rt::test]
    async fn test_create_rejects_case_insensitive_duplicate() {
        let service = service();
        service.create(employee_input("Ada", "ada@x.com")).await.unwrap();

        let result = service.create(employee_input("Ada Two", "ADA@x.com")).await;
        assert!(matches!(result, Err(AppError::EmployeeExists(email)) if email == "ada@x.com"));
        assert_eq!(service.list(EmployeeQuery::default()).await.unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn test_get_and_get_by_email() {
        let service = service();
        let created = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();

        assert_eq!(service.get(created.id).await.unwrap(), created);
        assert_eq!(service.get_by_email("ADA@x.com").await.unwrap(), created);

        let missing = Uuid::new_v4();
        assert!(matches!(
            service.get(missing).await,
            Err(AppError::EmployeeNotFound(EmployeeKey::Id(id))) if id == missing
        ));
        assert!(matches!(
            service.get_by_email("nobody@x.com").await,
            Err(AppError::EmployeeNotFound(EmployeeKey::Email(_)))
        ));
    }

    #[actix_rt::test]
    async fn test_current_resolves_identity_email() {
        let service = service();
        let created = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();
        let identity = Identity {
            employee_id: created.id,
            email: "ada@x.com".to_string(),
            authorities: vec!["ROLE_USER".to_string()],
        };
        assert_eq!(service.current(&identity).await.unwrap(), created);

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.current(&identity).await,
            Err(AppError::EmployeeNotFound(EmployeeKey::Email(_)))
        ));
    }

    #[actix_rt::test]
    async fn test_list_is_sorted_by_name() {
        let service = service();
        service.create(employee_input("Grace", "grace@x.com")).await.unwrap();
        service.create(employee_input("Ada", "ada@x.com")).await.unwrap();

        let names: Vec<String> = service
            .list(EmployeeQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
    }

    #[actix_rt::test]
    async fn test_update_changes_profile_and_guards_email() {
        let service = service();
        let ada = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();
        service.create(employee_input("Grace", "grace@x.com")).await.unwrap();

        let updated = service
            .update(
                ada.id,
                EmployeeUpdate {
                    name: "Ada Lovelace".to_string(),
                    email: "Lovelace@X.com".to_string(),
                    position: Position::Analyst,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, "lovelace@x.com");
        assert_eq!(updated.position, Position::Analyst);

        let clash = service
            .update(
                ada.id,
                EmployeeUpdate {
                    name: "Ada".to_string(),
                    email: "grace@x.com".to_string(),
                    position: Position::Analyst,
                },
            )
            .await;
        assert!(matches!(clash, Err(AppError::EmployeeExists(_))));

        // Keeping one's own email is not a clash.
        let same = service
            .update(
                ada.id,
                EmployeeUpdate {
                    name: "Ada L.".to_string(),
                    email: "lovelace@x.com".to_string(),
                    position: Position::Analyst,
                },
            )
            .await
            .unwrap();
        assert_eq!(same.name, "Ada L.");
    }

    #[actix_rt::test]
    async fn test_delete() {
        let service = service();
        let ada = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();

        service.delete(ada.id).await.unwrap();
        assert!(matches!(
            service.get(ada.id).await,
            Err(AppError::EmployeeNotFound(_))
        ));
        assert!(matches!(
            service.delete(ada.id).await,
            Err(AppError::EmployeeNotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_delete_locks_employee_before_touching_tasks() {
        let store = RecordingStore::default();
        let service = EmployeeService::new(Arc::new(store.clone()), hasher());
        let ada = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();
        store.clear();

        service.delete(ada.id).await.unwrap();
        assert_eq!(
            store.calls(),
            vec!["lock_employee", "delete_employee", "commit"]
        );

        store.clear();
        assert!(service.delete(ada.id).await.is_err());
        assert_eq!(store.calls(), vec!["lock_employee"]);
    }

    #[actix_rt::test]
    async fn test_list_filters_by_name_and_position() {
        let service = service();
        let ada = service.create(employee_input("Ada", "ada@x.com")).await.unwrap();
        let mut grace_input = employee_input("Grace", "grace@x.com");
        grace_input.position = Position::Manager;
        let grace = service.create(grace_input).await.unwrap();
        service.create(employee_input("Ada", "ada2@x.com")).await.unwrap();

        let by_name = service
            .list(EmployeeQuery {
                name: Some("ADA".to_string()),
                position: None,
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);
        assert!(by_name.iter().all(|e| e.name == "Ada"));
        assert!(by_name.iter().any(|e| e.id == ada.id));

        let managers = service
            .list(EmployeeQuery {
                name: None,
                position: Some(Position::Manager),
            })
            .await
            .unwrap();
        assert_eq!(managers, vec![grace]);

        let nobody = service
            .list(EmployeeQuery {
                name: Some("Ada".to_string()),
                position: Some(Position::Manager),
            })
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[actix_rt::test]
    async fn test_tasks_of_unknown_employee() {
        let service = service();
        assert!(matches!(
            service.tasks_of(Uuid::new_v4()).await,
            Err(AppError::EmployeeNotFound(_))
        ));
    }
}
