use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{normalize_email, Employee, Role};
use crate::store::Store;

/// What authentication needs to know about an account.
#[derive(Debug, Clone)]
pub struct Credential {
    pub employee_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl Credential {
    pub fn authorities(&self) -> Vec<String> {
        vec![self.role.authority().to_string()]
    }
}

impl From<Employee> for Credential {
    fn from(employee: Employee) -> Self {
        Self {
            employee_id: employee.id,
            email: employee.email,
            password_hash: employee.password_hash,
            role: employee.role,
        }
    }
}

/// Looks up credentials by email. Used by login and by the request authenticator.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError>;
}

/// Directory backed by the employee records of a [`Store`].
pub struct StoreDirectory {
    store: Arc<dyn Store>,
}

impl StoreDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityDirectory for StoreDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, AppError> {
        let mut tx = self.store.begin().await?;
        let employee = tx.find_employee_by_email(&normalize_email(email)).await?;
        Ok(employee.map(Credential::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::store::MemoryStore;

    #[actix_rt::test]
    async fn test_find_by_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let ada = Employee::new(
            "Ada".to_string(),
            "ada@x.com".to_string(),
            "hash".to_string(),
            Position::Developer,
        );
        let mut tx = store.begin().await.unwrap();
        tx.insert_employee(&ada).await.unwrap();
        tx.commit().await.unwrap();

        let directory = StoreDirectory::new(Arc::new(store));
        let credential = directory.find_by_email("ADA@X.com").await.unwrap().unwrap();
        assert_eq!(credential.employee_id, ada.id);
        assert_eq!(credential.authorities(), vec!["ROLE_USER".to_string()]);

        assert!(directory.find_by_email("bob@x.com").await.unwrap().is_none());
    }
}
