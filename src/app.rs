//! Wiring of services, authentication and routes into an actix application.

use std::sync::Arc;

use actix_web::{web, HttpRequest};

use crate::auth::{
    CredentialService, IdentityDirectory, PasswordHasher, RequestAuthenticator, StaticSigningKey,
    StoreDirectory, TokenCodec,
};
use crate::config::Config;
use crate::error::AppError;
use crate::routes;
use crate::services::{AssignmentManager, EmployeeService, ProjectService, TaskService};
use crate::store::Store;

/// Everything a worker needs. Cheap to clone; one copy per `App` instance.
#[derive(Clone)]
pub struct AppServices {
    pub codec: Arc<TokenCodec>,
    pub authenticator: RequestAuthenticator,
    pub credentials: Arc<CredentialService>,
    pub employees: Arc<EmployeeService>,
    pub projects: Arc<ProjectService>,
    pub tasks: Arc<TaskService>,
    pub assignments: Arc<AssignmentManager>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, codec: Arc<TokenCodec>, hasher: Arc<PasswordHasher>) -> Self {
        let directory: Arc<dyn IdentityDirectory> = Arc::new(StoreDirectory::new(store.clone()));
        let employees = Arc::new(EmployeeService::new(store.clone(), hasher.clone()));
        let credentials = Arc::new(CredentialService::new(
            employees.clone(),
            directory.clone(),
            hasher,
            codec.clone(),
        ));

        Self {
            authenticator: RequestAuthenticator::new(codec.clone(), directory),
            codec,
            credentials,
            employees,
            projects: Arc::new(ProjectService::new(store.clone())),
            tasks: Arc::new(TaskService::new(store.clone())),
            assignments: Arc::new(AssignmentManager::new(store)),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Result<Self, AppError> {
        let codec = Arc::new(TokenCodec::new(
            Arc::new(StaticSigningKey::new(config.jwt_secret.clone())),
            config.token_validity(),
        ));
        let hasher = Arc::new(PasswordHasher::new(config.bcrypt_cost)?);
        Ok(Self::new(store, codec, hasher))
    }

    /// Registers shared state, extractor error handlers and routes.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.credentials.clone()))
            .app_data(web::Data::from(self.employees.clone()))
            .app_data(web::Data::from(self.projects.clone()))
            .app_data(web::Data::from(self.tasks.clone()))
            .app_data(web::Data::from(self.assignments.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, req: &HttpRequest| {
                log::debug!("Unmatched path segment in {}: {}", req.path(), err);
                AppError::NotFound("Resource not found".into()).into()
            }))
            .configure(routes::config);
    }
}
