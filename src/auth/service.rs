use std::sync::Arc;

use serde_json::{json, Map};

use super::directory::{Credential, IdentityDirectory};
use super::password::PasswordHasher;
use super::token::{TokenCodec, AUTHORITIES_CLAIM};
use crate::error::AppError;
use crate::models::{normalize_email, EmployeeInput, Position};
use crate::services::EmployeeService;

/// Registration and login. Both end in a freshly issued bearer token.
pub struct CredentialService {
    employees: Arc<EmployeeService>,
    directory: Arc<dyn IdentityDirectory>,
    hasher: Arc<PasswordHasher>,
    codec: Arc<TokenCodec>,
}

impl CredentialService {
    pub fn new(
        employees: Arc<EmployeeService>,
        directory: Arc<dyn IdentityDirectory>,
        hasher: Arc<PasswordHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        Self {
            employees,
            directory,
            hasher,
            codec,
        }
    }

    /// Creates an account with the default role and logs it in.
    pub async fn register(
        &self,
        name: String,
        email: String,
        position: Position,
        raw_password: String,
    ) -> Result<String, AppError> {
        let created = self
            .employees
            .create(EmployeeInput {
                name,
                email,
                position,
                password: raw_password.clone(),
            })
            .await?;

        // Same path as login, so registration proves the stored credentials work.
        let credential = match self.authenticate(&created.email, &raw_password).await {
            Ok(credential) => credential,
            Err(AppError::InvalidCredentials) => {
                log::error!("Fresh registration of {} failed to authenticate", created.email);
                return Err(AppError::InternalServerError(
                    "Registered credentials could not be verified".into(),
                ));
            }
            Err(e) => return Err(e),
        };

        log::info!("Registered {}", credential.email);
        self.issue_token(&credential)
    }

    pub async fn login(&self, email: &str, raw_password: &str) -> Result<String, AppError> {
        let credential = self.authenticate(&normalize_email(email), raw_password).await?;
        log::info!("Login for {}", credential.email);
        self.issue_token(&credential)
    }

    /// Unknown email and wrong password fail identically, after comparable work.
    async fn authenticate(&self, email: &str, raw_password: &str) -> Result<Credential, AppError> {
        let credential = match self.directory.find_by_email(email).await? {
            Some(credential) => credential,
            None => {
                self.hasher.verify_dummy(raw_password);
                log::warn!("Login attempt for unknown email {}", email);
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.hasher.verify(raw_password, &credential.password_hash)? {
            log::warn!("Wrong password for {}", email);
            return Err(AppError::InvalidCredentials);
        }

        Ok(credential)
    }

    fn issue_token(&self, credential: &Credential) -> Result<String, AppError> {
        let mut claims = Map::new();
        claims.insert(
            AUTHORITIES_CLAIM.to_string(),
            json!(credential.authorities()),
        );
        Ok(self.codec.issue(&credential.email, claims)?)
    }
}
