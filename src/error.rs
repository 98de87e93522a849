//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Domain failures (missing entities, duplicate emails, bad credentials) each have their
//! own variant so callers and tests can tell them apart; infrastructure failures are
//! collapsed into the generic 500 variants.
//!
//! `AppError` implements `actix_web::error::ResponseError`, producing the uniform
//! [`ApiError`] body `{message, status, path, timestamp}`. The request path is not known
//! where the error is raised, so the [`ErrorPath`] middleware fills it in on the way out.

use std::fmt;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    http::StatusCode,
    Error, HttpResponse,
};
use chrono::{DateTime, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// The key an employee lookup was performed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeKey {
    Id(Uuid),
    Email(String),
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmployeeKey::Id(id) => write!(f, "id {}", id),
            EmployeeKey::Email(email) => write!(f, "email {}", email),
        }
    }
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication is required but missing, or a token was rejected (HTTP 401).
    Unauthorized(String),
    /// Login failed. Carries no detail so it cannot reveal whether the email exists (HTTP 401).
    InvalidCredentials,
    /// Malformed request (HTTP 400).
    BadRequest(String),
    /// Generic missing resource (HTTP 404).
    NotFound(String),
    EmployeeNotFound(EmployeeKey),
    ProjectNotFound(Uuid),
    TaskNotFound(Uuid),
    /// An employee already holds this (normalized) email (HTTP 409).
    EmployeeExists(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from the persistence layer (HTTP 500).
    DatabaseError(String),
    /// Failed input validation (HTTP 400).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::EmployeeNotFound(key) => write!(f, "Employee with {} not found", key),
            AppError::ProjectNotFound(id) => write!(f, "Project with id {} not found", id),
            AppError::TaskNotFound(id) => write!(f, "Task with id {} not found", id),
            AppError::EmployeeExists(email) => {
                write!(f, "Employee with email {} already exists", email)
            }
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// The JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    /// The message shown to clients. Server-side failures are not echoed verbatim.
    pub fn client_message(&self) -> String {
        match self {
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn to_api_error(&self, path: &str) -> ApiError {
        ApiError {
            message: self.client_message(),
            status: self.status_code().as_u16(),
            path: path.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_)
            | AppError::EmployeeNotFound(_)
            | AppError::ProjectNotFound(_)
            | AppError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmployeeExists(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(self.to_api_error(""))
    }
}

/// Converts `sqlx::Error` into `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Token failures become 401s, except when we failed to produce a token ourselves.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Encoding(msg) => AppError::InternalServerError(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Middleware that rewrites `AppError` responses so their body carries the request path.
pub struct ErrorPath;

impl<S, B> Transform<S, ServiceRequest> for ErrorPath
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ErrorPathService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorPathService { service }))
    }
}

pub struct ErrorPathService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ErrorPathService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            let rewritten = res
                .response()
                .error()
                .and_then(|err| err.as_error::<AppError>())
                .map(|app_err| {
                    (
                        app_err.status_code(),
                        app_err.to_api_error(res.request().path()),
                    )
                });

            match rewritten {
                Some((status, body)) => {
                    let response = HttpResponse::build(status).json(body);
                    Ok(res.into_response(response).map_into_right_body())
                }
                None => Ok(res.map_into_left_body()),
            }
        })
    }
}
