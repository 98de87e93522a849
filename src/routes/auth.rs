use crate::{
    auth::{AuthResponse, CredentialService, LoginRequest, RegisterRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new employee
///
/// Creates an account with the default role and returns a bearer token for it.
///
/// ## Responses:
/// - `201 Created`: `{ "token": "..." }`
/// - `400 Bad Request`: Malformed body or failed validation.
/// - `409 Conflict`: The email (compared case-insensitively) is already registered.
#[post("/register")]
pub async fn register(
    credentials: web::Data<CredentialService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let RegisterRequest {
        name,
        email,
        position,
        password,
    } = register_data.into_inner();
    let token = credentials.register(name, email, position, password).await?;

    Ok(HttpResponse::Created().json(AuthResponse { token }))
}

/// Login
///
/// Verifies the credentials and returns a bearer token.
///
/// ## Responses:
/// - `200 OK`: `{ "token": "..." }`
/// - `400 Bad Request`: Malformed body or failed validation.
/// - `401 Unauthorized`: Unknown email or wrong password; the two are not told apart.
#[post("/login")]
pub async fn login(
    credentials: web::Data<CredentialService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let token = credentials
        .login(&login_data.email, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}
