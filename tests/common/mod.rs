#![allow(dead_code, unused_macros)]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use workforce::auth::{PasswordHasher, StaticSigningKey, TokenCodec};
use workforce::store::{MemoryStore, Store};
use workforce::AppServices;

pub const SECRET: &str = "test-secret";

pub fn test_services() -> AppServices {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let codec = Arc::new(TokenCodec::new(
        Arc::new(StaticSigningKey::new(SECRET)),
        Duration::hours(24),
    ));
    let hasher = Arc::new(PasswordHasher::new(4).expect("bcrypt cost 4 is valid"));
    AppServices::new(store, codec, hasher)
}

/// Builds the same middleware stack as the binary around `$services`.
macro_rules! test_app {
    ($services:expr) => {{
        let services: workforce::AppServices = $services;
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(workforce::ErrorPath)
                .wrap(services.authenticator.clone())
                .configure(|cfg| services.configure(cfg)),
        )
        .await
    }};
}

pub async fn send<S, B>(
    app: &S,
    req: test::TestRequest,
    token: Option<&str>,
) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {}", token))),
        None => req,
    };
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!(
                "Response body is not JSON: {:?}",
                String::from_utf8_lossy(&body)
            )
        })
    };
    (status, value)
}

pub fn parse<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("Unexpected response shape")
}

pub async fn register<S, B>(app: &S, name: &str, email: &str, password: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": name,
            "email": email,
            "position": "DEVELOPER",
            "password": password
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);
    body["token"]
        .as_str()
        .expect("token in register response")
        .to_string()
}

pub async fn create_project<S, B>(app: &S, token: &str, name: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::post()
            .uri("/projects")
            .set_json(json!({ "name": name })),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Project creation failed: {}", body);
    body
}

pub async fn create_task<S, B>(app: &S, token: &str, description: &str, project_id: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::post().uri("/tasks").set_json(json!({
            "description": description,
            "project_id": project_id
        })),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Task creation failed: {}", body);
    body
}

pub async fn me<S, B>(app: &S, token: &str) -> Value
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        test::TestRequest::get().uri("/employees/me"),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "GET /employees/me failed: {}", body);
    body
}
