#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use chrono::{Duration, Utc};
use common::{me, register, send, test_services};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};
use workforce::auth::{AuthResponse, StaticSigningKey, TokenCodec};
use workforce::error::ApiError;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let services = test_services();
    let codec = services.codec.clone();
    let app = test_app!(services);

    let token = register(&app, "Ada", "Ada@X.com", "pw1").await;
    assert_eq!(codec.extract_subject(&token).unwrap(), "ada@x.com");

    let (status, body) = send(
        &app,
        test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "ada@x.com",
            "password": "pw1"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Login failed: {}", body);
    let login: AuthResponse = common::parse(body);
    assert!(codec.is_valid(&login.token, "ada@x.com"));

    let claims = codec.decode(&login.token).unwrap();
    assert_eq!(claims.authorities(), vec!["ROLE_USER".to_string()]);

    let profile = me(&app, &login.token).await;
    assert_eq!(profile["email"], "ada@x.com");
    assert_eq!(profile["name"], "Ada");
    assert_eq!(profile["role"], "USER");
    assert!(profile.get("password_hash").is_none());
}

#[actix_rt::test]
async fn test_duplicate_registration_conflicts_case_insensitively() {
    let app = test_app!(test_services());
    register(&app, "Ada", "ada@x.com", "pw1").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": "Ada Again",
            "email": "ADA@X.COM",
            "position": "TESTER",
            "password": "pw2"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let error: ApiError = common::parse(body);
    assert_eq!(error.status, 409);
    assert_eq!(error.path, "/auth/register");
    assert_eq!(error.message, "Employee with email ada@x.com already exists");
}

#[actix_rt::test]
async fn test_login_failures_look_the_same() {
    let app = test_app!(test_services());
    register(&app, "Ada", "ada@x.com", "pw1").await;

    let (wrong_status, wrong_body) = send(
        &app,
        test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "ada@x.com",
            "password": "wrong"
        })),
        None,
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        test::TestRequest::post().uri("/auth/login").set_json(json!({
            "email": "bob@x.com",
            "password": "pw1"
        })),
        None,
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
    assert_eq!(wrong_body["message"], "Invalid credentials");
}

#[actix_rt::test]
async fn test_invalid_payloads_are_bad_requests() {
    let app = test_app!(test_services());

    let (status, body) = send(
        &app,
        test::TestRequest::post().uri("/auth/register").set_json(json!({
            "name": "Ada",
            "email": "not-an-email",
            "position": "DEVELOPER",
            "password": "pw1"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["path"], "/auth/login");
}

#[actix_rt::test]
async fn test_protected_routes_require_a_valid_token() {
    let services = test_services();
    let codec = services.codec.clone();
    let app = test_app!(services);
    register(&app, "Ada", "ada@x.com", "pw1").await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/employees"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["path"], "/employees");

    let expired = codec
        .issue_at("ada@x.com", Map::new(), Utc::now() - Duration::hours(25))
        .unwrap();
    let foreign = TokenCodec::new(
        std::sync::Arc::new(StaticSigningKey::new("not-the-server-secret")),
        Duration::hours(1),
    )
    .issue("ada@x.com", Map::new())
    .unwrap();

    for token in ["garbage", expired.as_str(), foreign.as_str()] {
        let (status, _) = send(&app, test::TestRequest::get().uri("/tasks"), Some(token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "token {} was accepted", token);
    }

    let (status, _) = send(&app, test::TestRequest::get().uri("/health"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_token_of_deleted_employee_is_rejected() {
    let app = test_app!(test_services());
    let ada = register(&app, "Ada", "ada@x.com", "pw1").await;
    let grace = register(&app, "Grace", "grace@x.com", "pw1").await;

    let ada_id = me(&app, &ada).await["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        test::TestRequest::delete().uri(&format!("/employees/{}", ada_id)),
        Some(&grace),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, test::TestRequest::get().uri("/employees/me"), Some(&ada)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
