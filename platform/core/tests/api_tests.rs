// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

mod common;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cheongwon_core::domain::credentials::TokenRevoker;
use cheongwon_core::domain::policy::{PolicySnapshot, SubmissionPolicy};
use cheongwon_core::domain::user::{Role, User};
use cheongwon_core::presentation::api::{self, AppState};

use common::Harness;

fn router(h: &Harness) -> Router {
    let state = AppState {
        petition_service: h.petitions.clone(),
        user_service: h.users.clone(),
        token_revoker: h.revoker.clone(),
        policy: PolicySnapshot::from_submission_policy(&SubmissionPolicy::default()),
        metrics: None,
        start_time: Instant::now(),
    };
    api::app(Arc::new(state))
}

fn as_caller(builder: axum::http::request::Builder, user: &User, token: &str) -> axum::http::request::Builder {
    builder
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(api::HEADER_USER_ID, user.id.to_string())
        .header(api::HEADER_USER_EMAIL, user.email.as_str())
        .header(api::HEADER_USER_ROLE, user.role.as_str())
}

fn json_request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn petition_body(title: &str) -> Value {
    json!({
        "title": title,
        "category": "campus",
        "content": "Open the north gate on weekends.",
        "links": ["https://www.hufs.ac.kr/notice/1"]
    })
}

async fn create(app: &Router, author: &User, title: &str) -> Value {
    let body = petition_body(title);
    let request = as_caller(json_request("POST", "/api/petitions"), author, "author-token")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, created) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    created
}

#[tokio::test]
async fn test_health_and_policy() {
    let h = Harness::new();
    let app = router(&h);

    let (status, _, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = send(&app, Request::get("/api/policy").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submission_interval_days"], 7);
    assert_eq!(body["agreement_threshold"], 10);
    assert_eq!(body["petition_active_period_days"], 30);

    let (status, _, _) = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_petition_lifecycle_over_http() {
    let h = Harness::new();
    let app = router(&h);
    let author = h.seed_user("author@hufs.ac.kr").await;
    let voter = h.seed_user("voter@hufs.ac.kr").await;

    let created = create(&app, &author, "North gate").await;
    assert_eq!(created["status"], "ONGOING");
    assert_eq!(created["agree_count"], 0);
    assert_eq!(created["links"], json!(["https://www.hufs.ac.kr/notice/1"]));
    let id = created["petition_id"].as_i64().unwrap();

    let request = as_caller(Request::post(format!("/api/petitions/{}/agreements", id)), &voter, "voter-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, agreement) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(agreement["petition_id"], id);

    let request = as_caller(Request::post(format!("/api/petitions/{}/agreements", id)), &voter, "voter-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_AGREED");

    let request = as_caller(Request::get(format!("/api/petitions/{}/agreements/me", id)), &voter, "voter-token")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(&app, request).await;
    assert_eq!(body, json!({"agreed": true}));

    let request = as_caller(Request::get(format!("/api/petitions/{}/reports/me", id)), &voter, "voter-token")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(&app, request).await;
    assert_eq!(body, json!({"reported": false}));

    let (status, _, viewed) = send(
        &app,
        Request::get(format!("/api/petitions/{}", id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["view_count"], 1);
    assert_eq!(viewed["agree_count"], 1);

    let (status, _, page) = send(
        &app,
        Request::get("/api/petitions?status=ongoing&page=0&size=5").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["size"], 5);
    assert_eq!(page["petitions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_error_bodies() {
    let h = Harness::new();
    let app = router(&h);
    let author = h.seed_user("author@hufs.ac.kr").await;

    let (status, _, body) = send(&app, Request::get("/api/petitions/42").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PETITION_NOT_FOUND");
    assert!(body["message"].is_string());

    let (status, _, body) = send(&app, Request::get("/api/petitions/abc").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, _, body) = send(
        &app,
        Request::get("/api/petitions?status=pending").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    create(&app, &author, "First").await;
    let body = petition_body("Second");
    let request = as_caller(json_request("POST", "/api/petitions"), &author, "author-token")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "PETITION_TOO_FREQUENT");
}

#[tokio::test]
async fn test_caller_headers_required() {
    let h = Harness::new();
    let app = router(&h);

    let body = petition_body("Anonymous");
    let request = json_request("POST", "/api/petitions")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let request = Request::post("/api/petitions/1/agreements")
        .header(header::AUTHORIZATION, "Bearer some-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_token_rejected() {
    let h = Harness::new();
    let app = router(&h);
    let user = h.seed_user("user@hufs.ac.kr").await;
    h.revoker.destroy_token(&user.email, "stale-token");

    let request = as_caller(Request::get("/api/petitions/1/agreements/me"), &user, "stale-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let h = Harness::new();
    let app = router(&h);
    let author = h.seed_user("author@hufs.ac.kr").await;
    let admin = h.seed_user_with_role("admin@hufs.ac.kr", Role::Admin).await;
    let id = create(&app, &author, "Moderated").await["petition_id"].as_i64().unwrap();

    let request = as_caller(
        json_request("PUT", &format!("/api/admin/petitions/{}/status", id)),
        &author,
        "author-token",
    )
    .body(Body::from(json!({"status": "closed"}).to_string()))
    .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let request = as_caller(
        json_request("PUT", &format!("/api/admin/petitions/{}/status", id)),
        &admin,
        "admin-token",
    )
    .body(Body::from(json!({"status": "WAITING"}).to_string()))
    .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "WAITING");

    let request = as_caller(Request::delete(format!("/api/admin/petitions/{}", id)), &admin, "admin-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["petition_id"], id);
    assert_eq!(body["status"], "WAITING");

    let request = as_caller(Request::delete(format!("/api/admin/petitions/{}", id)), &admin, "admin-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_and_certification_over_http() {
    let h = Harness::new();
    let app = router(&h);

    let request = json_request("POST", "/api/users")
        .body(Body::from(json!({"email": "fresh@hufs.ac.kr", "password": "pw"}).to_string()))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "EMAIL_UNCERTIFIED");

    let request = json_request("POST", "/api/users/email/certify")
        .body(Body::from(json!({"email": "fresh@hufs.ac.kr", "code": 1111}).to_string()))
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(headers.get(header::SET_COOKIE).is_none());

    let request = json_request("POST", "/api/users/email/certify")
        .body(Body::from(json!({"email": "fresh@hufs.ac.kr", "code": 1234}).to_string()))
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("verified_email=fresh@hufs.ac.kr"));
    assert!(cookie.contains("Max-Age=600"));

    let request = json_request("POST", "/api/users")
        .body(Body::from(json!({"email": "fresh@hufs.ac.kr", "password": "pw"}).to_string()))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "fresh@hufs.ac.kr");
    assert_eq!(body["role"], "USER");

    let request = json_request("POST", "/api/users")
        .body(Body::from(json!({"email": "fresh@hufs.ac.kr", "password": "pw"}).to_string()))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_DUPLICATED");
}

#[tokio::test]
async fn test_certify_refuses_cookie_injection() {
    let h = Harness::new();
    let app = router(&h);

    let request = json_request("POST", "/api/users/email/certify")
        .body(Body::from(
            json!({"email": "a@hufs.ac.kr; Domain=evil.example", "code": 1234}).to_string(),
        ))
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_withdraw_over_http() {
    let h = Harness::new();
    let app = router(&h);
    let user = h.seed_user("leaving@hufs.ac.kr").await;

    let request = as_caller(Request::delete("/api/users/me"), &user, "leaving-token")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("refresh=;"));
    assert!(cookie.contains("Max-Age=0"));

    assert!(h.revoker.is_revoked("leaving-token"));
    assert!(!h.repos.users.exists_by_email("leaving@hufs.ac.kr").await.unwrap());

    let request = as_caller(Request::delete("/api/users/me"), &user, "leaving-token")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
