// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API
//!
//! axum router over the petition and user services.
//!
//! Callers are authenticated upstream. The gateway forwards the access token
//! as `Authorization: Bearer …` together with `X-User-Id`, `X-User-Email` and
//! `X-User-Role`; the [`Caller`] extractor reads those headers and refuses
//! tokens on the revocation blacklist. Every error body is
//! `{"code": …, "message": …}`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::error::ServiceError;
use crate::application::petition_service::{
    CreatePetitionRequest, PetitionResponse, PetitionService, DEFAULT_PAGE_SIZE,
};
use crate::application::user_service::{
    normalize_email, EmailCertifyRequest, EmailSendRequest, SignupRequest, UserService,
};
use crate::domain::credentials::TokenRevoker;
use crate::domain::petition::{PetitionId, PetitionStatus};
use crate::domain::policy::{PolicySnapshot, EMAIL_COOKIE_MAX_AGE};
use crate::domain::user::{Role, UserId};

pub const VERIFIED_EMAIL_COOKIE: &str = "verified_email";
pub const REFRESH_COOKIE: &str = "refresh";

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_USER_EMAIL: &str = "x-user-email";
pub const HEADER_USER_ROLE: &str = "x-user-role";

pub struct AppState {
    pub petition_service: Arc<dyn PetitionService>,
    pub user_service: Arc<dyn UserService>,
    pub token_revoker: Arc<dyn TokenRevoker>,
    pub policy: PolicySnapshot,
    pub metrics: Option<PrometheusHandle>,
    pub start_time: Instant,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/policy", get(policy_handler))
        .route("/api/users", post(register_handler))
        .route("/api/users/email/send", post(send_email_code_handler))
        .route("/api/users/email/certify", post(certify_email_code_handler))
        .route("/api/users/me", delete(withdraw_handler))
        .route("/api/petitions", get(list_petitions_handler).post(create_petition_handler))
        .route("/api/petitions/{id}", get(get_petition_handler))
        .route("/api/petitions/{id}/agreements", post(agree_handler))
        .route("/api/petitions/{id}/agreements/me", get(has_agreed_handler))
        .route("/api/petitions/{id}/reports", post(report_handler))
        .route("/api/petitions/{id}/reports/me", get(has_reported_handler))
        .route("/api/admin/petitions/{id}", delete(delete_petition_handler))
        .route("/api/admin/petitions/{id}/status", put(update_status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Duplicate(_) => StatusCode::CONFLICT,
            ServiceError::InvalidState(_) => StatusCode::CONFLICT,
            ServiceError::PetitionTooFrequent => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::EmailNotCertified => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Certification(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &err {
            ServiceError::Repository(inner) => {
                error!(error = %inner, "Repository failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        Self::new(status, err.code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "code": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Caller identity
// ============================================================================

/// Identity forwarded by the authentication gateway.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub token: String,
}

impl Caller {
    fn require_admin(&self) -> ApiResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::new(StatusCode::FORBIDDEN, "FORBIDDEN", "administrator role required"))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = header_str(&parts.headers, header::AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        if state.token_revoker.is_revoked(token) {
            return Err(ApiError::unauthorized("token has been revoked"));
        }

        let user_id = header_str(&parts.headers, HEADER_USER_ID)
            .and_then(|v| UserId::from_string(v).ok())
            .ok_or_else(|| ApiError::unauthorized("missing or invalid caller id"))?;
        let email = header_str(&parts.headers, HEADER_USER_EMAIL)
            .ok_or_else(|| ApiError::unauthorized("missing caller email"))?
            .to_string();
        let role = match header_str(&parts.headers, HEADER_USER_ROLE) {
            Some(raw) => Role::parse(raw).ok_or_else(|| ApiError::unauthorized("unknown caller role"))?,
            None => Role::User,
        };

        Ok(Caller {
            user_id,
            email,
            role,
            token: token.to_string(),
        })
    }
}

fn parse_petition_id(raw: &str) -> ApiResult<PetitionId> {
    PetitionId::from_string(raw).map_err(|_| ApiError::bad_request(format!("'{}' is not a petition id", raw)))
}

fn parse_status(raw: &str) -> ApiResult<PetitionStatus> {
    PetitionStatus::parse(raw).ok_or_else(|| ApiError::bad_request(format!("unknown petition status '{}'", raw)))
}

fn cookie(name: &str, value: &str, max_age: i64) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        name, value, max_age
    ))
    .map_err(|_| ApiError::bad_request("value cannot be stored in a cookie"))
}

// ============================================================================
// Operational handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn policy_handler(State(state): State<Arc<AppState>>) -> Json<PolicySnapshot> {
    Json(state.policy.clone())
}

// ============================================================================
// Users
// ============================================================================

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = state.user_service.register_user(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn send_email_code_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailSendRequest>,
) -> ApiResult<impl IntoResponse> {
    let payload = state.user_service.send_email_code(&request.email).await?;
    Ok(Json(payload))
}

async fn certify_email_code_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailCertifyRequest>,
) -> ApiResult<Response> {
    let payload = state
        .user_service
        .certify_email_code(&request.email, request.code)
        .await?;

    let certified = payload.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
    let mut response = Json(payload).into_response();
    if certified {
        let email = normalize_email(&request.email)
            .ok_or_else(|| ApiError::bad_request("email cannot be stored in a cookie"))?;
        response
            .headers_mut()
            .append(header::SET_COOKIE, cookie(VERIFIED_EMAIL_COOKIE, &email, EMAIL_COOKIE_MAX_AGE)?);
    }
    Ok(response)
}

async fn withdraw_handler(State(state): State<Arc<AppState>>, caller: Caller) -> ApiResult<Response> {
    state.user_service.withdraw_user(&caller.email, &caller.token).await?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie(REFRESH_COOKIE, "", 0)?);
    Ok(response)
}

// ============================================================================
// Petitions
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Serialize)]
struct PetitionPage {
    petitions: Vec<PetitionResponse>,
    page: i64,
    size: i64,
}

async fn list_petitions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PetitionPage>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);

    let petitions = state.petition_service.list_petitions(status, page, size).await?;
    Ok(Json(PetitionPage {
        petitions: petitions.iter().map(PetitionResponse::from).collect(),
        page,
        size,
    }))
}

async fn create_petition_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(request): Json<CreatePetitionRequest>,
) -> ApiResult<impl IntoResponse> {
    let petition = state.petition_service.create_petition(request, caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(PetitionResponse::from(petition))))
}

async fn get_petition_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PetitionResponse>> {
    let petition = state.petition_service.get_petition(parse_petition_id(&id)?).await?;
    Ok(Json(PetitionResponse::from(petition)))
}

async fn agree_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let agreement = state
        .petition_service
        .agree_petition(parse_petition_id(&id)?, caller.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(agreement)))
}

async fn has_agreed_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<serde_json::Value>> {
    let agreed = state
        .petition_service
        .has_user_agreed_petition(caller.user_id, parse_petition_id(&id)?)
        .await?;
    Ok(Json(json!({ "agreed": agreed })))
}

async fn report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .petition_service
        .report_petition(parse_petition_id(&id)?, caller.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn has_reported_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<serde_json::Value>> {
    let reported = state
        .petition_service
        .has_user_reported_petition(caller.user_id, parse_petition_id(&id)?)
        .await?;
    Ok(Json(json!({ "reported": reported })))
}

// ============================================================================
// Administration
// ============================================================================

#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
    status: String,
}

async fn delete_petition_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<PetitionResponse>> {
    caller.require_admin()?;
    let snapshot = state.petition_service.delete_petition(parse_petition_id(&id)?).await?;
    Ok(Json(snapshot))
}

async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    caller: Caller,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<PetitionResponse>> {
    caller.require_admin()?;
    let status = parse_status(&request.status)?;
    let petition = state
        .petition_service
        .update_status(parse_petition_id(&id)?, status)
        .await?;
    Ok(Json(PetitionResponse::from(petition)))
}
