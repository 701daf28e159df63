//! Axum REST handlers for the CRM dashboard API.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use crm_core::config::AppConfig;
use crm_core::error::{CrmError, CrmResult};
use crm_core::types::{Campaign, Customer, DashboardStats, Segment, User};
use crm_segmentation::SegmentMatcher;
use crm_storage::KeyValueStore;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::{AuthManager, BearerToken};
use crate::models::*;
use crate::store::CrmStore;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub store: Arc<CrmStore>,
    pub auth: Arc<AuthManager>,
    pub node_id: String,
    pub google_client_id: Option<String>,
    pub start_time: Instant,
}

impl ManagementState {
    pub fn new(config: &AppConfig, storage: Arc<dyn KeyValueStore>) -> CrmResult<Self> {
        let matcher = SegmentMatcher::new(config.segmentation.empty_rules);
        Ok(Self {
            store: Arc::new(CrmStore::new(storage, matcher)),
            auth: Arc::new(AuthManager::new(&config.auth)?),
            node_id: config.node_id.clone(),
            google_client_id: config.auth.google_client_id.clone(),
            start_time: Instant::now(),
        })
    }
}

/// [`CrmError`] rendered as a JSON error body with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub CrmError);

impl From<CrmError> for ApiError {
    fn from(e: CrmError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            CrmError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            CrmError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "auth_failed"),
            CrmError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "Request failed");
            metrics::counter!("crm.api.errors").increment(1);
            "Internal processing error".to_string()
        } else {
            warn!(error = %self.0, status = status.as_u16(), "Request rejected");
            self.0.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(CrmError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(CrmError::Validation(rejection.body_text()))
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// `Json` body extractor that rejects with an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor that rejects with an [`ApiError`] body.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

// ─── Operational ───────────────────────────────────────────────────────────

pub async fn health_check(State(state): State<ManagementState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn auth_config(State(state): State<ManagementState>) -> Json<AuthConfigResponse> {
    Json(AuthConfigResponse {
        google_client_id: state.google_client_id.clone(),
    })
}

pub async fn google_sign_in(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<SignInRequest>,
) -> ApiResult<Json<SignInResponse>> {
    let session = state.auth.sign_in(req.credential.as_deref())?;
    Ok(Json(SignInResponse {
        token: session.token,
        user: session.user,
        expires_at: session.expires_at,
    }))
}

pub async fn sign_out(
    State(state): State<ManagementState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> StatusCode {
    state.auth.sign_out(&token);
    StatusCode::NO_CONTENT
}

pub async fn current_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

// ─── Dashboard ─────────────────────────────────────────────────────────────

pub async fn dashboard_stats(State(state): State<ManagementState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.store.dashboard_stats()?))
}

// ─── Customers ─────────────────────────────────────────────────────────────

pub async fn list_customers(State(state): State<ManagementState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.store.list_customers()?))
}

pub async fn import_customers(
    State(state): State<ManagementState>,
    AppJson(customers): AppJson<Vec<Customer>>,
) -> ApiResult<(StatusCode, Json<ImportCustomersResponse>)> {
    let imported = state.store.import_customers(customers)?;
    metrics::counter!("crm.customers.imported").increment(imported as u64);
    Ok((StatusCode::CREATED, Json(ImportCustomersResponse { imported })))
}

// ─── Segments ──────────────────────────────────────────────────────────────

pub async fn list_segments(
    State(state): State<ManagementState>,
    Query(query): Query<SegmentQuery>,
) -> ApiResult<Json<Vec<Segment>>> {
    Ok(Json(state.store.list_segments(query.q.as_deref())?))
}

pub async fn get_segment(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Segment>> {
    Ok(Json(state.store.get_segment(id)?))
}

pub async fn create_segment(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<CreateSegmentRequest>,
) -> ApiResult<(StatusCode, Json<CreatedSegment>)> {
    let created = state.store.create_segment(req)?;
    metrics::counter!("crm.segments.created").increment(1);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn preview_segment(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<PreviewSegmentRequest>,
) -> ApiResult<Json<SegmentPreview>> {
    metrics::counter!("crm.segments.previews").increment(1);
    Ok(Json(state.store.preview_segment(&req.rules)?))
}

pub async fn delete_segment(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.store.delete_segment(id)?;
    metrics::counter!("crm.segments.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> ApiResult<Json<Vec<Campaign>>> {
    Ok(Json(state.store.list_campaigns()?))
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.get_campaign(id)?))
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    AppJson(req): AppJson<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let campaign = state.store.create_campaign(req)?;
    metrics::counter!("crm.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn activate_campaign(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.activate_campaign(id)?))
}

pub async fn pause_campaign(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.pause_campaign(id)?))
}

pub async fn complete_campaign(
    State(state): State<ManagementState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.store.complete_campaign(id)?))
}
