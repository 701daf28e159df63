//! API router — mounts all CRM endpoints under /api behind the auth middleware.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::auth_middleware;
use crate::handlers::{self, ManagementState};

/// Build the router with all endpoints.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        // Operational
        .route("/health", get(handlers::health_check))
        // Auth
        .route("/api/auth/config", get(handlers::auth_config))
        .route("/api/auth/google", post(handlers::google_sign_in))
        .route("/api/auth/signout", post(handlers::sign_out))
        .route("/api/auth/me", get(handlers::current_user))
        // Dashboard
        .route("/api/dashboard/stats", get(handlers::dashboard_stats))
        // Customers
        .route("/api/customers", get(handlers::list_customers).post(handlers::import_customers))
        // Segments
        .route("/api/segments", get(handlers::list_segments).post(handlers::create_segment))
        .route("/api/segments/preview", post(handlers::preview_segment))
        .route("/api/segments/:id", get(handlers::get_segment).delete(handlers::delete_segment))
        // Campaigns
        .route("/api/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/campaigns/:id", get(handlers::get_campaign))
        .route("/api/campaigns/:id/activate", post(handlers::activate_campaign))
        .route("/api/campaigns/:id/pause", post(handlers::pause_campaign))
        .route("/api/campaigns/:id/complete", post(handlers::complete_campaign))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
