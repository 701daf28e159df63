//! CRM dashboard backend — customers, segments, campaigns, dashboard stats,
//! and mocked sign-in.
//!
//! Provides REST API endpoints for the dashboard UI. Data lives in a
//! key-value store held in memory; nothing survives a restart.

pub mod auth;
pub mod handlers;
pub mod models;
pub mod router;
pub mod server;
pub mod store;

pub use auth::AuthManager;
pub use handlers::ManagementState;
pub use router::management_router;
pub use server::ApiServer;
pub use store::CrmStore;
