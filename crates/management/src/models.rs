//! API request/response types for the CRM dashboard.

use chrono::{DateTime, Utc};
use crm_core::types::{Segment, User};
use crm_segmentation::RuleWarning;
use serde::{Deserialize, Serialize};

// ─── Segments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSegmentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewSegmentRequest {
    #[serde(default)]
    pub rules: Vec<String>,
}

/// Live match count for a rule set that has not been saved yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPreview {
    pub matching_customers: usize,
    pub warnings: Vec<RuleWarning>,
}

/// A saved segment plus the rules in it that can never match.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSegment {
    #[serde(flatten)]
    pub segment: Segment,
    pub warnings: Vec<RuleWarning>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SegmentQuery {
    pub q: Option<String>,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ─── Customers ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ImportCustomersResponse {
    pub imported: usize,
}

// ─── Auth ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SignInRequest {
    /// Google ID token from the sign-in button. Presence is checked; contents are not.
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigResponse {
    pub google_client_id: Option<String>,
}

// ─── Operational ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
