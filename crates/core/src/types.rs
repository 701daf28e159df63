use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer record as imported from the external customer store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub total_purchases: f64,
}

/// A named group of customers defined by a conjunction of rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Rule strings in the order they were entered.
    pub rules: Vec<String>,
    /// Match count at creation time. Not refreshed when customers change.
    pub customer_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

/// Signed-in dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Headline counters shown on the dashboard landing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: u64,
    pub total_segments: u64,
    pub total_campaigns: u64,
    pub active_campaigns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_json_uses_camel_case() {
        let customer: Customer = serde_json::from_str(
            r#"{"id":"c1","name":"Ada","email":"ada@example.com","phone":"555-0100","totalPurchases":12}"#,
        )
        .unwrap();
        assert_eq!(customer.total_purchases, 12.0);

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["totalPurchases"], 12.0);
    }

    #[test]
    fn test_campaign_status_serializes_snake_case() {
        let json = serde_json::to_string(&CampaignStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        assert_eq!(CampaignStatus::default(), CampaignStatus::Draft);
    }
}
