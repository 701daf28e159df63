//! CRM store — customers, segments, and campaigns kept behind a key-value store.
//!
//! Each collection is one JSON array under its key. Writes are read-modify-write
//! and serialized through a single lock; reads go straight to storage.

use std::sync::Arc;

use chrono::Utc;
use crm_core::error::{CrmError, CrmResult};
use crm_core::types::{Campaign, CampaignStatus, Customer, DashboardStats, Segment};
use crm_segmentation::{validate_rules, SegmentBuilder, SegmentMatcher};
use crm_storage::{keys, load_json, save_json, KeyValueStore};
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::models::{CreateCampaignRequest, CreateSegmentRequest, CreatedSegment, SegmentPreview};

pub struct CrmStore {
    storage: Arc<dyn KeyValueStore>,
    matcher: SegmentMatcher,
    write_lock: Mutex<()>,
}

impl CrmStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, matcher: SegmentMatcher) -> Self {
        info!(
            empty_rules = ?matcher.empty_rule_policy(),
            "CRM store initialized"
        );
        Self {
            storage,
            matcher,
            write_lock: Mutex::new(()),
        }
    }

    fn load_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> CrmResult<Vec<T>> {
        Ok(load_json::<Vec<T>>(self.storage.as_ref(), key)?.unwrap_or_default())
    }

    fn save_list<T: serde::Serialize>(&self, key: &str, items: &[T]) -> CrmResult<()> {
        save_json(self.storage.as_ref(), key, items)
    }

    // ─── Customers ─────────────────────────────────────────────────────────

    pub fn list_customers(&self) -> CrmResult<Vec<Customer>> {
        self.load_list(keys::CUSTOMERS)
    }

    /// Merge customers into the store. An incoming record replaces an existing
    /// one with the same id; new ids are appended in input order.
    pub fn import_customers(&self, incoming: Vec<Customer>) -> CrmResult<usize> {
        let _guard = self.write_lock.lock();
        let mut customers: Vec<Customer> = self.load_list(keys::CUSTOMERS)?;
        let imported = incoming.len();
        for customer in incoming {
            match customers.iter_mut().find(|c| c.id == customer.id) {
                Some(existing) => *existing = customer,
                None => customers.push(customer),
            }
        }
        self.save_list(keys::CUSTOMERS, &customers)?;
        info!(imported, total = customers.len(), "Customers imported");
        Ok(imported)
    }

    // ─── Segments ──────────────────────────────────────────────────────────

    /// List segments, optionally filtered by a case-insensitive name substring.
    pub fn list_segments(&self, query: Option<&str>) -> CrmResult<Vec<Segment>> {
        let segments: Vec<Segment> = self.load_list(keys::SEGMENTS)?;
        let needle = query.map(str::trim).unwrap_or_default().to_lowercase();
        if needle.is_empty() {
            return Ok(segments);
        }
        Ok(segments
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub fn get_segment(&self, id: Uuid) -> CrmResult<Segment> {
        self.load_list::<Segment>(keys::SEGMENTS)?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CrmError::not_found("segment", id))
    }

    /// Save a segment with its member count as of now. Malformed rules do not
    /// block creation; they come back as warnings.
    pub fn create_segment(&self, req: CreateSegmentRequest) -> CrmResult<CreatedSegment> {
        let _guard = self.write_lock.lock();
        let customers = self.list_customers()?;
        let warnings = validate_rules(&req.rules);
        let segment = SegmentBuilder::new(req.name)
            .description(req.description)
            .rules(req.rules)
            .build(&self.matcher, &customers)?;

        let mut segments: Vec<Segment> = self.load_list(keys::SEGMENTS)?;
        segments.push(segment.clone());
        self.save_list(keys::SEGMENTS, &segments)?;
        info!(
            segment_id = %segment.id,
            customer_count = segment.customer_count,
            warnings = warnings.len(),
            "Segment created"
        );
        Ok(CreatedSegment { segment, warnings })
    }

    /// Count matches for an unsaved rule set and report malformed rules.
    pub fn preview_segment(&self, rules: &[String]) -> CrmResult<SegmentPreview> {
        let customers = self.list_customers()?;
        Ok(SegmentPreview {
            matching_customers: self.matcher.match_count(rules, &customers),
            warnings: validate_rules(rules),
        })
    }

    pub fn delete_segment(&self, id: Uuid) -> CrmResult<()> {
        let _guard = self.write_lock.lock();
        let mut segments: Vec<Segment> = self.load_list(keys::SEGMENTS)?;
        let before = segments.len();
        segments.retain(|s| s.id != id);
        if segments.len() == before {
            return Err(CrmError::not_found("segment", id));
        }
        self.save_list(keys::SEGMENTS, &segments)?;
        info!(segment_id = %id, "Segment deleted");
        Ok(())
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    /// Newest first.
    pub fn list_campaigns(&self) -> CrmResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self.load_list(keys::CAMPAIGNS)?;
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    pub fn get_campaign(&self, id: Uuid) -> CrmResult<Campaign> {
        self.load_list::<Campaign>(keys::CAMPAIGNS)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CrmError::not_found("campaign", id))
    }

    pub fn create_campaign(&self, req: CreateCampaignRequest) -> CrmResult<Campaign> {
        if req.name.trim().is_empty() || req.description.trim().is_empty() {
            return Err(CrmError::Validation("Please fill in all fields.".to_string()));
        }

        let _guard = self.write_lock.lock();
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: req.name,
            description: req.description,
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        let mut campaigns: Vec<Campaign> = self.load_list(keys::CAMPAIGNS)?;
        campaigns.push(campaign.clone());
        self.save_list(keys::CAMPAIGNS, &campaigns)?;
        info!(campaign_id = %campaign.id, name = %campaign.name, "Campaign created");
        Ok(campaign)
    }

    pub fn activate_campaign(&self, id: Uuid) -> CrmResult<Campaign> {
        self.transition_campaign(id, CampaignStatus::Active)
    }

    pub fn pause_campaign(&self, id: Uuid) -> CrmResult<Campaign> {
        self.transition_campaign(id, CampaignStatus::Paused)
    }

    pub fn complete_campaign(&self, id: Uuid) -> CrmResult<Campaign> {
        self.transition_campaign(id, CampaignStatus::Completed)
    }

    fn transition_campaign(&self, id: Uuid, to: CampaignStatus) -> CrmResult<Campaign> {
        let _guard = self.write_lock.lock();
        let mut campaigns: Vec<Campaign> = self.load_list(keys::CAMPAIGNS)?;
        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CrmError::not_found("campaign", id))?;

        let from = campaign.status;
        if !is_valid_transition(from, to) {
            return Err(CrmError::Validation(format!(
                "Cannot move campaign from {from:?} to {to:?}"
            )));
        }
        campaign.status = to;
        campaign.updated_at = Utc::now();
        let updated = campaign.clone();

        self.save_list(keys::CAMPAIGNS, &campaigns)?;
        info!(campaign_id = %id, ?from, ?to, "Campaign status changed");
        Ok(updated)
    }

    // ─── Dashboard ─────────────────────────────────────────────────────────

    pub fn dashboard_stats(&self) -> CrmResult<DashboardStats> {
        let campaigns: Vec<Campaign> = self.load_list(keys::CAMPAIGNS)?;
        Ok(DashboardStats {
            total_customers: self.list_customers()?.len() as u64,
            total_segments: self.load_list::<Segment>(keys::SEGMENTS)?.len() as u64,
            total_campaigns: campaigns.len() as u64,
            active_campaigns: campaigns
                .iter()
                .filter(|c| c.status == CampaignStatus::Active)
                .count() as u64,
        })
    }

    /// Load a handful of sample customers for local development.
    pub fn seed_demo_data(&self) -> CrmResult<usize> {
        let demo = [
            ("1", "Alice Johnson", "alice@example.com", "555-0101", 12.0),
            ("2", "Bob Smith", "bob@example.com", "555-0102", 3.0),
            ("3", "Carol White", "carol@example.com", "555-0103", 0.0),
            ("4", "Dan Brown", "dan@example.com", "555-0104", 27.0),
            ("5", "Eve Davis", "eve@example.com", "555-0105", 5.0),
        ]
        .into_iter()
        .map(|(id, name, email, phone, total)| Customer {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            total_purchases: total,
        })
        .collect();
        self.import_customers(demo)
    }
}

fn is_valid_transition(from: CampaignStatus, to: CampaignStatus) -> bool {
    use CampaignStatus::*;
    matches!(
        (from, to),
        (Draft, Active) | (Paused, Active) | (Active, Paused) | (Active, Completed) | (Paused, Completed)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::EmptyRulePolicy;
    use crm_storage::MemoryStore;

    fn store() -> CrmStore {
        let store = CrmStore::new(Arc::new(MemoryStore::new()), SegmentMatcher::default());
        store.seed_demo_data().unwrap();
        store
    }

    fn segment_req(name: &str, rules: &[&str]) -> CreateSegmentRequest {
        CreateSegmentRequest {
            name: name.to_string(),
            description: format!("{name} description"),
            rules: rules.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn campaign_req(name: &str) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: name.to_string(),
            description: "Spring promotion".to_string(),
        }
    }

    #[test]
    fn test_import_replaces_existing_ids() {
        let store = store();
        assert_eq!(store.list_customers().unwrap().len(), 5);

        let updated = Customer {
            id: "2".to_string(),
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            phone: "555-0102".to_string(),
            total_purchases: 99.0,
        };
        assert_eq!(store.import_customers(vec![updated]).unwrap(), 1);

        let customers = store.list_customers().unwrap();
        assert_eq!(customers.len(), 5);
        assert_eq!(customers[1].total_purchases, 99.0);
    }

    #[test]
    fn test_segment_count_is_cached_at_creation() {
        let store = store();
        let created = store
            .create_segment(segment_req("Big spenders", &["totalPurchases > 10"]))
            .unwrap();
        assert!(created.warnings.is_empty());
        let segment = created.segment;
        assert_eq!(segment.customer_count, 2);

        store
            .import_customers(vec![Customer {
                id: "6".to_string(),
                name: "Frank Green".to_string(),
                email: "frank@example.com".to_string(),
                phone: "555-0106".to_string(),
                total_purchases: 500.0,
            }])
            .unwrap();

        let reloaded = store.get_segment(segment.id).unwrap();
        assert_eq!(reloaded.customer_count, 2);
        let preview = store.preview_segment(&segment.rules).unwrap();
        assert_eq!(preview.matching_customers, 3);
    }

    #[test]
    fn test_create_segment_requires_rules() {
        let store = store();
        let result = store.create_segment(segment_req("Empty", &[]));
        assert!(matches!(result, Err(CrmError::Validation(_))));
        assert!(store.list_segments(None).unwrap().is_empty());
    }

    #[test]
    fn test_search_segments_case_insensitive() {
        let store = store();
        store.create_segment(segment_req("Big Spenders", &["totalPurchases > 10"])).unwrap();
        store.create_segment(segment_req("Dormant", &["totalPurchases = 0"])).unwrap();

        let found = store.list_segments(Some("spend")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Big Spenders");
        assert_eq!(store.list_segments(Some("  ")).unwrap().len(), 2);
        assert!(store.list_segments(Some("vip")).unwrap().is_empty());
    }

    #[test]
    fn test_preview_reports_warnings() {
        let store = store();
        let rules = vec!["totalPurchases > 1".to_string(), "totalPurchases >= 5".to_string()];
        let preview = store.preview_segment(&rules).unwrap();
        assert_eq!(preview.matching_customers, 0);
        assert_eq!(preview.warnings.len(), 1);
        assert_eq!(preview.warnings[0].index, 1);
    }

    #[test]
    fn test_create_segment_returns_rule_warnings() {
        let store = store();
        let created = store
            .create_segment(segment_req("Typo", &["totalPurchases > 1", "age > 30"]))
            .unwrap();
        assert_eq!(created.segment.customer_count, 0);
        assert_eq!(created.warnings.len(), 1);
        assert_eq!(created.warnings[0].index, 1);
        assert_eq!(created.warnings[0].rule, "age > 30");
        assert_eq!(store.get_segment(created.segment.id).unwrap().rules.len(), 2);
    }

    #[test]
    fn test_preview_with_no_rules_follows_policy() {
        let match_all = CrmStore::new(
            Arc::new(MemoryStore::new()),
            SegmentMatcher::new(EmptyRulePolicy::MatchAll),
        );
        match_all.seed_demo_data().unwrap();
        assert_eq!(match_all.preview_segment(&[]).unwrap().matching_customers, 5);
        assert_eq!(store().preview_segment(&[]).unwrap().matching_customers, 0);
    }

    #[test]
    fn test_delete_segment() {
        let store = store();
        let segment = store.create_segment(segment_req("Temp", &["name = Bob"])).unwrap().segment;
        store.delete_segment(segment.id).unwrap();
        assert!(matches!(
            store.get_segment(segment.id),
            Err(CrmError::NotFound { entity: "segment", .. })
        ));
        assert!(store.delete_segment(segment.id).is_err());
    }

    #[test]
    fn test_create_campaign_requires_fields() {
        let store = store();
        let result = store.create_campaign(CreateCampaignRequest {
            name: "Launch".to_string(),
            description: String::new(),
        });
        assert!(matches!(result, Err(CrmError::Validation(_))));
    }

    #[test]
    fn test_campaign_lifecycle_updates_stats() {
        let store = store();
        let a = store.create_campaign(campaign_req("Spring Sale")).unwrap();
        let b = store.create_campaign(campaign_req("Summer Sale")).unwrap();
        assert_eq!(a.status, CampaignStatus::Draft);

        store.activate_campaign(a.id).unwrap();
        store.activate_campaign(b.id).unwrap();
        store.pause_campaign(b.id).unwrap();

        let stats = store.dashboard_stats().unwrap();
        assert_eq!(stats.total_customers, 5);
        assert_eq!(stats.total_campaigns, 2);
        assert_eq!(stats.active_campaigns, 1);

        let completed = store.complete_campaign(a.id).unwrap();
        assert_eq!(completed.status, CampaignStatus::Completed);
        assert_eq!(store.dashboard_stats().unwrap().active_campaigns, 0);
    }

    #[test]
    fn test_invalid_campaign_transition() {
        let store = store();
        let campaign = store.create_campaign(campaign_req("Flash Sale")).unwrap();
        assert!(matches!(
            store.pause_campaign(campaign.id),
            Err(CrmError::Validation(_))
        ));
        assert!(matches!(
            store.activate_campaign(Uuid::new_v4()),
            Err(CrmError::NotFound { entity: "campaign", .. })
        ));
    }

    #[test]
    fn test_list_campaigns_newest_first() {
        let store = store();
        let first = store.create_campaign(campaign_req("First")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create_campaign(campaign_req("Second")).unwrap();
        let ids: Vec<Uuid> = store.list_campaigns().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(store.get_campaign(first.id).unwrap().name, "First");
    }
}
