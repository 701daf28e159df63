//! Segment builder — fluent API for assembling a segment and caching its size.

use crm_core::error::{CrmError, CrmResult};
use crm_core::types::{Customer, Segment};
use tracing::info;
use uuid::Uuid;

use crate::engine::SegmentMatcher;

pub struct SegmentBuilder {
    name: String,
    description: String,
    rules: Vec<String>,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into));
        self
    }

    /// Validate and build the segment. The customer count is computed once
    /// here against `customers` and is not refreshed later.
    pub fn build(self, matcher: &SegmentMatcher, customers: &[Customer]) -> CrmResult<Segment> {
        if self.name.trim().is_empty() || self.description.trim().is_empty() || self.rules.is_empty()
        {
            return Err(CrmError::Validation(
                "Please fill in all fields and define at least one rule.".to_string(),
            ));
        }

        let customer_count = matcher.match_count(&self.rules, customers) as u64;
        let segment = Segment {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            rules: self.rules,
            customer_count,
            created_at: chrono::Utc::now(),
        };
        info!(
            segment_id = %segment.id,
            name = %segment.name,
            rules = segment.rules.len(),
            customer_count,
            "Segment built"
        );
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, total: f64) -> Customer {
        Customer {
            id: id.to_string(),
            name: format!("Customer {id}"),
            email: format!("{id}@example.com"),
            phone: "555-0100".to_string(),
            total_purchases: total,
        }
    }

    #[test]
    fn test_build_caches_customer_count() {
        let customers = vec![customer("a", 1.0), customer("b", 3.0), customer("c", 9.0)];
        let segment = SegmentBuilder::new("Repeat buyers")
            .description("Bought more than once")
            .rule("totalPurchases > 1")
            .build(&SegmentMatcher::default(), &customers)
            .unwrap();

        assert_eq!(segment.customer_count, 2);
        assert_eq!(segment.rules, vec!["totalPurchases > 1".to_string()]);
    }

    #[test]
    fn test_build_keeps_rule_order() {
        let segment = SegmentBuilder::new("Mid spenders")
            .description("Between 2 and 10")
            .rules(["totalPurchases > 2", "totalPurchases < 10"])
            .rule("name != Nobody")
            .build(&SegmentMatcher::default(), &[])
            .unwrap();
        assert_eq!(
            segment.rules,
            vec!["totalPurchases > 2", "totalPurchases < 10", "name != Nobody"]
        );
        assert_eq!(segment.customer_count, 0);
    }

    #[test]
    fn test_build_requires_rules_name_and_description() {
        let matcher = SegmentMatcher::default();
        assert!(matches!(
            SegmentBuilder::new("No rules").description("d").build(&matcher, &[]),
            Err(CrmError::Validation(_))
        ));
        assert!(matches!(
            SegmentBuilder::new("  ").description("d").rule("totalPurchases > 1").build(&matcher, &[]),
            Err(CrmError::Validation(_))
        ));
        assert!(matches!(
            SegmentBuilder::new("No description").rule("totalPurchases > 1").build(&matcher, &[]),
            Err(CrmError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_rule_still_builds_with_zero_count() {
        let customers = vec![customer("a", 50.0)];
        let segment = SegmentBuilder::new("Broken")
            .description("Operator typo")
            .rule("totalPurchases >= 5")
            .build(&SegmentMatcher::default(), &customers)
            .unwrap();
        assert_eq!(segment.customer_count, 0);
    }
}
