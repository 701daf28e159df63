//! Segment matcher — filters customers against a conjunction of rule strings.

use crm_core::types::Customer;
use crm_core::EmptyRulePolicy;
use tracing::debug;

use crate::predicates::{Rule, RuleError};

/// Evaluates rule sets against customer lists.
///
/// The lenient entry points (`matches`, `match_count`, `matching_customers`)
/// never fail: a rule that does not parse is unsatisfiable, which under AND
/// means nobody matches. [`SegmentMatcher::try_match_count`] surfaces the
/// parse error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentMatcher {
    empty_rules: EmptyRulePolicy,
}

impl SegmentMatcher {
    pub fn new(empty_rules: EmptyRulePolicy) -> Self {
        Self { empty_rules }
    }

    pub fn empty_rule_policy(&self) -> EmptyRulePolicy {
        self.empty_rules
    }

    pub fn matches<S: AsRef<str>>(&self, rules: &[S], customer: &Customer) -> bool {
        match parse_lenient(rules) {
            Some(parsed) => self.matches_parsed(&parsed, customer),
            None => false,
        }
    }

    pub fn match_count<S: AsRef<str>>(&self, rules: &[S], customers: &[Customer]) -> usize {
        match parse_lenient(rules) {
            Some(parsed) => customers
                .iter()
                .filter(|c| self.matches_parsed(&parsed, c))
                .count(),
            None => 0,
        }
    }

    pub fn matching_customers<'c, S: AsRef<str>>(
        &self,
        rules: &[S],
        customers: &'c [Customer],
    ) -> Vec<&'c Customer> {
        match parse_lenient(rules) {
            Some(parsed) => customers
                .iter()
                .filter(|c| self.matches_parsed(&parsed, c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Strict variant of [`SegmentMatcher::match_count`]: the first rule that
    /// fails to parse is returned as an error.
    pub fn try_match_count<S: AsRef<str>>(
        &self,
        rules: &[S],
        customers: &[Customer],
    ) -> Result<usize, RuleError> {
        let parsed = rules
            .iter()
            .map(|r| Rule::parse(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(customers
            .iter()
            .filter(|c| self.matches_parsed(&parsed, c))
            .count())
    }

    /// Conjunction over already-parsed rules, applying the empty-rule policy.
    pub fn matches_parsed(&self, rules: &[Rule], customer: &Customer) -> bool {
        if rules.is_empty() {
            return self.empty_rules == EmptyRulePolicy::MatchAll;
        }
        rules.iter().all(|rule| rule.evaluate(customer))
    }
}

fn parse_lenient<S: AsRef<str>>(rules: &[S]) -> Option<Vec<Rule>> {
    let mut parsed = Vec::with_capacity(rules.len());
    for raw in rules {
        match Rule::parse(raw.as_ref()) {
            Ok(rule) => parsed.push(rule),
            Err(e) => {
                debug!(rule = raw.as_ref(), error = %e, "Unsatisfiable rule, no customer matches");
                return None;
            }
        }
    }
    Some(parsed)
}
