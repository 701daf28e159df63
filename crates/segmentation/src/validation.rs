//! Advisory validation for rule strings.
//!
//! Matching stays lenient; this pass only tells the caller which rules will
//! never match anyone and why.

use serde::Serialize;
use tracing::warn;

use crate::predicates::{Rule, RuleError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleWarning {
    pub index: usize,
    pub rule: String,
    pub message: String,
    #[serde(skip)]
    pub error: RuleError,
}

pub fn validate_rules<S: AsRef<str>>(rules: &[S]) -> Vec<RuleWarning> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let raw = raw.as_ref();
            Rule::parse(raw).err().map(|error| {
                warn!(index, rule = raw, error = %error, "Malformed segment rule");
                RuleWarning {
                    index,
                    rule: raw.to_string(),
                    message: error.to_string(),
                    error,
                }
            })
        })
        .collect()
}
