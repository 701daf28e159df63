//! Customer segmentation — rule parsing, segment matching, rule validation,
//! and a fluent segment builder.

pub mod builder;
pub mod engine;
pub mod predicates;
pub mod validation;

pub use builder::SegmentBuilder;
pub use crm_core::EmptyRulePolicy;
pub use engine::SegmentMatcher;
pub use predicates::{CustomerField, Rule, RuleError, RuleOperator, RuleValue};
pub use validation::{validate_rules, RuleWarning};
