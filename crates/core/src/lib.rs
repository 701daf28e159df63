pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EmptyRulePolicy};
pub use error::{CrmError, CrmResult};
