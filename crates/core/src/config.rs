use serde::Deserialize;

use crate::error::{CrmError, CrmResult};

/// Upper bound for `auth.token_ttl_hours` (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 8760;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CRM_DASHBOARD__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Client id handed to the Google sign-in button. Credentials are not verified.
    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default)]
    pub empty_rules: EmptyRulePolicy,
}

/// What a rule set with no rules matches.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRulePolicy {
    /// No rules, no members. Segment creation requires at least one rule anyway.
    #[default]
    MatchNone,
    /// Vacuous truth: every customer satisfies an empty conjunction.
    MatchAll,
}

// Default functions
fn default_node_id() -> String {
    "crm-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_token_ttl_hours() -> i64 {
    24
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            empty_rules: EmptyRulePolicy::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> CrmResult<()> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(CrmError::Config(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                self.token_ttl_hours
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from environment variables and validate it.
    pub fn load() -> CrmResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CRM_DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CrmResult<()> {
        self.auth.validate()
    }
}
