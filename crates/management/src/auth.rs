//! Mocked Google sign-in and bearer token middleware.
//!
//! The Google credential is required but never verified; every successful
//! sign-in yields the same mock user. Tokens live in memory only.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use crm_core::config::AuthConfig;
use crm_core::error::{CrmError, CrmResult};
use crm_core::types::User;
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info};

use crate::handlers::ManagementState;
use crate::models::ErrorResponse;

const MOCK_TOKEN_PREFIX: &str = "crm_mock_";

/// The bearer token of the current request, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

pub fn mock_user() -> User {
    User {
        id: "1".to_string(),
        email: "user@example.com".to_string(),
        name: "Test User".to_string(),
    }
}

pub struct AuthManager {
    sessions: DashMap<String, Session>,
    token_ttl: Duration,
}

impl AuthManager {
    pub fn new(config: &AuthConfig) -> CrmResult<Self> {
        config.validate()?;
        Ok(Self::with_ttl(Duration::hours(config.token_ttl_hours)))
    }

    fn with_ttl(token_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            token_ttl,
        }
    }

    /// Sign in with a Google credential. Only its presence is checked.
    pub fn sign_in(&self, credential: Option<&str>) -> CrmResult<Session> {
        if credential.map_or(true, |c| c.trim().is_empty()) {
            return Err(CrmError::Unauthorized("No credential provided".to_string()));
        }

        let expires_at = Utc::now()
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| CrmError::Config("token lifetime out of range".to_string()))?;
        let session = Session {
            token: generate_token(),
            user: mock_user(),
            expires_at,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        info!(user_id = %session.user.id, expires_at = %session.expires_at, "User signed in");
        metrics::counter!("crm.auth.sign_ins").increment(1);
        Ok(session)
    }

    pub fn sign_out(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        if removed {
            info!("User signed out");
        }
        removed
    }

    /// Resolve a token to its user. Expired sessions are dropped on lookup.
    pub fn current_user(&self, token: &str) -> Option<User> {
        let session = self.sessions.get(token)?;
        if session.expires_at <= Utc::now() {
            drop(session);
            self.sessions.remove(token);
            debug!("Expired session removed");
            return None;
        }
        Some(session.user.clone())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    format!(
        "{}{}",
        MOCK_TOKEN_PREFIX,
        bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
    )
}

/// Routes under `/api/` that do not need a bearer token.
fn is_public(path: &str) -> bool {
    !path.starts_with("/api/") || path == "/api/auth/google" || path == "/api/auth/config"
}

/// Axum middleware that requires a valid bearer token on protected routes and
/// makes the [`User`] and [`BearerToken`] available as request extensions.
pub async fn auth_middleware(
    State(state): State<ManagementState>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        return unauthorized("missing_auth", "Authorization header with Bearer token required");
    };

    match state.auth.current_user(&token) {
        Some(user) => {
            req.extensions_mut().insert(user);
            req.extensions_mut().insert(BearerToken(token));
            next.run(req).await
        }
        None => unauthorized("invalid_token", "Invalid or expired bearer token"),
    }
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new(&AuthConfig::default()).unwrap()
    }

    #[test]
    fn test_sign_in_requires_credential() {
        let auth = manager();
        assert!(matches!(auth.sign_in(None), Err(CrmError::Unauthorized(_))));
        assert!(matches!(auth.sign_in(Some("  ")), Err(CrmError::Unauthorized(_))));
        assert_eq!(auth.active_sessions(), 0);
    }

    #[test]
    fn test_sign_in_returns_mock_user() {
        let auth = manager();
        let session = auth.sign_in(Some("google-id-token")).unwrap();
        assert_eq!(session.user, mock_user());
        assert!(session.token.starts_with(MOCK_TOKEN_PREFIX));
        assert_eq!(session.token.len(), MOCK_TOKEN_PREFIX.len() + 64);
        assert_eq!(auth.current_user(&session.token), Some(mock_user()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let auth = manager();
        let a = auth.sign_in(Some("x")).unwrap();
        let b = auth.sign_in(Some("x")).unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(auth.active_sessions(), 2);
    }

    #[test]
    fn test_sign_out_invalidates_token() {
        let auth = manager();
        let session = auth.sign_in(Some("x")).unwrap();
        assert!(auth.sign_out(&session.token));
        assert!(!auth.sign_out(&session.token));
        assert_eq!(auth.current_user(&session.token), None);
    }

    #[test]
    fn test_invalid_ttl_is_rejected() {
        for token_ttl_hours in [-1, 0, 10_000_000_000, i64::MAX] {
            let config = AuthConfig {
                google_client_id: None,
                token_ttl_hours,
            };
            assert!(matches!(AuthManager::new(&config), Err(CrmError::Config(_))));
        }
    }

    #[test]
    fn test_sign_in_with_unrepresentable_expiry_fails() {
        let auth = AuthManager::with_ttl(Duration::MAX);
        assert!(matches!(auth.sign_in(Some("x")), Err(CrmError::Config(_))));
        assert_eq!(auth.active_sessions(), 0);
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let auth = AuthManager::with_ttl(Duration::zero());
        let session = auth.sign_in(Some("x")).unwrap();
        assert_eq!(auth.current_user(&session.token), None);
        assert_eq!(auth.active_sessions(), 0);
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public("/health"));
        assert!(is_public("/api/auth/google"));
        assert!(is_public("/api/auth/config"));
        assert!(!is_public("/api/auth/me"));
        assert!(!is_public("/api/segments"));
    }
}
