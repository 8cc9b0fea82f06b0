//! Admin authorization gate.
//!
//! Protected routes resolve the caller once: session token to auth user, auth
//! user to profile role. [`authorize`] then turns that into a single decision.

use anyhow::{anyhow, Result};
use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use wreq::Client;

use crate::api::AppState;
use crate::db;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "sb-access-token";
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    LoginRequired { redirect_to: String },
    Forbidden { redirect_to: String },
}

pub fn is_protected(path: &str) -> bool {
    ["/admin", "/api/admin", "/api/upload"]
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

pub fn authorize(path: &str, principal: Option<&Principal>) -> AccessDecision {
    if !is_protected(path) {
        return AccessDecision::Allow;
    }
    match principal {
        None => AccessDecision::LoginRequired {
            redirect_to: format!("/login?redirect={}", path),
        },
        Some(p) if p.is_admin() => AccessDecision::Allow,
        Some(_) => AccessDecision::Forbidden {
            redirect_to: "/".to_string(),
        },
    }
}

/// Bearer token from the Authorization header, else the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Client for the hosted auth provider's user endpoint.
pub struct AuthClient {
    client: Client,
    auth_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(auth_url: &str, anon_key: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    /// Returns the user behind `token`, or `None` if the provider rejects it.
    pub async fn user_for_token(&self, token: &str) -> Result<Option<(Uuid, Option<String>)>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 403) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("Auth provider returned HTTP {}", status.as_u16()));
        }

        let user: AuthUser = response.json().await?;
        Ok(Some((user.id, user.email)))
    }
}

async fn resolve_principal(state: &AppState, headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };
    let Some((user_id, email)) = state.auth.user_for_token(&token).await? else {
        warn!("Rejected session token");
        return Ok(None);
    };

    let mut conn = state.pool.get().await?;
    let role = db::role_for_user(&mut conn, user_id).await?;

    Ok(Some(Principal { user_id, email, role }))
}

/// Middleware for the admin and upload routers. Evaluates the gate once per request and
/// hands the resolved [`Principal`] to the handler through extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let principal = resolve_principal(&state, request.headers()).await?;

    match authorize(&path, principal.as_ref()) {
        AccessDecision::Allow => {
            if let Some(principal) = principal {
                info!("Admin {} accessing {}", principal.user_id, path);
                request.extensions_mut().insert(principal);
            }
            Ok(next.run(request).await)
        }
        AccessDecision::LoginRequired { redirect_to } => Err(ApiError::Unauthorized { redirect_to }),
        AccessDecision::Forbidden { redirect_to } => Err(ApiError::Forbidden { redirect_to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn principal(role: Option<&str>) -> Principal {
        Principal {
            user_id: Uuid::from_u128(1),
            email: Some("staff@example.com".to_string()),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn public_paths_are_always_allowed() {
        assert_eq!(authorize("/api/products", None), AccessDecision::Allow);
        assert_eq!(authorize("/administrator-bio", None), AccessDecision::Allow);
    }

    #[test]
    fn media_uploads_are_admin_only() {
        assert!(is_protected("/api/upload/image"));
        assert!(is_protected("/api/upload/video"));
        assert!(!is_protected("/api/uploads-guide"));
        assert_eq!(
            authorize("/api/upload/image", None),
            AccessDecision::LoginRequired {
                redirect_to: "/login?redirect=/api/upload/image".to_string()
            }
        );
        assert_eq!(authorize("/api/upload/video", Some(&principal(Some("admin")))), AccessDecision::Allow);
        assert!(matches!(
            authorize("/api/upload/video", Some(&principal(None))),
            AccessDecision::Forbidden { .. }
        ));
    }

    #[test]
    fn anonymous_admin_request_is_sent_to_login() {
        assert_eq!(
            authorize("/api/admin/orders", None),
            AccessDecision::LoginRequired {
                redirect_to: "/login?redirect=/api/admin/orders".to_string()
            }
        );
    }

    #[test]
    fn non_admin_is_sent_home() {
        let customer = principal(Some("customer"));
        assert_eq!(
            authorize("/admin", Some(&customer)),
            AccessDecision::Forbidden { redirect_to: "/".to_string() }
        );
        assert_eq!(
            authorize("/admin/bookings", Some(&principal(None))),
            AccessDecision::Forbidden { redirect_to: "/".to_string() }
        );
    }

    #[test]
    fn admin_is_allowed() {
        assert_eq!(authorize("/api/admin/products/1", Some(&principal(Some("admin")))), AccessDecision::Allow);
    }

    #[test]
    fn token_from_header_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; sb-access-token=cookie-token"));
        assert_eq!(session_token(&headers).as_deref(), Some("cookie-token"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        assert_eq!(session_token(&headers).as_deref(), Some("header-token"));
    }
}
