//! Cookie sessions for the exam server.
//!
//! Passwords are kept only as SHA-256 digests; a login hashes the submitted
//! password and compares digests. Sessions live in memory and are lost on
//! restart.

use crate::config::server_config::AuthSection;
use crate::web::state::ExamState;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "exam_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

struct Account {
    username: String,
    digest: String,
    role: Role,
}

pub struct Credentials {
    accounts: Vec<Account>,
}

impl Credentials {
    pub fn from_config(auth: &AuthSection) -> Self {
        Self {
            accounts: vec![
                Account {
                    username: auth.admin_username.clone(),
                    digest: hash_password(&auth.admin_password),
                    role: Role::Admin,
                },
                Account {
                    username: auth.viewer_username.clone(),
                    digest: hash_password(&auth.viewer_password),
                    role: Role::Viewer,
                },
            ],
        }
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        let digest = hash_password(password);
        self.accounts
            .iter()
            .find(|a| a.username == username.trim() && a.digest == digest)
            .map(|a| a.role)
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Role>>,
}

impl SessionStore {
    pub async fn create(&self, role: Role) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.write().await.insert(token.clone(), role);
        token
    }

    pub async fn get(&self, token: &str) -> Option<Role> {
        self.sessions.read().await.get(token).copied()
    }

    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

/// Value of the session cookie, if the request carries one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str) -> HeaderValue {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn expired_cookie() -> (axum::http::HeaderName, HeaderValue) {
    (
        SET_COOKIE,
        HeaderValue::from_static("exam_session=; Path=/; HttpOnly; Max-Age=0"),
    )
}

/// JSON routes answer 401; pages go to the login form.
fn wants_json(path: &str) -> bool {
    path.starts_with("/api/") || path == "/seating/generate"
}

pub enum AuthRejection {
    Json(&'static str),
    Redirect,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Json(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "success": false, "error": message }))).into_response()
            }
            Self::Redirect => Redirect::to("/login").into_response(),
        }
    }
}

/// Any logged-in user.
pub struct CurrentUser(pub Role);

impl FromRequestParts<Arc<ExamState>> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ExamState>) -> Result<Self, Self::Rejection> {
        let role = match session_token(&parts.headers) {
            Some(token) => state.sessions.get(&token).await,
            None => None,
        };
        match role {
            Some(role) => Ok(Self(role)),
            None if wants_json(parts.uri.path()) => Err(AuthRejection::Json("Login required")),
            None => Err(AuthRejection::Redirect),
        }
    }
}

/// A logged-in admin.
pub struct AdminUser;

impl FromRequestParts<Arc<ExamState>> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<ExamState>) -> Result<Self, Self::Rejection> {
        let CurrentUser(role) = CurrentUser::from_request_parts(parts, state).await?;
        match role {
            Role::Admin => Ok(Self),
            Role::Viewer if wants_json(parts.uri.path()) => Err(AuthRejection::Json("Admin access required")),
            Role::Viewer => Err(AuthRejection::Redirect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_digest_is_sha256_hex() {
        assert_eq!(
            hash_password("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
    }

    #[test]
    fn test_authenticate_roles() {
        let credentials = Credentials::from_config(&AuthSection::default());
        assert_eq!(credentials.authenticate("admin", "admin123"), Some(Role::Admin));
        assert_eq!(credentials.authenticate("view", "view123"), Some(Role::Viewer));
        assert_eq!(credentials.authenticate("admin", "view123"), None);
        assert_eq!(credentials.authenticate("nobody", "admin123"), None);
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; exam_session=abc-123"));
        assert_eq!(session_token(&headers), Some("abc-123".to_string()));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }

    #[tokio::test]
    async fn test_session_store_lifecycle() {
        let store = SessionStore::default();
        let token = store.create(Role::Viewer).await;
        assert_eq!(store.get(&token).await, Some(Role::Viewer));
        store.remove(&token).await;
        assert_eq!(store.get(&token).await, None);
    }
}
