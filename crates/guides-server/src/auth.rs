/// Session lookup and role checks for the admin surface.
///
/// Sign-in happens elsewhere; this module only maps a presented session token to an
/// email, and an email to a role.
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use crate::error::AppError;

const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn role_of(&self, email: &str) -> Option<Role>;
}

/// Accounts listed in configuration.
#[derive(Debug, Default)]
pub struct StaticUserDirectory {
    admins: HashSet<String>,
    users: HashSet<String>,
}

impl StaticUserDirectory {
    pub fn new(
        admins: impl IntoIterator<Item = String>,
        users: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            admins: admins.into_iter().map(|e| e.to_lowercase()).collect(),
            users: users.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn role_of(&self, email: &str) -> Option<Role> {
        let email = email.to_lowercase();
        if self.admins.contains(&email) {
            Some(Role::Admin)
        } else if self.users.contains(&email) {
            Some(Role::User)
        } else {
            None
        }
    }
}

/// Static session token to email table.
#[derive(Debug, Default)]
pub struct SessionResolver {
    sessions: HashMap<String, String>,
}

impl SessionResolver {
    pub fn new(sessions: HashMap<String, String>) -> Self {
        Self { sessions }
    }

    /// Email of the session presented in `headers`, if any. A bearer token takes
    /// precedence over the session cookie.
    pub fn email(&self, headers: &HeaderMap) -> Option<&str> {
        let token = bearer_token(headers).or_else(|| session_cookie(headers))?;
        self.sessions.get(token).map(String::as_str)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// Signed-in caller of any role. 401 without a session.
pub fn authorize_session<'a>(
    sessions: &'a SessionResolver,
    headers: &HeaderMap,
) -> Result<&'a str, AppError> {
    sessions.email(headers).ok_or(AppError::Unauthorized)
}

/// Caller with the admin role. 401 without a session, 403 for any other account.
pub async fn authorize_admin(
    sessions: &SessionResolver,
    users: &dyn UserDirectory,
    headers: &HeaderMap,
) -> Result<String, AppError> {
    let email = authorize_session(sessions, headers)?;
    match users.role_of(email).await {
        Some(Role::Admin) => Ok(email.to_string()),
        _ => Err(AppError::Forbidden),
    }
}
