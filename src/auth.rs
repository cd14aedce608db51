use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::models::Session;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// An allow-list entry. Plaintext on purpose: this is a fixed demo roster,
/// not a credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl User {
    pub fn new(username: &str, password: &str, role: Role) -> Self {
        Self { username: username.into(), password: password.into(), role }
    }
}

static DEFAULT_USERS: Lazy<Vec<User>> = Lazy::new(|| {
    vec![
        User::new("admin", "admin123", Role::Admin),
        User::new("user", "user123", Role::User),
    ]
});

/// Credential-check capability. Swap the implementation to authenticate
/// against a real backend; callers only see `Option<Role>`.
#[async_trait]
pub trait CredentialCheck: Send + Sync {
    /// Returns the role for an exact (username, password) match.
    async fn check(&self, username: &str, password: &str) -> Option<Role>;
}

/// Fixed in-memory roster.
#[derive(Debug, Clone)]
pub struct StaticAllowList {
    users: Vec<User>,
}

impl StaticAllowList {
    pub fn new(users: Vec<User>) -> Self { Self { users } }
    pub fn users(&self) -> &[User] { &self.users }
}

impl Default for StaticAllowList {
    fn default() -> Self { Self::new(DEFAULT_USERS.clone()) }
}

#[async_trait]
impl CredentialCheck for StaticAllowList {
    async fn check(&self, username: &str, password: &str) -> Option<Role> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| u.role)
    }
}

/// Owns the single current session and its persisted copy.
pub struct AuthGate {
    checker: Box<dyn CredentialCheck>,
    store: Box<dyn SessionStore>,
    current: Option<Session>,
}

impl AuthGate {
    pub fn new(checker: Box<dyn CredentialCheck>, store: Box<dyn SessionStore>) -> Self {
        Self { checker, store, current: None }
    }

    pub fn session(&self) -> Option<&Session> { self.current.as_ref() }

    pub fn require_session(&self) -> ClientResult<&Session> {
        self.current.as_ref().ok_or(ClientError::NotLoggedIn)
    }

    /// On failure any existing session is left as it was.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<Session> {
        let Some(role) = self.checker.check(username, password).await else {
            warn!(username, "login rejected");
            return Err(ClientError::CredentialsInvalid);
        };
        let session = Session::new(username, role);
        self.store.save(&session)?;
        info!(username, ?role, "logged in");
        self.current = Some(session.clone());
        Ok(session)
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        self.store.clear()?;
        if let Some(s) = self.current.take() {
            info!(username = %s.username, "logged out");
        }
        Ok(())
    }

    /// Adopts the stored session as-is; it is not re-checked against the roster.
    pub fn restore_session(&mut self) -> ClientResult<Option<Session>> {
        let restored = self.store.load()?;
        if let Some(s) = &restored {
            info!(username = %s.username, "restored session");
        }
        self.current = restored.clone();
        Ok(restored)
    }
}

/// Advisory authorization guard for edit/delete paths.
#[macro_export]
macro_rules! require_modify {
    ($session:expr, $author:expr) => {
        if !$session.can_modify($author) {
            return Err($crate::error::ClientError::Forbidden($author.to_string()));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allow_list_exact_match_only() {
        let list = StaticAllowList::default();
        assert_eq!(list.check("admin", "admin123").await, Some(Role::Admin));
        assert_eq!(list.check("user", "user123").await, Some(Role::User));
        assert_eq!(list.check("user", "admin123").await, None);
        assert_eq!(list.check("User", "user123").await, None);
        assert_eq!(list.check("", "").await, None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
