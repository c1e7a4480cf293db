//! Credential resolution for remote calls.
//!
//! Folio never holds long-lived secrets. A [`CredentialProvider`] (backed by
//! the application's user database) hands out a short-lived access token for
//! one request, and can mint a fresh one from a stored refresh token when
//! the platform rejects the first.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use folio_types::UserId;

use crate::error::{StoreError, StoreResult};

/// A resolved bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    /// Whether the provider can exchange a refresh token for a new one.
    pub refreshable: bool,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, refreshable: bool) -> Self {
        Self {
            secret: secret.into(),
            refreshable,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("refreshable", &self.refreshable)
            .finish()
    }
}

/// Source of access tokens, keyed by the user whose token is used.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return the current access token for `subject`.
    async fn resolve(&self, subject: &UserId) -> StoreResult<AccessToken>;

    /// Exchange the stored refresh token for a new access token.
    async fn refresh(&self, subject: &UserId) -> StoreResult<AccessToken>;
}

/// Fixed tokens, for single-tenant deployments and tests.
///
/// Tokens are not refreshable; an `Unauthorized` from the platform is
/// terminal.
#[derive(Clone, Default)]
pub struct StaticCredentialProvider {
    tokens: HashMap<UserId, String>,
    fallback: Option<String>,
}

impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `token` for every subject without an explicit entry.
    pub fn with_fallback(mut self, token: impl Into<String>) -> Self {
        self.fallback = Some(token.into());
        self
    }

    pub fn with_token(mut self, subject: UserId, token: impl Into<String>) -> Self {
        self.tokens.insert(subject, token.into());
        self
    }
}

impl fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("subjects", &self.tokens.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn resolve(&self, subject: &UserId) -> StoreResult<AccessToken> {
        self.tokens
            .get(subject)
            .or(self.fallback.as_ref())
            .map(|secret| AccessToken::new(secret.clone(), false))
            .ok_or_else(|| StoreError::Credential(format!("no token configured for {subject}")))
    }

    async fn refresh(&self, subject: &UserId) -> StoreResult<AccessToken> {
        Err(StoreError::Credential(format!(
            "static token for {subject} cannot be refreshed"
        )))
    }
}
