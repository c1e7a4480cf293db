//! Caller identity.
//!
//! Authentication happens in front of this server; by the time a request
//! arrives its user id is trusted and carried in [`USER_HEADER`].

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folio_sdk::UserId;

use crate::error::ServerError;

pub const USER_HEADER: &str = "x-user-id";

/// The user a request acts for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ServerError::MissingIdentity)?;
        UserId::new(value.trim()).map(Caller).map_err(|_| ServerError::MissingIdentity)
    }
}
