use std::{convert::Infallible, ops::Deref};

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    domain::{models::AuthenticatedIdentity, User},
    routes::ApiError,
};

use super::AuthSession;

/// Extracts the signed-in [`User`] from the session. Rejects with 401 when
/// nobody is logged in.
///
/// Safe to log, `User`'s `Debug` impl redacts the access token.
#[derive(Debug, Clone)]
pub struct AuthUser(User);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthSession: FromRequestParts<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_session = AuthSession::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::unauthorized("Not authenticated"))?;

        auth_session
            .user
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}

/// The caller's identity, if any. Never rejects, so handlers can hand the
/// decision to the avatar pipeline.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Option<AuthenticatedIdentity>);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
    AuthSession: FromRequestParts<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = match AuthSession::from_request_parts(parts, state).await {
            Ok(auth_session) => auth_session.user.and_then(|user| user.identity()),
            Err(_) => None,
        };

        Ok(CallerIdentity(identity))
    }
}
