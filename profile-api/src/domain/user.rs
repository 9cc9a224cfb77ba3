use std::fmt;

use axum_login::AuthUser;

use crate::domain::models::{AuthenticatedIdentity, UserId};

/// The signed-in user as stored in the session.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub access_token: String,
}

impl User {
    pub fn identity(&self) -> Option<AuthenticatedIdentity> {
        AuthenticatedIdentity::from_email(self.email.clone())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("image", &self.image)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl AuthUser for User {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id.into()
    }

    // A fresh access token on every sign-in invalidates older sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.access_token.as_bytes()
    }
}
