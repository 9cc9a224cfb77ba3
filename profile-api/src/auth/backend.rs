use std::{fmt, sync::Arc};

use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId as SessionUserId};
use oauth2::{
    basic::{BasicClient, BasicRequestTokenError},
    reqwest::{async_http_client, AsyncHttpClientError},
    AuthorizationCode, CsrfToken, Scope, TokenResponse,
};
use reqwest::{header::USER_AGENT, Url};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    domain::{models::UserId, ports::inbound::AvatarService, User},
    repositories::{NewUser, RepositoryError, UserRepository, UserRepositoryImpl},
};

const OAUTH_SCOPES: [&str; 3] = ["openid", "email", "profile"];

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub code: String,
    pub old_state: CsrfToken,
    pub new_state: CsrfToken,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Sqlx(#[from] RepositoryError),

    #[error(transparent)]
    Reqwest(reqwest::Error),

    #[error(transparent)]
    OAuth2(BasicRequestTokenError<AsyncHttpClientError>),
}

#[derive(Clone)]
pub struct AuthBackend {
    db: PgPool,
    client: BasicClient,
    userinfo_url: String,
    avatar_service: Arc<dyn AvatarService>,
}

impl AuthBackend {
    pub fn new(
        db: PgPool,
        client: BasicClient,
        userinfo_url: impl Into<String>,
        avatar_service: Arc<dyn AvatarService>,
    ) -> Self {
        Self {
            db,
            client,
            userinfo_url: userinfo_url.into(),
            avatar_service,
        }
    }

    pub fn authorize_url(&self) -> (Url, CsrfToken) {
        self.client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(OAUTH_SCOPES.map(|scope| Scope::new(scope.to_string())))
            .url()
    }
}

impl fmt::Debug for AuthBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBackend")
            .field("client", &self.client)
            .field("userinfo_url", &self.userinfo_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthnBackend for AuthBackend {
    type User = User;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        // Ensure the CSRF state has not been tampered with.
        if creds.old_state.secret() != creds.new_state.secret() {
            return Ok(None);
        };

        // Process authorization code, expecting a token response back.
        let token_res = self
            .client
            .exchange_code(AuthorizationCode::new(creds.code))
            .request_async(async_http_client)
            .await
            .map_err(Self::Error::OAuth2)?;

        // Use access token to request user info.
        let user_info = reqwest::Client::new()
            .get(&self.userinfo_url)
            .header(USER_AGENT.as_str(), "profile-login")
            .bearer_auth(token_res.access_token().secret())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(Self::Error::Reqwest)?
            .json::<UserInfo>()
            .await
            .map_err(Self::Error::Reqwest)?;

        // Persist user in our database so we can use `get_user`.
        let user_repo = UserRepositoryImpl::new(self.db.clone());
        let new_user = NewUser::new(
            user_info.email,
            user_info.name,
            user_info.picture,
            token_res.access_token().secret().to_string(),
        );

        let mut user = user_repo.upsert_user(&new_user).await?;

        // Importing the provider avatar must never block sign-in.
        if let Some(identity) = user.identity() {
            if let Some(hosted_url) = self
                .avatar_service
                .sync_provider_avatar(&identity, user.image.as_deref())
                .await
            {
                user.image = Some(hosted_url);
            }
        }

        Ok(Some(user))
    }

    async fn get_user(
        &self,
        user_id: &SessionUserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Ok(id) = i32::try_from(*user_id) else {
            return Ok(None);
        };

        let user_repo = UserRepositoryImpl::new(self.db.clone());
        let user = user_repo.get_user(UserId::new(id)).await?;

        Ok(user)
    }
}

pub type AuthSession = axum_login::AuthSession<AuthBackend>;
