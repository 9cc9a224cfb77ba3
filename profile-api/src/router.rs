use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::SameSite;
use axum_login::{
    tower_sessions::{CachingSessionStore, ExpiredDeletion, Expiry, SessionManagerLayer},
    AuthManagerLayer, AuthManagerLayerBuilder,
};
use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use sqlx::PgPool;
use time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tower_sessions_moka_store::MokaStore;
use tower_sessions_sqlx_store::PostgresStore;
use url::Url;

use crate::{
    app_state::AppState,
    auth::{self, AuthBackend},
    config::{AuthSettings, Settings},
    domain::ports::inbound::AvatarService,
    factory, routes,
};

type SessionStore = CachingSessionStore<MokaStore, PostgresStore>;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("invalid {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
    #[error("session store migration failed: {0}")]
    SessionStore(#[from] sqlx::Error),
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, RouterError> {
    Url::parse(value).map_err(|source| RouterError::InvalidUrl { name, source })
}

pub async fn create(connection_pool: PgPool, config: Settings) -> Result<Router<()>, RouterError> {
    let avatar_service = factory::avatar_service(
        connection_pool.clone(),
        &config.application,
        &config.media,
    );
    let auth_layer =
        new_auth_layer(connection_pool, &config.auth, avatar_service.clone()).await?;

    let app_url = parse_url("app URL", &config.application.app_url)?;
    let app_state = AppState::new(app_url, avatar_service);

    let app = Router::new()
        .route("/", get(|| async { "Hello from the profile API!" }))
        .merge(routes::profile::router())
        .merge(auth::router())
        .layer(auth_layer);

    // Finally, wrap the app with tracing layer, state and CORS
    let allowed_origin = config.application.app_url.trim_end_matches('/').to_string();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().unwrap_or_default() == allowed_origin
        }));

    Ok(app
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default())))
}

fn oauth_client(auth: &AuthSettings) -> Result<BasicClient, RouterError> {
    let auth_url = AuthUrl::new(auth.auth_url.clone())
        .map_err(|source| RouterError::InvalidUrl { name: "authorization endpoint URL", source })?;
    let token_url = TokenUrl::new(auth.token_url.clone())
        .map_err(|source| RouterError::InvalidUrl { name: "token endpoint URL", source })?;
    let redirect_url = RedirectUrl::new(auth.redirect_url.clone())
        .map_err(|source| RouterError::InvalidUrl { name: "redirect URL", source })?;

    Ok(BasicClient::new(
        ClientId::new(auth.client_id.clone()),
        Some(ClientSecret::new(auth.client_secret.clone())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url))
}

async fn new_auth_layer(
    connection_pool: PgPool,
    auth: &AuthSettings,
    avatar_service: Arc<dyn AvatarService>,
) -> Result<AuthManagerLayer<AuthBackend, SessionStore>, RouterError> {
    let client = oauth_client(auth)?;

    // Sessions live in Postgres so they survive restarts.
    let db_store = PostgresStore::new(connection_pool.clone());
    db_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        db_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );
    drop(deletion_task);

    // Hot sessions are served from memory.
    let cache_store = MokaStore::new(Some(2_000));
    let session_store = CachingSessionStore::new(cache_store, db_store);

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)));

    let backend = AuthBackend::new(
        connection_pool,
        client,
        auth.userinfo_url.as_str(),
        avatar_service,
    );
    Ok(AuthManagerLayerBuilder::new(backend, session_layer).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_settings(auth_url: &str) -> AuthSettings {
        AuthSettings {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            auth_url: auth_url.to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            redirect_url: "http://localhost:8080/oauth/callback".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }

    #[test]
    fn oauth_client_rejects_malformed_endpoint() {
        let err = oauth_client(&auth_settings("not a url")).unwrap_err();

        assert!(matches!(
            err,
            RouterError::InvalidUrl {
                name: "authorization endpoint URL",
                ..
            }
        ));
    }

    #[test]
    fn oauth_client_accepts_valid_endpoints() {
        assert!(oauth_client(&auth_settings("https://accounts.google.com/o/oauth2/v2/auth")).is_ok());
    }
}
