use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Router,
};
use axum_login::tower_sessions::Session;
use oauth2::CsrfToken;
use serde::Deserialize;
use url::Url;

use crate::app_state::AppState;

const NEXT_URL_KEY: &str = "auth.next-url";
const CSRF_STATE_KEY: &str = "oauth.csrf-state";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(self::get::me))
        .route("/auth/signin", get(self::get::signin))
        .route("/login", post(self::post::login))
        .route("/logout", get(self::post::logout))
        .route("/oauth/callback", get(self::get::callback))
}

#[derive(Debug, Deserialize)]
struct NextUrl {
    next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthzResp {
    code: String,
    state: CsrfToken,
}

mod post {
    use crate::auth::AuthSession;

    use super::*;

    pub async fn login(
        auth_session: AuthSession,
        session: Session,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> impl IntoResponse {
        let (auth_url, csrf_state) = auth_session.backend.authorize_url();

        if let Err(e) = session.insert(CSRF_STATE_KEY, csrf_state.secret()).await {
            tracing::error!("Failed to store CSRF state in session: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        if let Err(e) = session.insert(NEXT_URL_KEY, next).await {
            tracing::error!("Failed to store next URL in session: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        auth_url.as_str().to_string().into_response()
    }

    pub async fn logout(mut auth_session: AuthSession) -> impl IntoResponse {
        match auth_session.logout().await {
            Ok(_) => Redirect::to("/auth/signin").into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

mod get {
    use axum::{extract::State, Json};
    use tracing::instrument;

    use crate::{
        adapters::inbound::http::ProfileResponse,
        auth::{backend::Credentials, AuthSession, AuthUser},
    };

    use super::*;

    pub async fn me(user: AuthUser) -> Json<ProfileResponse> {
        Json(ProfileResponse::from(&*user))
    }

    pub async fn signin(Query(NextUrl { next }): Query<NextUrl>) -> Html<String> {
        Html(signin_page(next.as_deref().unwrap_or("/profile")))
    }

    #[instrument(name = "auth_callback", skip(auth_session, session, app_state))]
    pub async fn callback(
        mut auth_session: AuthSession,
        session: Session,
        Query(AuthzResp {
            code,
            state: new_state,
        }): Query<AuthzResp>,
        State(app_state): State<AppState>,
    ) -> impl IntoResponse {
        let Ok(Some(old_state)) = session.get(CSRF_STATE_KEY).await else {
            tracing::error!("Failed to get CSRF state from session");
            return StatusCode::BAD_REQUEST.into_response();
        };

        let creds = Credentials {
            code,
            old_state,
            new_state,
        };

        let user = match auth_session.authenticate(creds).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::error!("CSRF state validation failed");
                return (StatusCode::UNAUTHORIZED, "Invalid CSRF state!").into_response();
            }
            Err(e) => {
                tracing::error!("Authentication failed: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        if let Err(e) = auth_session.login(&user).await {
            tracing::error!("Failed to log in user: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        let next = session.remove::<String>(NEXT_URL_KEY).await.ok().flatten();
        let target = redirect_target(&app_state.app_url, next.as_deref());
        Redirect::to(target.as_str()).into_response()
    }
}

/// Resolves `next` against the app URL. Anything leaving the app's origin
/// lands on the app URL instead.
fn redirect_target(app_url: &Url, next: Option<&str>) -> Url {
    let Some(next) = next else {
        return app_url.clone();
    };

    match app_url.join(next) {
        Ok(url) if url.origin() == app_url.origin() => url,
        Ok(url) => {
            tracing::warn!(%url, "Ignoring off-site next URL");
            app_url.clone()
        }
        Err(e) => {
            tracing::warn!("Failed to join next URL with app URL: {}", e);
            app_url.clone()
        }
    }
}

fn signin_page(next: &str) -> String {
    let next = ammonia::clean_text(next);

    format!(
        r#"<!doctype html>
<html>
  <head><title>Sign in</title></head>
  <body>
    <h1>Sign in</h1>
    <button id="signin" data-next="{next}">Sign in with Google</button>
    <script>
      const button = document.getElementById("signin");
      button.addEventListener("click", async () => {{
        const next = encodeURIComponent(button.dataset.next);
        const res = await fetch(`/login?next=${{next}}`, {{ method: "POST" }});
        if (res.ok) window.location.href = await res.text();
      }});
    </script>
  </body>
</html>"#
    )
}
