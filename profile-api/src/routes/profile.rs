use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use axum_login::login_required;
use tracing::instrument;

use crate::{
    adapters::inbound::http::AvatarUploadResponse,
    app_state::AppState,
    auth::{AuthBackend, AuthUser, CallerIdentity},
    domain::{models::UploadCandidate, AvatarError, User},
    routes::ApiError,
};

const IMAGE_FIELD: &str = "image";
// Leaves room for multipart framing; the 5 MiB policy itself is applied by the avatar service.
const AVATAR_UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    let page = Router::new()
        .route("/profile", get(profile_page))
        .route_layer(login_required!(AuthBackend, login_url = "/auth/signin"));

    let upload = Router::new()
        .route("/profile/avatar", post(upload_avatar))
        .route_layer(DefaultBodyLimit::max(AVATAR_UPLOAD_BODY_LIMIT));

    page.merge(upload)
}

async fn profile_page(user: AuthUser) -> Html<String> {
    Html(render_profile(&user))
}

#[instrument(name = "POST /profile/avatar", skip(app_state, multipart))]
async fn upload_avatar(
    CallerIdentity(identity): CallerIdentity,
    State(app_state): State<AppState>,
    multipart: Option<Multipart>,
) -> Result<Json<AvatarUploadResponse>, ApiError> {
    // Anonymous callers are turned away by the service before the body is read.
    let candidate = match (&identity, multipart) {
        (Some(_), Some(mut multipart)) => extract_candidate(&mut multipart).await?,
        _ => None,
    };

    let updated = app_state
        .avatar_service
        .submit_avatar(identity.as_ref(), candidate)
        .await?;

    Ok(Json(updated.into()))
}

/// Reads the `image` field. A part with no bytes counts as no image.
async fn extract_candidate(
    multipart: &mut Multipart,
) -> Result<Option<UploadCandidate>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Ok(None);
        }

        return Ok(Some(
            UploadCandidate::new(bytes.to_vec(), content_type).with_file_name(file_name),
        ));
    }

    Ok(None)
}

/// Bodies cut off by the body limit answer like any other oversized image.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AvatarError::PayloadTooLarge.into();
    }

    ApiError::new(err.status(), err.body_text())
}

fn render_profile(user: &User) -> String {
    let name = ammonia::clean_text(user.name.as_deref().unwrap_or(&user.email));
    let email = ammonia::clean_text(&user.email);
    let image = user
        .image
        .as_deref()
        .map(|url| format!(r#"<img id="avatar" src="{}" alt="avatar">"#, ammonia::clean_text(url)))
        .unwrap_or_else(|| r#"<img id="avatar" alt="no avatar">"#.to_string());

    format!(
        r#"<!doctype html>
<html>
  <head><title>{name}</title></head>
  <body>
    <h1>{name}</h1>
    <p>{email}</p>
    {image}
    <input id="picker" type="file" accept="image/*">
    <p id="notice"></p>
    <script>
      const picker = document.getElementById("picker");
      const avatar = document.getElementById("avatar");
      const notice = document.getElementById("notice");
      picker.addEventListener("change", async () => {{
        const file = picker.files[0];
        if (!file) return;
        if (!file.type.startsWith("image/")) {{ notice.textContent = "Please select an image file"; return; }}
        if (file.size > 5 * 1024 * 1024) {{ notice.textContent = "Image too large (max 5MB)"; return; }}
        const previous = avatar.getAttribute("src");
        avatar.src = URL.createObjectURL(file);
        picker.disabled = true;
        const body = new FormData();
        body.append("{field}", file);
        try {{
          const res = await fetch("/profile/avatar", {{ method: "POST", body }});
          if (!res.ok) throw new Error(res.statusText);
          avatar.src = (await res.json()).imageUrl;
          notice.textContent = "";
        }} catch (_) {{
          if (previous) avatar.src = previous; else avatar.removeAttribute("src");
          notice.textContent = "Failed to upload image";
        }} finally {{
          picker.disabled = false;
        }}
      }});
    </script>
  </body>
</html>"#,
        field = IMAGE_FIELD,
    )
}
