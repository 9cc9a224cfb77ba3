use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    sign, Credentials, ErrorResponse, ResourceType, SignatureAlgorithm, UploadOptions,
    UploadResponse, UploadSource,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Thin client for the Cloudinary Upload API.
///
/// Every call is a single signed multipart request. There is no retry and no
/// timeout beyond what the underlying `reqwest::Client` applies.
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    credentials: Credentials,
    api_base_url: String,
    signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(credentials: Credentials, api_base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            api_base_url: api_base_url.into(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    pub fn with_signature_algorithm(mut self, signature_algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = signature_algorithm;
        self
    }

    pub fn cloud_name(&self) -> &str {
        &self.credentials.cloud_name
    }

    fn upload_url(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base_url.trim_end_matches('/'),
            self.credentials.cloud_name,
            resource_type
        )
    }

    #[instrument(skip(self, source), fields(cloud = %self.credentials.cloud_name))]
    pub async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<UploadResponse, CloudinaryError> {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        let params = signed_params(options, timestamp);
        let signature = sign(
            &params,
            self.credentials.api_secret(),
            self.signature_algorithm,
        );

        let mut form = Form::new()
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        form = match source {
            UploadSource::Bytes { data, file_name } => {
                form.part("file", Part::bytes(data).file_name(file_name))
            }
            UploadSource::RemoteUrl(url) => form.text("file", url),
        };

        let resp = self
            .http
            .post(self.upload_url(options.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|err| err.error.message)
                .unwrap_or_else(|_| status.to_string());

            tracing::debug!(%status, %message, "upload rejected");
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<UploadResponse>()
            .await
            .map_err(|e| CloudinaryError::Parsing(format!("Failed to parse upload response: {e}")))
    }
}

fn signed_params(options: &UploadOptions, timestamp: i64) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::from([
        ("timestamp", timestamp.to_string()),
        ("overwrite", options.overwrite.to_string()),
    ]);
    if let Some(folder) = &options.folder {
        params.insert("folder", folder.clone());
    }
    if let Some(public_id) = &options.public_id {
        params.insert("public_id", public_id.clone());
    }

    params
}

#[derive(Error, Debug)]
pub enum CloudinaryError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upload rejected ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("ParsingError: {0}")]
    Parsing(String),
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use axum::{
        extract::{Multipart, Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone)]
    struct Field {
        data: Vec<u8>,
        file_name: Option<String>,
    }

    type Captured = Arc<Mutex<HashMap<String, Field>>>;

    async fn accept_upload(
        State(captured): State<Captured>,
        Path((cloud, resource)): Path<(String, String)>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.unwrap().to_vec();
            fields.insert(name, Field { data, file_name });
        }
        *captured.lock().unwrap() = fields;

        Json(json!({
            "secure_url": format!("https://res.cloudinary.com/{cloud}/{resource}/upload/v1/profile_images/abc.png"),
            "public_id": "profile_images/abc",
            "version": 1,
            "format": "png",
        }))
    }

    async fn reject_upload() -> impl IntoResponse {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Invalid Signature" } })),
        )
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn field_text(fields: &HashMap<String, Field>, name: &str) -> String {
        String::from_utf8(fields[name].data.clone()).unwrap()
    }

    fn avatar_options() -> UploadOptions {
        UploadOptions::new(ResourceType::Image)
            .with_folder("profile_images")
            .with_overwrite(true)
    }

    #[test]
    fn upload_url_includes_cloud_and_resource_type() {
        let client = CloudinaryClient::with_base_url(
            Credentials::new("demo", "key", "secret"),
            "https://api.cloudinary.com/",
        );

        assert_eq!(
            client.upload_url(ResourceType::Image),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn signed_params_omit_missing_options() {
        let params = signed_params(&UploadOptions::new(ResourceType::Image), 10);

        assert_eq!(params.len(), 2);
        assert_eq!(params["timestamp"], "10");
        assert_eq!(params["overwrite"], "false");
    }

    #[tokio::test]
    async fn upload_bytes_sends_signed_multipart_form() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1_1/:cloud/:resource/upload", post(accept_upload))
            .with_state(captured.clone());
        let base_url = spawn_server(router).await;
        let client =
            CloudinaryClient::with_base_url(Credentials::new("demo", "key-1", "secret"), base_url);

        let response = client
            .upload(
                UploadSource::bytes(b"hello".to_vec(), "avatar"),
                &avatar_options(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.secure_url,
            "https://res.cloudinary.com/demo/image/upload/v1/profile_images/abc.png"
        );
        assert_eq!(response.public_id.as_deref(), Some("profile_images/abc"));

        let fields = captured.lock().unwrap().clone();
        assert_eq!(fields["file"].data, b"hello");
        assert_eq!(fields["file"].file_name.as_deref(), Some("avatar"));
        assert_eq!(field_text(&fields, "folder"), "profile_images");
        assert_eq!(field_text(&fields, "overwrite"), "true");
        assert_eq!(field_text(&fields, "api_key"), "key-1");

        let expected_params = BTreeMap::from([
            ("folder", field_text(&fields, "folder")),
            ("overwrite", field_text(&fields, "overwrite")),
            ("timestamp", field_text(&fields, "timestamp")),
        ]);
        assert_eq!(
            field_text(&fields, "signature"),
            sign(&expected_params, "secret", SignatureAlgorithm::Sha1)
        );
    }

    #[tokio::test]
    async fn upload_remote_url_sends_url_as_text() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1_1/:cloud/:resource/upload", post(accept_upload))
            .with_state(captured.clone());
        let base_url = spawn_server(router).await;
        let client =
            CloudinaryClient::with_base_url(Credentials::new("demo", "key", "secret"), base_url);

        client
            .upload(
                UploadSource::remote_url("https://lh3.googleusercontent.com/a/photo.jpg"),
                &avatar_options(),
            )
            .await
            .unwrap();

        let fields = captured.lock().unwrap().clone();
        assert_eq!(
            field_text(&fields, "file"),
            "https://lh3.googleusercontent.com/a/photo.jpg"
        );
        assert_eq!(fields["file"].file_name, None);
    }

    #[tokio::test]
    async fn upload_surfaces_api_error_message() {
        let router = Router::new().route("/v1_1/:cloud/:resource/upload", post(reject_upload));
        let base_url = spawn_server(router).await;
        let client =
            CloudinaryClient::with_base_url(Credentials::new("demo", "key", "wrong"), base_url);

        let err = client
            .upload(UploadSource::bytes(vec![1, 2, 3], "avatar"), &avatar_options())
            .await
            .unwrap_err();

        match err {
            CloudinaryError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
