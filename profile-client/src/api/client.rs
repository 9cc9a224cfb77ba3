use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    cookie::Jar,
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode, Url,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::affordance::{AvatarUploader, SelectedFile};
use crate::api::dto::{AvatarUploadResponse, ErrorBody, Me};

const SESSION_COOKIE: &str = "id";
const IMAGE_FIELD: &str = "image";
const UNAUTH_INVALID_SESSION: &str =
    "Session expired or invalid. Sign in through the browser and run `profile-client session <id>`.";

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, session_id: Option<&str>) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API URL: {}", base_url))?;
        let jar = Arc::new(Jar::default());

        if let Some(session_id) = session_id {
            jar.add_cookie_str(
                &format!("{}={}; Path=/", SESSION_COOKIE, session_id),
                &base_url,
            );
        }

        let client = Client::builder()
            .cookie_provider(jar)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for path {}", path))
    }

    async fn send(&self, request: RequestBuilder, call_name: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to call {}", call_name))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            anyhow::bail!("{UNAUTH_INVALID_SESSION}");
        }
        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            anyhow::bail!("{} returned {}: {}", call_name, status, message);
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T> {
        let response = self.send(request, call_name).await?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", call_name))
    }

    pub async fn me(&self) -> Result<Me> {
        self.get_json(self.client.get(self.endpoint("/me")?), "GET /me")
            .await
    }

    /// Posts the file as the `image` field and returns the hosted URL.
    pub async fn post_avatar(&self, file: &SelectedFile) -> Result<String> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .context("Invalid MIME type")?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response: AvatarUploadResponse = self
            .get_json(
                self.client
                    .post(self.endpoint("/profile/avatar")?)
                    .multipart(form),
                "POST /profile/avatar",
            )
            .await?;

        if !response.success {
            anyhow::bail!("POST /profile/avatar reported failure");
        }
        Ok(response.image_url)
    }
}

#[async_trait]
impl AvatarUploader for ApiClient {
    async fn upload_avatar(&self, file: &SelectedFile) -> Result<String> {
        self.post_avatar(file).await
    }
}
