use async_trait::async_trait;
use cloudinary::{CloudinaryClient, ResourceType, UploadOptions, UploadSource};

use crate::domain::{
    models::{TransferInput, UploadDestination, UploadResult},
    ports::outbound::MediaUploader,
    AvatarError,
};

/// File name sent when the client gave none; the host assigns the public id.
const UPLOAD_FILE_NAME: &str = "avatar";

/// Cloudinary-backed [`MediaUploader`].
pub struct CloudinaryMediaUploader {
    client: CloudinaryClient,
    storage_domain: String,
}

impl CloudinaryMediaUploader {
    pub fn new(client: CloudinaryClient, storage_domain: impl Into<String>) -> Self {
        Self {
            client,
            storage_domain: storage_domain.into(),
        }
    }

    async fn upload(
        &self,
        source: UploadSource,
        destination: &UploadDestination,
    ) -> Result<UploadResult, AvatarError> {
        let response = self
            .client
            .upload(source, &upload_options(destination))
            .await
            .map_err(|err| AvatarError::upstream(err.to_string()))?;

        Ok(UploadResult::new(response.secure_url))
    }
}

fn upload_options(destination: &UploadDestination) -> UploadOptions {
    let resource_type = match destination.resource_kind {
        "image" => ResourceType::Image,
        "video" => ResourceType::Video,
        "raw" => ResourceType::Raw,
        _ => ResourceType::Auto,
    };

    UploadOptions::new(resource_type)
        .with_folder(destination.folder)
        .with_overwrite(destination.overwrite)
}

#[async_trait]
impl MediaUploader for CloudinaryMediaUploader {
    async fn transfer(
        &self,
        input: TransferInput,
        destination: &UploadDestination,
    ) -> Result<UploadResult, AvatarError> {
        let buffer = match input {
            TransferInput::Buffer(buffer) => buffer,
            TransferInput::Text(_) => {
                return Err(AvatarError::UnsupportedInput(
                    "only byte buffers can be uploaded here, send URLs through transfer_from_url"
                        .to_string(),
                ))
            }
        };

        let file_name = buffer.file_name().unwrap_or(UPLOAD_FILE_NAME).to_string();
        self.upload(
            UploadSource::bytes(buffer.into_inner(), file_name),
            destination,
        )
        .await
    }

    async fn transfer_from_url(
        &self,
        source_url: Option<&str>,
        destination: &UploadDestination,
    ) -> Result<Option<UploadResult>, AvatarError> {
        let Some(source_url) = source_url.filter(|url| !url.is_empty()) else {
            return Ok(None);
        };

        self.upload(UploadSource::remote_url(source_url), destination)
            .await
            .map(Some)
    }

    fn hosts(&self, url: &str) -> bool {
        url.contains(&self.storage_domain)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Multipart, State},
        routing::post,
        Json, Router,
    };
    use cloudinary::Credentials;
    use serde_json::{json, Value};

    use super::*;
    use crate::domain::models::{UploadCandidate, AVATAR_DESTINATION};

    type FileNames = Arc<Mutex<Vec<Option<String>>>>;

    async fn record_file_name(
        State(file_names): State<FileNames>,
        mut multipart: Multipart,
    ) -> Json<Value> {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("file") {
                let file_name = field.file_name().map(str::to_string);
                file_names.lock().unwrap().push(file_name);
            }
        }
        Json(json!({ "secure_url": "https://res.cloudinary.com/demo/image/upload/a.png" }))
    }

    async fn recording_uploader() -> (CloudinaryMediaUploader, FileNames) {
        let file_names = FileNames::default();
        let router = Router::new()
            .route("/v1_1/:cloud/:resource/upload", post(record_file_name))
            .with_state(file_names.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = CloudinaryClient::with_base_url(
            Credentials::new("demo", "key", "secret"),
            format!("http://{addr}"),
        );
        (
            CloudinaryMediaUploader::new(client, "res.cloudinary.com"),
            file_names,
        )
    }

    #[tokio::test]
    async fn buffer_upload_sends_client_file_name() {
        let (uploader, file_names) = recording_uploader().await;
        let named = UploadCandidate::new(b"hi".to_vec(), Some("image/png".into()))
            .with_file_name(Some("me.png".into()));
        let unnamed = UploadCandidate::new(b"hi".to_vec(), Some("image/png".into()));

        uploader
            .transfer(named.into_buffer().into(), &AVATAR_DESTINATION)
            .await
            .unwrap();
        uploader
            .transfer(unnamed.into_buffer().into(), &AVATAR_DESTINATION)
            .await
            .unwrap();

        assert_eq!(
            *file_names.lock().unwrap(),
            vec![Some("me.png".to_string()), Some("avatar".to_string())]
        );
    }

    // Nothing listens here; tests below must never reach the network.
    fn uploader() -> CloudinaryMediaUploader {
        let client = CloudinaryClient::with_base_url(
            Credentials::new("demo", "key", "secret"),
            "http://127.0.0.1:9",
        );
        CloudinaryMediaUploader::new(client, "res.cloudinary.com")
    }

    #[tokio::test]
    async fn transfer_rejects_text_input() {
        let err = uploader()
            .transfer(
                TransferInput::Text("https://example.com/a.png".to_string()),
                &AVATAR_DESTINATION,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AvatarError::UnsupportedInput(_)));
    }

    #[tokio::test]
    async fn transfer_from_empty_url_is_a_no_op() {
        let uploader = uploader();

        assert_eq!(
            uploader
                .transfer_from_url(Some(""), &AVATAR_DESTINATION)
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            uploader
                .transfer_from_url(None, &AVATAR_DESTINATION)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_an_upstream_failure() {
        let err = uploader()
            .transfer_from_url(Some("https://example.com/a.png"), &AVATAR_DESTINATION)
            .await
            .unwrap_err();

        assert!(matches!(err, AvatarError::UpstreamTransfer(_)));
    }

    #[test]
    fn hosts_matches_storage_domain() {
        let uploader = uploader();

        assert!(uploader.hosts("https://res.cloudinary.com/demo/image/upload/a.png"));
        assert!(!uploader.hosts("https://lh3.googleusercontent.com/a/photo.jpg"));
    }

    #[test]
    fn avatar_destination_maps_to_image_upload() {
        let options = upload_options(&AVATAR_DESTINATION);

        assert_eq!(options.resource_type, ResourceType::Image);
        assert_eq!(options.folder.as_deref(), Some("profile_images"));
        assert!(options.overwrite);
    }
}
