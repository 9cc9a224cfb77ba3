use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    models::{AuthenticatedIdentity, AvatarUpdated, UploadCandidate, AVATAR_DESTINATION},
    ports::{
        inbound::AvatarService,
        outbound::{MediaUploader, ProfileStore},
    },
    AvatarError,
};

/// Implementation of the AvatarService inbound port.
///
/// User uploads and the sign-in import go through the same media host and
/// profile store but with opposite failure policies: uploads propagate every
/// error, the sign-in import swallows them.
pub struct AvatarServiceImpl<U, S> {
    uploader: Arc<U>,
    store: Arc<S>,
}

impl<U, S> AvatarServiceImpl<U, S> {
    pub fn new(uploader: Arc<U>, store: Arc<S>) -> Self {
        Self { uploader, store }
    }
}

#[async_trait]
impl<U: MediaUploader, S: ProfileStore> AvatarService for AvatarServiceImpl<U, S> {
    async fn submit_avatar(
        &self,
        identity: Option<&AuthenticatedIdentity>,
        candidate: Option<UploadCandidate>,
    ) -> Result<AvatarUpdated, AvatarError> {
        let identity = identity.ok_or(AvatarError::Unauthenticated)?;
        let candidate = candidate.ok_or(AvatarError::MissingInput)?;
        if candidate.exceeds_limit() {
            return Err(AvatarError::PayloadTooLarge);
        }

        tracing::debug!(
            bytes = candidate.size,
            mime_type = candidate.mime_type.as_deref().unwrap_or("unknown"),
            "uploading avatar"
        );
        let buffer = candidate.into_buffer();

        let uploaded = self
            .uploader
            .transfer(buffer.into(), &AVATAR_DESTINATION)
            .await?;

        // A failure here leaves the uploaded asset unreferenced on the host.
        self.store
            .update_image(identity.email(), &uploaded.secure_url)
            .await?;

        tracing::info!(email = identity.email(), "profile image updated");
        Ok(AvatarUpdated {
            image_url: uploaded.secure_url,
        })
    }

    async fn sync_provider_avatar(
        &self,
        identity: &AuthenticatedIdentity,
        avatar_url: Option<&str>,
    ) -> Option<String> {
        let source_url = avatar_url.filter(|url| !url.is_empty())?;
        if self.uploader.hosts(source_url) {
            return None;
        }

        let uploaded = match self
            .uploader
            .transfer_from_url(Some(source_url), &AVATAR_DESTINATION)
            .await
        {
            Ok(Some(uploaded)) => uploaded,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    "Failed to import provider avatar for {}: {}",
                    identity.email(),
                    e
                );
                return None;
            }
        };

        match self
            .store
            .update_image(identity.email(), &uploaded.secure_url)
            .await
        {
            Ok(_) => Some(uploaded.secure_url),
            Err(e) => {
                tracing::warn!(
                    "Failed to store imported avatar for {}: {}",
                    identity.email(),
                    e
                );
                None
            }
        }
    }
}
