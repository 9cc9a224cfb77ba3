use async_trait::async_trait;

use crate::domain::{
    models::{AuthenticatedIdentity, AvatarUpdated, UploadCandidate},
    AvatarError,
};

#[async_trait]
pub trait AvatarService: Send + Sync + 'static {
    /// Validates the candidate, sends it to the media host and points the
    /// caller's profile at the hosted copy.
    async fn submit_avatar(
        &self,
        identity: Option<&AuthenticatedIdentity>,
        candidate: Option<UploadCandidate>,
    ) -> Result<AvatarUpdated, AvatarError>;

    /// Best-effort import of the OAuth provider's avatar at sign-in.
    ///
    /// Returns the new hosted URL when the profile was updated. Never fails.
    async fn sync_provider_avatar(
        &self,
        identity: &AuthenticatedIdentity,
        avatar_url: Option<&str>,
    ) -> Option<String>;
}
