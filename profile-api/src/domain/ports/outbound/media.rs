use async_trait::async_trait;

use crate::domain::{
    models::{TransferInput, UploadDestination, UploadResult},
    AvatarError,
};

/// Remote image host.
///
/// Both entry points are single-shot: no retry, no timeout beyond the
/// transport default.
#[async_trait]
pub trait MediaUploader: Send + Sync + 'static {
    /// Uploads an in-memory buffer. Anything but [`TransferInput::Buffer`]
    /// fails with `UnsupportedInput`.
    async fn transfer(
        &self,
        input: TransferInput,
        destination: &UploadDestination,
    ) -> Result<UploadResult, AvatarError>;

    /// Lets the host fetch an image from a remote URL. A missing or empty URL
    /// is not an error and yields `Ok(None)`.
    async fn transfer_from_url(
        &self,
        source_url: Option<&str>,
        destination: &UploadDestination,
    ) -> Result<Option<UploadResult>, AvatarError>;

    /// Whether `url` already points at this host's storage.
    fn hosts(&self, url: &str) -> bool;
}
