use thiserror::Error;

/// Errors that can occur while ingesting or syncing a profile image.
///
/// The first three variants are validation failures and are always raised
/// before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvatarError {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("No image provided")]
    MissingInput,
    #[error("Image too large (max 5MB)")]
    PayloadTooLarge,
    #[error("unsupported upload input: {0}")]
    UnsupportedInput(String),
    #[error("upload failed: {0}")]
    UpstreamTransfer(String),
    #[error("profile update failed: {0}")]
    StoreWrite(String),
}

impl AvatarError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamTransfer(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreWrite(msg.into())
    }
}
