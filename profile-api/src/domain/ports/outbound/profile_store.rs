use async_trait::async_trait;

use crate::domain::{models::ProfileRecord, AvatarError};

#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Unconditionally sets `image` on the profile addressed by `email`.
    ///
    /// The profile must already exist; a missing record is a `StoreWrite`
    /// failure, never an insert.
    async fn update_image(&self, email: &str, image_url: &str)
        -> Result<ProfileRecord, AvatarError>;
}
