//! Composition root, the only place that names concrete outbound adapters.

use std::sync::Arc;

use cloudinary::{CloudinaryClient, Credentials};
use sqlx::PgPool;

use crate::{
    adapters::outbound::{media::CloudinaryMediaUploader, postgres::PostgresProfileStore},
    config::{ApplicationSettings, MediaSettings},
    domain::{ports::inbound::AvatarService, services::AvatarServiceImpl},
};

/// Builds the Cloudinary client described by the media settings.
pub fn cloudinary_client(media: &MediaSettings) -> CloudinaryClient {
    let credentials = Credentials::new(
        media.cloud_name.as_str(),
        media.api_key.as_str(),
        media.api_secret.as_str(),
    );

    CloudinaryClient::with_base_url(credentials, media.api_base_url.as_str())
        .with_signature_algorithm(media.signature_algorithm)
}

/// Wires the avatar service to Cloudinary and the Postgres profile store.
pub fn avatar_service(
    pool: PgPool,
    application: &ApplicationSettings,
    media: &MediaSettings,
) -> Arc<dyn AvatarService> {
    let uploader = CloudinaryMediaUploader::new(
        cloudinary_client(media),
        application.storage_domain.as_str(),
    );
    let store = PostgresProfileStore::new(pool);

    Arc::new(AvatarServiceImpl::new(Arc::new(uploader), Arc::new(store)))
}
