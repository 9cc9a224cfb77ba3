//! In-memory outbound adapters for testing.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::domain::{
    models::{ProfileRecord, TransferInput, UploadDestination, UploadResult, UserId},
    ports::outbound::{MediaUploader, ProfileStore},
    AvatarError,
};

/// Media uploader that answers every call with a preset result.
#[derive(Clone)]
pub struct MockMediaUploader {
    response: Result<String, AvatarError>,
    storage_domain: String,
    transfer_calls: Arc<AtomicUsize>,
    url_calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<(Vec<u8>, UploadDestination)>>>,
}

impl MockMediaUploader {
    pub fn returning(secure_url: impl Into<String>) -> Self {
        Self::with_response(Ok(secure_url.into()))
    }

    pub fn failing(err: AvatarError) -> Self {
        Self::with_response(Err(err))
    }

    fn with_response(response: Result<String, AvatarError>) -> Self {
        Self {
            response,
            storage_domain: "res.cloudinary.com".to_string(),
            transfer_calls: Arc::new(AtomicUsize::new(0)),
            url_calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of `transfer` calls.
    pub fn transfer_count(&self) -> usize {
        self.transfer_calls.load(Ordering::SeqCst)
    }

    /// Number of `transfer_from_url` calls.
    pub fn url_transfer_count(&self) -> usize {
        self.url_calls.load(Ordering::SeqCst)
    }

    /// Buffers received by `transfer`, with their destination.
    pub fn received(&self) -> Vec<(Vec<u8>, UploadDestination)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaUploader for MockMediaUploader {
    async fn transfer(
        &self,
        input: TransferInput,
        destination: &UploadDestination,
    ) -> Result<UploadResult, AvatarError> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);

        let TransferInput::Buffer(buffer) = input else {
            return Err(AvatarError::UnsupportedInput("text".to_string()));
        };
        self.received
            .lock()
            .unwrap()
            .push((buffer.into_inner(), *destination));

        self.response.clone().map(UploadResult::new)
    }

    async fn transfer_from_url(
        &self,
        source_url: Option<&str>,
        _destination: &UploadDestination,
    ) -> Result<Option<UploadResult>, AvatarError> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);

        if source_url.map_or(true, str::is_empty) {
            return Ok(None);
        }

        self.response.clone().map(|url| Some(UploadResult::new(url)))
    }

    fn hosts(&self, url: &str) -> bool {
        url.contains(&self.storage_domain)
    }
}

/// Profile store backed by a map keyed on email.
#[derive(Clone, Default)]
pub struct MockProfileStore {
    records: Arc<Mutex<HashMap<String, ProfileRecord>>>,
    update_calls: Arc<AtomicUsize>,
    failure: Option<AvatarError>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, email: &str, image: Option<&str>) -> Self {
        let id = self.records.lock().unwrap().len() as i32 + 1;
        self.records.lock().unwrap().insert(
            email.to_string(),
            ProfileRecord {
                id: UserId::new(id),
                email: email.to_string(),
                name: None,
                image: image.map(str::to_string),
            },
        );
        self
    }

    pub fn failing(mut self, err: AvatarError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn profile(&self, email: &str) -> Option<ProfileRecord> {
        self.records.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn update_image(
        &self,
        email: &str,
        image_url: &str,
    ) -> Result<ProfileRecord, AvatarError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(email)
            .ok_or_else(|| AvatarError::store(format!("no profile for {email}")))?;
        record.image = Some(image_url.to_string());

        Ok(record.clone())
    }
}
