//! Client side of an avatar change: check the file locally, show it right
//! away, then keep or roll back that preview depending on the server's answer.

use std::fmt;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// Shown on any failed upload. The cause is deliberately not surfaced.
pub const FAILURE_NOTICE: &str = "Failed to upload image";

/// A file picked by the user, read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Please select an image file")]
    NotAnImage(String),
    #[error("Image too large (max 5MB)")]
    TooLarge(u64),
    #[error("An upload is already in progress")]
    Busy,
}

/// Unconfirmed local rendering of the selected bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalPreview {
    mime_type: String,
    encoded: String,
}

impl LocalPreview {
    fn of(file: &SelectedFile) -> Self {
        Self {
            mime_type: file.mime_type.clone(),
            encoded: STANDARD.encode(&file.bytes),
        }
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.encoded)
    }
}

impl fmt::Debug for LocalPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalPreview({}, {} chars)", self.mime_type, self.encoded.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffordanceState {
    Idle,
    Pending,
    Committed { image_url: String },
    Reverted { notice: &'static str },
}

/// What the affordance currently renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayedImage {
    None,
    Durable(String),
    Preview(LocalPreview),
}

#[async_trait]
pub trait AvatarUploader: Send + Sync {
    /// Sends the file to the avatar pipeline, returning the hosted URL.
    async fn upload_avatar(&self, file: &SelectedFile) -> anyhow::Result<String>;
}

#[derive(Debug)]
pub struct UploadAffordance {
    state: AffordanceState,
    durable_image: Option<String>,
    displayed: DisplayedImage,
}

impl UploadAffordance {
    pub fn new(current_image: Option<String>) -> Self {
        let displayed = durable_display(current_image.as_deref());
        Self {
            state: AffordanceState::Idle,
            durable_image: current_image,
            displayed,
        }
    }

    pub fn state(&self) -> &AffordanceState {
        &self.state
    }

    pub fn durable_image(&self) -> Option<&str> {
        self.durable_image.as_deref()
    }

    pub fn displayed(&self) -> &DisplayedImage {
        &self.displayed
    }

    /// Validates the selection and installs the optimistic preview.
    ///
    /// A rejected selection changes nothing.
    pub fn begin(&mut self, file: &SelectedFile) -> Result<(), SelectionError> {
        if self.state == AffordanceState::Pending {
            return Err(SelectionError::Busy);
        }
        if !file.mime_type.starts_with("image/") {
            return Err(SelectionError::NotAnImage(file.mime_type.clone()));
        }
        if file.size() > MAX_UPLOAD_SIZE {
            return Err(SelectionError::TooLarge(file.size()));
        }

        self.displayed = DisplayedImage::Preview(LocalPreview::of(file));
        self.state = AffordanceState::Pending;
        Ok(())
    }

    /// Settles a pending upload. Every failure reverts, whatever its cause.
    pub fn finish<E>(&mut self, outcome: Result<String, E>) {
        if self.state != AffordanceState::Pending {
            return;
        }

        self.state = match outcome {
            Ok(image_url) => {
                self.durable_image = Some(image_url.clone());
                AffordanceState::Committed { image_url }
            }
            Err(_) => {
                self.displayed = durable_display(self.durable_image.as_deref());
                AffordanceState::Reverted {
                    notice: FAILURE_NOTICE,
                }
            }
        };
    }
}

fn durable_display(image: Option<&str>) -> DisplayedImage {
    match image {
        Some(url) => DisplayedImage::Durable(url.to_string()),
        None => DisplayedImage::None,
    }
}
