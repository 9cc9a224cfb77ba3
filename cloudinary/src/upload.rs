use serde::Deserialize;
use strum::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Image,
    Video,
    Raw,
    Auto,
}

/// Where and how an asset is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: Option<String>,
    pub resource_type: ResourceType,
    pub overwrite: bool,
    pub public_id: Option<String>,
}

impl UploadOptions {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            ..Default::default()
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }
}

/// The `file` parameter of an upload: either raw bytes sent as a multipart
/// file part, or a remote URL Cloudinary fetches itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Bytes { data: Vec<u8>, file_name: String },
    RemoteUrl(String),
}

impl UploadSource {
    pub fn bytes(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self::Bytes {
            data,
            file_name: file_name.into(),
        }
    }

    pub fn remote_url(url: impl Into<String>) -> Self {
        Self::RemoteUrl(url.into())
    }
}

/// Subset of the upload response we care about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub secure_url: String,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
}
