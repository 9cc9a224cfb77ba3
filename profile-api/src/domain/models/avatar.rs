use std::fmt;

/// Largest accepted avatar, in bytes. Exactly this size is still accepted.
pub const MAX_AVATAR_SIZE: u64 = 5 * 1024 * 1024;

/// Where avatars land on the media host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadDestination {
    pub folder: &'static str,
    pub resource_kind: &'static str,
    pub overwrite: bool,
}

pub const AVATAR_DESTINATION: UploadDestination = UploadDestination {
    folder: "profile_images",
    resource_kind: "image",
    overwrite: true,
};

/// Proof that a request belongs to a signed-in user.
///
/// Can only be built from a non-blank email, which is the key the profile
/// store is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    email: String,
}

impl AuthenticatedIdentity {
    pub fn from_email(email: impl Into<String>) -> Option<Self> {
        let email = email.into();
        if email.trim().is_empty() {
            return None;
        }

        Some(Self { email })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A file submitted for an avatar update, before validation.
///
/// `size` is the length the client declared; it is what the size gate checks.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub size: u64,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    content: Vec<u8>,
}

impl UploadCandidate {
    pub fn new(content: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            size: content.len() as u64,
            mime_type,
            file_name: None,
            content,
        }
    }

    #[cfg(test)]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn exceeds_limit(&self) -> bool {
        self.size > MAX_AVATAR_SIZE
    }

    /// Consumes the candidate into the buffer handed to the media host.
    pub fn into_buffer(self) -> TransferBuffer {
        TransferBuffer {
            bytes: self.content,
            file_name: self.file_name.filter(|name| !name.trim().is_empty()),
        }
    }
}

impl fmt::Debug for UploadCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCandidate")
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TransferBuffer {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

impl TransferBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name the client gave the file, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for TransferBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransferBuffer({} bytes, {:?})",
            self.bytes.len(),
            self.file_name
        )
    }
}

/// Input accepted by the media uploader's buffer path.
///
/// Only `Buffer` is valid there; text (such as a URL) has its own entry point
/// and is rejected with [`AvatarError::UnsupportedInput`](crate::domain::AvatarError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferInput {
    Buffer(TransferBuffer),
    // Nothing in the upload path builds this; the uploader still has to refuse it.
    #[allow(dead_code)]
    Text(String),
}

impl From<TransferBuffer> for TransferInput {
    fn from(buffer: TransferBuffer) -> Self {
        Self::Buffer(buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub secure_url: String,
}

impl UploadResult {
    pub fn new(secure_url: impl Into<String>) -> Self {
        Self {
            secure_url: secure_url.into(),
        }
    }
}

/// Outcome of a successful avatar submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpdated {
    pub image_url: String,
}
