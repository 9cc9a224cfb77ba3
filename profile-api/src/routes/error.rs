use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::AvatarError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::Unauthenticated => Self::unauthorized(err.to_string()),
            AvatarError::MissingInput => Self::bad_request(err.to_string()),
            AvatarError::PayloadTooLarge => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
            }
            AvatarError::UnsupportedInput(_) => {
                Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, err.to_string())
            }
            AvatarError::UpstreamTransfer(message) => {
                tracing::error!("Avatar upload failed: {}", message);
                Self::new(StatusCode::BAD_GATEWAY, "Image upload failed")
            }
            AvatarError::StoreWrite(message) => {
                tracing::error!("Profile update failed: {}", message);
                Self::internal("Failed to update profile")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_their_message() {
        let err = ApiError::from(AvatarError::PayloadTooLarge);

        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.message, "Image too large (max 5MB)");
    }

    #[test]
    fn upstream_details_are_not_exposed() {
        let err = ApiError::from(AvatarError::upstream("Invalid Signature"));

        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Image upload failed");
    }

    #[test]
    fn store_failure_is_internal() {
        let err = ApiError::from(AvatarError::store("connection reset"));

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to update profile");
    }
}
