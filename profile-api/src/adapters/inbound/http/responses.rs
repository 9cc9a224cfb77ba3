//! HTTP response types for profile endpoints.

use serde::Serialize;

use crate::domain::{models::AvatarUpdated, User};

/// Response for a successful avatar upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResponse {
    pub success: bool,
    pub image_url: String,
}

impl From<AvatarUpdated> for AvatarUploadResponse {
    fn from(updated: AvatarUpdated) -> Self {
        Self {
            success: true,
            image_url: updated.image_url,
        }
    }
}

/// Public view of the signed-in user. Never includes the access token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_uses_camel_case() {
        let response = AvatarUploadResponse::from(AvatarUpdated {
            image_url: "https://host/img.png".to_string(),
        });

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({ "success": true, "imageUrl": "https://host/img.png" })
        );
    }
}
