use serde::Serialize;

use super::UserId;

/// A persisted user profile as seen by the avatar pipeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}
