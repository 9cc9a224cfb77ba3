use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{models::ProfileRecord, ports::outbound::ProfileStore, AvatarError};

pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn update_image(
        &self,
        email: &str,
        image_url: &str,
    ) -> Result<ProfileRecord, AvatarError> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            r#"
            UPDATE users
            SET image = $2
            WHERE email = $1
            RETURNING id, email, name, image
            "#,
        )
        .bind(email)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| AvatarError::store(err.to_string()))?;

        record.ok_or_else(|| AvatarError::store(format!("no profile for {email}")))
    }
}
