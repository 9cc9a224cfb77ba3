use sqlx::PgPool;

use crate::domain::{models::UserId, User};

use super::repo_error::RepositoryError;

pub trait UserRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;
}

pub struct UserRepositoryImpl {
    pool: PgPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for UserRepositoryImpl {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, image, access_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates the user on first sign-in. Later sign-ins refresh the name and
    /// token but keep whatever image the profile already has.
    async fn upsert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, image, access_token)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(email) DO UPDATE
            SET name = EXCLUDED.name,
                image = COALESCE(users.image, EXCLUDED.image),
                access_token = EXCLUDED.access_token
            RETURNING id, email, name, image, access_token
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.access_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

pub struct NewUser {
    email: String,
    name: Option<String>,
    image: Option<String>,
    access_token: String,
}

impl NewUser {
    pub fn new(
        email: String,
        name: Option<String>,
        image: Option<String>,
        access_token: String,
    ) -> Self {
        Self {
            email,
            name,
            image,
            access_token,
        }
    }
}
