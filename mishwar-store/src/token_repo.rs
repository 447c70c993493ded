use async_trait::async_trait;
use sqlx::PgPool;

use mishwar_domain::repository::{TokenStoreError, UserTokenRepository};

pub struct PgUserTokenRepository {
    pool: PgPool,
}

impl PgUserTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserTokenRepository for PgUserTokenRepository {
    async fn device_tokens(&self, user_id: &str) -> Result<Vec<String>, TokenStoreError> {
        let tokens = sqlx::query_scalar(
            "SELECT token FROM user_push_tokens WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(TokenStoreError::backend)?;
        Ok(tokens)
    }

    async fn save_token(&self, user_id: &str, token: &str) -> Result<(), TokenStoreError> {
        sqlx::query(
            "INSERT INTO user_push_tokens (user_id, token) VALUES ($1, $2) \
             ON CONFLICT (user_id, token) DO NOTHING",
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(TokenStoreError::backend)?;
        Ok(())
    }

    async fn remove_tokens(&self, user_id: &str, tokens: &[String]) -> Result<(), TokenStoreError> {
        sqlx::query("DELETE FROM user_push_tokens WHERE user_id = $1 AND token = ANY($2)")
            .bind(user_id)
            .bind(tokens)
            .execute(&self.pool)
            .await
            .map_err(TokenStoreError::backend)?;
        Ok(())
    }
}
