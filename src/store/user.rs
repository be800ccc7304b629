// 用户档案存储的 PostgreSQL 实现，只读

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UserStore};
use crate::models::UserProfile;

pub struct PgUserStore {
    db: Arc<PgPool>,
}

impl PgUserStore {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, username, first_name, last_name, avatar_url
            FROM users
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&*self.db)
        .await?;

        Ok(profiles)
    }
}
