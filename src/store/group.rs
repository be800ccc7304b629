// 群组存储的 PostgreSQL 实现
// 按 ID 的单行读取走 Redis 缓存，任何写入都使相应缓存失效

use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use sqlx::PgPool;

use super::{GroupStore, StoreError};
use crate::models::{Group, GroupRole, MemberStatus, UpdateGroupRequest};

// 缓存相关常量
const GROUP_CACHE_EXPIRE: u64 = 600; // 群组缓存过期时间，单位秒
const GROUP_ID_CACHE_PREFIX: &str = "group:id:"; // 群组ID缓存前缀

const GROUP_COLUMNS: &str = "group_id, name, description, location, avatar_url, \
     created_by, is_private, total_distance, total_rides, created_at";

pub struct PgGroupStore {
    db: Arc<PgPool>,
    redis: Arc<RedisClient>,
}

impl PgGroupStore {
    pub fn new(db: Arc<PgPool>, redis: Arc<RedisClient>) -> Self {
        Self { db, redis }
    }

    async fn invalidate_cache(&self, group_id: &str) {
        if let Ok(mut conn) = self.redis.get_multiplexed_async_connection().await {
            let cache_key = format!("{}{}", GROUP_ID_CACHE_PREFIX, group_id);
            let _: Result<(), redis::RedisError> = conn.del(&cache_key).await;
        }
    }
}

#[async_trait]
impl GroupStore for PgGroupStore {
    async fn create_with_owner(&self, group: &Group) -> Result<(), StoreError> {
        // 群组行与群主成员行必须同生共死，放进同一个事务
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO groups (
                group_id, name, description, location, avatar_url,
                created_by, is_private, total_distance, total_rides, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&group.group_id)
        .bind(&group.name)
        .bind(group.description.as_deref())
        .bind(group.location.as_deref())
        .bind(group.avatar_url.as_deref())
        .bind(&group.created_by)
        .bind(group.is_private)
        .bind(group.total_distance)
        .bind(group.total_rides)
        .bind(group.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&group.group_id)
        .bind(&group.created_by)
        .bind(GroupRole::Owner)
        .bind(MemberStatus::Active)
        .bind(group.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, group_id: &str) -> Result<Option<Group>, StoreError> {
        // 尝试从缓存读取
        let cache_key = format!("{}{}", GROUP_ID_CACHE_PREFIX, group_id);

        if let Ok(mut conn) = self.redis.get_multiplexed_async_connection().await {
            let cached: redis::RedisResult<String> = conn.get(&cache_key).await;

            if let Ok(json_str) = cached {
                if let Ok(group) = serde_json::from_str::<Group>(&json_str) {
                    tracing::debug!("Get group from cache: {}", cache_key);
                    return Ok(Some(group));
                }
            }
        }

        // 从数据库查询
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {} FROM groups WHERE group_id = $1",
            GROUP_COLUMNS
        ))
        .bind(group_id)
        .fetch_optional(&*self.db)
        .await?;

        // 缓存结果
        if let Some(ref g) = group {
            if let Ok(mut conn) = self.redis.get_multiplexed_async_connection().await {
                if let Ok(json_str) = serde_json::to_string(g) {
                    let _: Result<(), redis::RedisError> =
                        conn.set_ex(&cache_key, json_str, GROUP_CACHE_EXPIRE).await;
                    tracing::debug!("Set group to cache: {}", cache_key);
                }
            }
        }

        Ok(group)
    }

    async fn update(
        &self,
        group_id: &str,
        updates: &UpdateGroupRequest,
    ) -> Result<Group, StoreError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            UPDATE groups SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                avatar_url = COALESCE($5, avatar_url),
                is_private = COALESCE($6, is_private)
            WHERE group_id = $1
            RETURNING {}
            "#,
            GROUP_COLUMNS
        ))
        .bind(group_id)
        .bind(updates.name.as_deref())
        .bind(updates.description.as_deref())
        .bind(updates.location.as_deref())
        .bind(updates.avatar_url.as_deref())
        .bind(updates.is_private)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("group"))?;

        self.invalidate_cache(group_id).await;
        Ok(group)
    }

    async fn delete(&self, group_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM groups WHERE group_id = $1")
            .bind(group_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("group"));
        }

        self.invalidate_cache(group_id).await;
        Ok(())
    }

    async fn find_not_joined(&self, user_id: &str, limit: i64) -> Result<Vec<Group>, StoreError> {
        let groups = sqlx::query_as::<_, Group>(&format!(
            r#"
            SELECT {}
            FROM groups g
            WHERE NOT EXISTS (
                SELECT 1 FROM group_members gm
                WHERE gm.group_id = g.group_id
                  AND gm.user_id = $1
                  AND gm.status = 'active'
            )
            ORDER BY g.created_at DESC
            LIMIT $2
            "#,
            GROUP_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&*self.db)
        .await?;

        Ok(groups)
    }

    async fn transfer_ownership(
        &self,
        group_id: &str,
        new_owner_id: &str,
        old_owner_id: &str,
    ) -> Result<(), StoreError> {
        // 三处写入在同一事务中落库，不会出现 created_by 与角色行不一致
        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE groups SET created_by = $2 WHERE group_id = $1")
            .bind(group_id)
            .bind(new_owner_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE group_members SET role = $3
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(new_owner_id)
        .bind(GroupRole::Owner)
        .execute(&mut *tx)
        .await?;

        // 旧群主的行在历史脏数据下可能缺失，更新 0 行不算错误
        sqlx::query(
            r#"
            UPDATE group_members SET role = $3
            WHERE group_id = $1 AND user_id = $2 AND role = $4
            "#,
        )
        .bind(group_id)
        .bind(old_owner_id)
        .bind(GroupRole::Admin)
        .bind(GroupRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.invalidate_cache(group_id).await;
        Ok(())
    }
}
