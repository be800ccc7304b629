// 成员关系存储的 PostgreSQL 实现
// 所有写入以 (group_id, user_id) 为自然键，重复 upsert 幂等

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{MembershipStore, StoreError};
use crate::models::{GroupRole, MemberStatus, Membership};

const MEMBER_COLUMNS: &str = "group_id, user_id, role, status, joined_at";

pub struct PgMembershipStore {
    db: Arc<PgPool>,
}

impl PgMembershipStore {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn find(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>, StoreError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {} FROM group_members WHERE group_id = $1 AND user_id = $2",
            MEMBER_COLUMNS
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(membership)
    }

    async fn active_members(&self, group_id: &str) -> Result<Vec<Membership>, StoreError> {
        let members = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {}
            FROM group_members
            WHERE group_id = $1 AND status = 'active'
            ORDER BY joined_at ASC
            "#,
            MEMBER_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(members)
    }

    async fn insert(&self, membership: &Membership) -> Result<(), StoreError> {
        // 重试产生的冲突直接吸收，最终状态正确即可
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(&membership.group_id)
        .bind(&membership.user_id)
        .bind(membership.role)
        .bind(membership.status)
        .bind(membership.joined_at)
        .execute(&*self.db)
        .await?;

        Ok(())
    }

    async fn reactivate(
        &self,
        group_id: &str,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // 角色保留：离开再回来的管理员仍是管理员
        let result = sqlx::query(
            r#"
            UPDATE group_members SET status = $3, joined_at = $4
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(MemberStatus::Active)
        .bind(joined_at)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("membership"));
        }
        Ok(())
    }

    async fn set_status(
        &self,
        group_id: &str,
        user_id: &str,
        status: MemberStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE group_members SET status = $3
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(status)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("membership"));
        }
        Ok(())
    }

    async fn set_role(
        &self,
        group_id: &str,
        user_id: &str,
        role: GroupRole,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE group_members SET role = $3
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("membership"));
        }
        Ok(())
    }

    async fn upsert_owner(&self, group_id: &str, user_id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id)
            DO UPDATE SET role = EXCLUDED.role, status = EXCLUDED.status
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(GroupRole::Owner)
        .bind(MemberStatus::Active)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        Ok(())
    }
}
