// 入群申请存储的 PostgreSQL 实现

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{JoinRequestStore, StoreError};
use crate::models::{GroupRole, JoinRequest, MemberStatus, RequestStatus};

const REQUEST_COLUMNS: &str = "request_id, group_id, user_id, message, status, created_at";

pub struct PgJoinRequestStore {
    db: Arc<PgPool>,
}

impl PgJoinRequestStore {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JoinRequestStore for PgJoinRequestStore {
    async fn find_by_id(&self, request_id: &str) -> Result<Option<JoinRequest>, StoreError> {
        let request = sqlx::query_as::<_, JoinRequest>(&format!(
            "SELECT {} FROM group_join_requests WHERE request_id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(request)
    }

    async fn find_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<JoinRequest>, StoreError> {
        // 约定每对 (group_id, user_id) 至多一条，取最新的一条兜底
        let request = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            SELECT {}
            FROM group_join_requests
            WHERE group_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            REQUEST_COLUMNS
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?;

        Ok(request)
    }

    async fn pending_for_group(&self, group_id: &str) -> Result<Vec<JoinRequest>, StoreError> {
        let requests = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            SELECT {}
            FROM group_join_requests
            WHERE group_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
            REQUEST_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(requests)
    }

    async fn replace_for_user(&self, request: &JoinRequest) -> Result<(), StoreError> {
        // 删除旧行与插入新 pending 行放进同一事务
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM group_join_requests
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(&request.group_id)
        .bind(&request.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO group_join_requests (
                request_id, group_id, user_id, message, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&request.request_id)
        .bind(&request.group_id)
        .bind(&request.user_id)
        .bind(request.message.as_deref())
        .bind(request.status)
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, request_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM group_join_requests WHERE request_id = $1")
            .bind(request_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("join request"));
        }
        Ok(())
    }

    async fn approve(
        &self,
        request_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // 成员行与申请状态在同一事务中更新，不会出现批准了却没有成员行
        let request = self
            .find_by_id(request_id)
            .await?
            .ok_or(StoreError::NotFound("join request"))?;

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, joined_at = EXCLUDED.joined_at
            "#,
        )
        .bind(&request.group_id)
        .bind(&request.user_id)
        .bind(GroupRole::Member)
        .bind(MemberStatus::Active)
        .bind(joined_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE group_join_requests SET status = $2
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .bind(RequestStatus::Approved)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE group_join_requests SET status = $2
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .bind(status)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("join request"));
        }
        Ok(())
    }

    async fn statuses_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RequestStatus>, StoreError> {
        let rows = sqlx::query_as::<_, (String, RequestStatus)>(
            r#"
            SELECT group_id, status
            FROM group_join_requests
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
