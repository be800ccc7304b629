// 存储层
// 对象安全的存储 trait 加上对应的 PostgreSQL 实现
// 服务层只持有 trait 对象，测试中可注入内存假实现

mod group;
mod join_request;
mod member;
mod user;

pub use group::PgGroupStore;
pub use join_request::PgJoinRequestStore;
pub use member::PgMembershipStore;
pub use user::PgUserStore;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Group, JoinRequest, GroupRole, MemberStatus, Membership, RequestStatus, UpdateGroupRequest,
    UserProfile,
};

/// 存储与服务层共用的错误类型
/// 处理器据此映射到响应里的错误码，从不向调用方抛异常
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// 群组行与群主成员行在同一事务中写入，新群组不可能缺少群主行
    async fn create_with_owner(&self, group: &Group) -> Result<(), StoreError>;
    async fn find_by_id(&self, group_id: &str) -> Result<Option<Group>, StoreError>;
    async fn update(
        &self,
        group_id: &str,
        updates: &UpdateGroupRequest,
    ) -> Result<Group, StoreError>;
    async fn delete(&self, group_id: &str) -> Result<(), StoreError>;
    /// 用户没有活跃成员关系的群组，按创建时间倒序
    async fn find_not_joined(&self, user_id: &str, limit: i64) -> Result<Vec<Group>, StoreError>;
    /// 所有权转移：created_by、新旧群主的角色在同一事务中更新
    async fn transfer_ownership(
        &self,
        group_id: &str,
        new_owner_id: &str,
        old_owner_id: &str,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find(&self, group_id: &str, user_id: &str)
    -> Result<Option<Membership>, StoreError>;
    async fn active_members(&self, group_id: &str) -> Result<Vec<Membership>, StoreError>;
    /// 幂等插入，(group_id, user_id) 冲突时不报错
    async fn insert(&self, membership: &Membership) -> Result<(), StoreError>;
    /// 重新激活软删除的行：status 置回 active，joined_at 刷新，角色保留
    async fn reactivate(
        &self,
        group_id: &str,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn set_status(
        &self,
        group_id: &str,
        user_id: &str,
        status: MemberStatus,
    ) -> Result<(), StoreError>;
    async fn set_role(
        &self,
        group_id: &str,
        user_id: &str,
        role: GroupRole,
    ) -> Result<(), StoreError>;
    /// 读时修复用的 upsert：确保创建者持有 active 的 owner 行
    async fn upsert_owner(&self, group_id: &str, user_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait JoinRequestStore: Send + Sync {
    async fn find_by_id(&self, request_id: &str) -> Result<Option<JoinRequest>, StoreError>;
    async fn find_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<JoinRequest>, StoreError>;
    async fn pending_for_group(&self, group_id: &str) -> Result<Vec<JoinRequest>, StoreError>;
    /// 取代已决申请：删除该用户在该群组的旧行并插入新的 pending 行
    async fn replace_for_user(&self, request: &JoinRequest) -> Result<(), StoreError>;
    async fn delete(&self, request_id: &str) -> Result<(), StoreError>;
    /// 批准：成员行 upsert 与状态翻转在同一事务中完成
    async fn approve(&self, request_id: &str, joined_at: DateTime<Utc>)
    -> Result<(), StoreError>;
    async fn set_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<(), StoreError>;
    /// 用户各群组的申请状态，供推荐列表标注
    async fn statuses_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RequestStatus>, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, StoreError>;
}
