// 群组成员关系模型
// (group_id, user_id) 复合主键，角色与生命周期状态为封闭枚举

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 成员角色，按小写文本落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }

    /// 是否拥有管理权限（审批、移除成员）
    pub fn can_moderate(&self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, GroupRole::Owner)
    }
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 成员生命周期状态，离开与移除均为软删除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Left,
    Removed,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Left => "left",
            MemberStatus::Removed => "removed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MemberStatus::Active)
    }

    /// 自行退出的状态迁移，仅对活跃成员有意义
    pub fn on_leave(self) -> Option<MemberStatus> {
        match self {
            MemberStatus::Active => Some(MemberStatus::Left),
            MemberStatus::Left | MemberStatus::Removed => None,
        }
    }

    /// 被管理员移除的状态迁移
    pub fn on_remove(self) -> Option<MemberStatus> {
        match self {
            MemberStatus::Active => Some(MemberStatus::Removed),
            MemberStatus::Left | MemberStatus::Removed => None,
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// group_members 表的一行
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new_member(group_id: &str, user_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            role: GroupRole::Member,
            status: MemberStatus::Active,
            joined_at: Utc::now(),
        }
    }

    pub fn new_owner(group_id: &str, user_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            role: GroupRole::Owner,
            status: MemberStatus::Active,
            joined_at: Utc::now(),
        }
    }
}

/// 成员列表的展示投影，昵称与头像在应用层关联 users 表得到
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}
