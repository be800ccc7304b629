// 入群申请模型
// 每个 (group_id, user_id) 约定最多一条申请，由读-判-写保证而非唯一约束

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 申请状态，pending 为唯一非终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }

    /// 已决的申请可被新的 pending 申请取代
    pub fn is_resolved(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// group_join_requests 表的一行
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JoinRequest {
    pub request_id: String,
    pub group_id: String,
    pub user_id: String,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl JoinRequest {
    pub fn new_pending(group_id: &str, user_id: &str, message: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            message,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// 审批列表的展示投影，申请人昵称与头像在应用层关联 users 表得到
#[derive(Debug, Serialize)]
pub struct PendingRequest {
    pub request_id: String,
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}
