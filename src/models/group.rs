// 群组模型
// 聚合统计字段（总里程、总骑行次数）由行程模块维护，这里只读

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::join_request::RequestStatus;
use super::member::GroupMember;

/// groups 表的一行
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub created_by: String,
    pub is_private: bool,
    pub total_distance: f64,
    pub total_rides: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

/// 部分字段更新，None 表示保持不变
#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: Option<bool>,
}

/// 群组详情：群组行加上成员列表
/// member_count 始终与展示的成员视图一致，与底层行数无关
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub group: Group,
    pub members: Vec<GroupMember>,
    pub member_count: usize,
}

/// 推荐列表条目，request_status 供调用方渲染 "Pending" / "Join"
#[derive(Debug, Serialize)]
pub struct SuggestedGroup {
    pub group_id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub is_private: bool,
    pub total_distance: f64,
    pub total_rides: i64,
    pub request_status: Option<RequestStatus>,
}

impl SuggestedGroup {
    pub fn new(group: Group, request_status: Option<RequestStatus>) -> Self {
        Self {
            group_id: group.group_id,
            name: group.name,
            description: group.description,
            location: group.location,
            avatar_url: group.avatar_url,
            is_private: group.is_private,
            total_distance: group.total_distance,
            total_rides: group.total_rides,
            request_status,
        }
    }
}
