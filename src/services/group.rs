// 群组服务
// 创建、详情、更新、删除与推荐列表

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{MembershipService, ensure_moderator};
use crate::models::{CreateGroupRequest, Group, GroupDetail, SuggestedGroup, UpdateGroupRequest};
use crate::store::{GroupStore, JoinRequestStore, StoreError};

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupStore>,
    requests: Arc<dyn JoinRequestStore>,
    membership: MembershipService,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        requests: Arc<dyn JoinRequestStore>,
        membership: MembershipService,
    ) -> Self {
        Self {
            groups,
            requests,
            membership,
        }
    }

    /// 创建群组，群组行与创建者的 owner 成员行在同一事务中写入
    pub async fn create(
        &self,
        req: CreateGroupRequest,
        creator_id: &str,
    ) -> Result<Group, StoreError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("group name cannot be empty".to_string()));
        }

        let group = Group {
            group_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: req.description,
            location: req.location,
            avatar_url: req.avatar_url,
            created_by: creator_id.to_string(),
            is_private: req.is_private,
            total_distance: 0.0,
            total_rides: 0,
            created_at: Utc::now(),
        };

        self.groups.create_with_owner(&group).await?;
        tracing::info!("User {} created group {}: {}", creator_id, group.group_id, group.name);
        Ok(group)
    }

    /// 群组详情，成员列表经过创建者一致性修复
    pub async fn detail(&self, group_id: &str) -> Result<GroupDetail, StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        let (members, member_count) = self
            .membership
            .members_with_repair(group_id, Some(&group.created_by))
            .await?;

        Ok(GroupDetail {
            group,
            members,
            member_count,
        })
    }

    /// 更新群组资料，群主或管理员可操作
    pub async fn update(
        &self,
        group_id: &str,
        updates: UpdateGroupRequest,
        acting_user_id: &str,
    ) -> Result<Group, StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        ensure_moderator(self.membership.store(), &group, acting_user_id).await?;

        if let Some(name) = &updates.name {
            if name.trim().is_empty() {
                return Err(StoreError::Validation("group name cannot be empty".to_string()));
            }
        }

        self.groups.update(group_id, &updates).await
    }

    /// 删除群组，仅群主可操作
    pub async fn delete(&self, group_id: &str, acting_user_id: &str) -> Result<(), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if group.created_by != acting_user_id {
            return Err(StoreError::PermissionDenied(
                "only the group owner can delete the group".to_string(),
            ));
        }

        self.groups.delete(group_id).await?;
        tracing::info!("User {} deleted group {}", acting_user_id, group_id);
        Ok(())
    }

    /// 推荐列表：用户尚未加入的群组，并带上其入群申请状态
    pub async fn suggested(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<SuggestedGroup>, StoreError> {
        let groups = self.groups.find_not_joined(user_id, limit).await?;
        let statuses = self.requests.statuses_for_user(user_id).await?;

        Ok(groups
            .into_iter()
            .map(|g| {
                let status = statuses.get(&g.group_id).copied();
                SuggestedGroup::new(g, status)
            })
            .collect())
    }
}
