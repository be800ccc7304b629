// 角色服务
// 提升/撤销管理员与所有权转移
// 提权与降权按 groups.created_by 判定操作者，而不是其成员行的角色：
// 被提升的管理员不能再提升别人，只有创建者可以

use std::sync::Arc;

use crate::models::GroupRole;
use crate::store::{GroupStore, MembershipStore, StoreError};

#[derive(Clone)]
pub struct RoleService {
    groups: Arc<dyn GroupStore>,
    members: Arc<dyn MembershipStore>,
}

impl RoleService {
    pub fn new(groups: Arc<dyn GroupStore>, members: Arc<dyn MembershipStore>) -> Self {
        Self { groups, members }
    }

    /// 提升为管理员，仅创建者可操作；已是管理员时为无操作
    pub async fn promote_to_admin(
        &self,
        group_id: &str,
        target_user_id: &str,
        acting_user_id: &str,
    ) -> Result<(), StoreError> {
        self.change_role(group_id, target_user_id, acting_user_id, GroupRole::Admin)
            .await
    }

    /// 撤销管理员，仅创建者可操作；已是普通成员时为无操作
    pub async fn demote_to_member(
        &self,
        group_id: &str,
        target_user_id: &str,
        acting_user_id: &str,
    ) -> Result<(), StoreError> {
        self.change_role(group_id, target_user_id, acting_user_id, GroupRole::Member)
            .await
    }

    async fn change_role(
        &self,
        group_id: &str,
        target_user_id: &str,
        acting_user_id: &str,
        role: GroupRole,
    ) -> Result<(), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if group.created_by != acting_user_id {
            return Err(StoreError::PermissionDenied(
                "only the group creator can change member roles".to_string(),
            ));
        }

        if group.created_by == target_user_id {
            return Err(StoreError::Validation(
                "the creator's role cannot be changed".to_string(),
            ));
        }

        let membership = self
            .members
            .find(group_id, target_user_id)
            .await?
            .filter(|m| m.status.is_active())
            .ok_or(StoreError::NotFound("membership"))?;

        if membership.role == role {
            return Ok(());
        }

        self.members.set_role(group_id, target_user_id, role).await?;
        tracing::info!(
            "User {} set role of {} in group {} to {}",
            acting_user_id,
            target_user_id,
            group_id,
            role
        );
        Ok(())
    }

    /// 所有权转移：created_by 指向新群主，新旧群主角色互换，单事务落库
    pub async fn transfer_ownership(
        &self,
        group_id: &str,
        new_owner_id: &str,
        acting_user_id: &str,
    ) -> Result<(), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if group.created_by != acting_user_id {
            return Err(StoreError::PermissionDenied(
                "only the group creator can transfer ownership".to_string(),
            ));
        }

        if new_owner_id == acting_user_id {
            return Err(StoreError::Validation(
                "the new owner is already the group owner".to_string(),
            ));
        }

        // 新群主必须已经是活跃成员
        let is_active = self
            .members
            .find(group_id, new_owner_id)
            .await?
            .map(|m| m.status.is_active())
            .unwrap_or(false);
        if !is_active {
            return Err(StoreError::Validation(
                "the new owner must be an active member of the group".to_string(),
            ));
        }

        self.groups
            .transfer_ownership(group_id, new_owner_id, acting_user_id)
            .await?;
        tracing::info!(
            "Ownership of group {} transferred from {} to {}",
            group_id,
            acting_user_id,
            new_owner_id
        );
        Ok(())
    }
}
