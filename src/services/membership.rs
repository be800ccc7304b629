// 成员服务
// 活跃成员列表（含创建者一致性修复）、幂等加入、退出、移除

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::ensure_moderator;
use crate::models::{GroupMember, GroupRole, MemberStatus, Membership, UserProfile};
use crate::store::{GroupStore, MembershipStore, StoreError, UserStore};

/// 修复写入失败时拼接的占位展示名，该成员只存在于本次响应中
const CREATOR_FALLBACK_NAME: &str = "Créateur";

#[derive(Clone)]
pub struct MembershipService {
    groups: Arc<dyn GroupStore>,
    members: Arc<dyn MembershipStore>,
    users: Arc<dyn UserStore>,
}

impl MembershipService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        members: Arc<dyn MembershipStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            groups,
            members,
            users,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn MembershipStore> {
        &self.members
    }

    /// 群组成员列表，展示计数与成员视图始终一致
    pub async fn group_members(
        &self,
        group_id: &str,
    ) -> Result<(Vec<GroupMember>, usize), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        self.members_with_repair(group_id, Some(&group.created_by))
            .await
    }

    /// 活跃成员列表；传入创建者 ID 时执行读时一致性修复
    ///
    /// 创建者缺席时先尝试 upsert 补回 owner 行并重读；写入失败则在
    /// 内存结果前端拼接一个未落库的占位成员，保证调用方视图自洽。
    pub async fn members_with_repair(
        &self,
        group_id: &str,
        creator_id: Option<&str>,
    ) -> Result<(Vec<GroupMember>, usize), StoreError> {
        let mut rows = self.members.active_members(group_id).await?;
        let mut synthesize_creator = false;

        if let Some(creator) = creator_id {
            let creator_present = rows.iter().any(|m| m.user_id == creator);

            if !creator_present {
                match self.members.upsert_owner(group_id, creator).await {
                    Ok(()) => {
                        tracing::info!(
                            "Repaired missing creator membership for group {}",
                            group_id
                        );
                        rows = self.members.active_members(group_id).await?;
                    }
                    Err(e) => {
                        // 修复失败只降级展示，不让读路径整体失败
                        tracing::warn!(
                            "Creator membership repair failed for group {}: {}",
                            group_id,
                            e
                        );
                        synthesize_creator = true;
                    }
                }
            }
        }

        let mut members = self.resolve_profiles(&rows).await?;
        let mut member_count = members.len();

        if synthesize_creator {
            // 占位成员不落库，计数按隐式创建者 +1
            let creator = creator_id.unwrap_or_default();
            members.insert(
                0,
                GroupMember {
                    user_id: creator.to_string(),
                    display_name: CREATOR_FALLBACK_NAME.to_string(),
                    avatar_url: None,
                    role: GroupRole::Owner,
                    joined_at: Utc::now(),
                },
            );
            member_count = members.len();
        }

        Ok((members, member_count))
    }

    /// 幂等加入
    /// 软删除的行被重新激活（角色保留），活跃行原样返回；
    /// 新成员行只允许为公开群组创建，私密群组必须走入群申请
    pub async fn join(&self, group_id: &str, user_id: &str) -> Result<Membership, StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if let Some(existing) = self.members.find(group_id, user_id).await? {
            if existing.status.is_active() {
                return Ok(existing);
            }

            let joined_at = Utc::now();
            self.members.reactivate(group_id, user_id, joined_at).await?;
            tracing::debug!("Reactivated membership of {} in group {}", user_id, group_id);
            return Ok(Membership {
                status: MemberStatus::Active,
                joined_at,
                ..existing
            });
        }

        if group.is_private {
            return Err(StoreError::Validation(
                "this group is private, send a join request instead".to_string(),
            ));
        }

        let membership = Membership::new_member(group_id, user_id);
        self.members.insert(&membership).await?;
        tracing::info!("User {} joined group {}", user_id, group_id);
        Ok(membership)
    }

    /// 退出群组（软删除）
    /// 创建者必须先转移所有权才能退出，群组不能没有群主
    pub async fn leave(&self, group_id: &str, user_id: &str) -> Result<(), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if group.created_by == user_id {
            return Err(StoreError::Validation(
                "the group owner must transfer ownership before leaving".to_string(),
            ));
        }

        let membership = self
            .members
            .find(group_id, user_id)
            .await?
            .filter(|m| m.status.is_active())
            .ok_or_else(|| StoreError::Validation("not an active member of this group".to_string()))?;

        let next = membership
            .status
            .on_leave()
            .ok_or_else(|| StoreError::Validation("not an active member of this group".to_string()))?;

        self.members.set_status(group_id, user_id, next).await?;
        tracing::info!("User {} left group {}", user_id, group_id);
        Ok(())
    }

    /// 移除成员（软删除），要求操作者为群主或管理员；创建者不可被移除
    pub async fn remove(
        &self,
        group_id: &str,
        target_user_id: &str,
        acting_user_id: &str,
    ) -> Result<(), StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        ensure_moderator(&self.members, &group, acting_user_id).await?;

        if group.created_by == target_user_id {
            return Err(StoreError::PermissionDenied(
                "the group creator cannot be removed".to_string(),
            ));
        }

        let membership = self
            .members
            .find(group_id, target_user_id)
            .await?
            .filter(|m| m.status.is_active())
            .ok_or(StoreError::NotFound("membership"))?;

        let next = membership
            .status
            .on_remove()
            .ok_or(StoreError::NotFound("membership"))?;

        self.members
            .set_status(group_id, target_user_id, next)
            .await?;
        tracing::info!(
            "User {} removed {} from group {}",
            acting_user_id,
            target_user_id,
            group_id
        );
        Ok(())
    }

    /// 在应用层把成员行与用户档案拼成展示投影
    async fn resolve_profiles(
        &self,
        rows: &[Membership],
    ) -> Result<Vec<GroupMember>, StoreError> {
        let ids: Vec<String> = rows.iter().map(|m| m.user_id.clone()).collect();
        let profiles: HashMap<String, UserProfile> = self
            .users
            .find_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();

        Ok(rows
            .iter()
            .map(|m| {
                let profile = profiles.get(&m.user_id);
                GroupMember {
                    user_id: m.user_id.clone(),
                    display_name: profile
                        .map(|p| p.display_name())
                        .unwrap_or_else(|| m.user_id.clone()),
                    avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                    role: m.role,
                    joined_at: m.joined_at,
                }
            })
            .collect())
    }
}
