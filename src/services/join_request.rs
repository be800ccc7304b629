// 入群申请服务
// pending → approved / rejected；已决申请可被新的 pending 申请取代

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::ensure_moderator;
use crate::models::{JoinRequest, PendingRequest, UserProfile};
use crate::store::{GroupStore, JoinRequestStore, MembershipStore, StoreError, UserStore};

#[derive(Clone)]
pub struct JoinRequestService {
    groups: Arc<dyn GroupStore>,
    members: Arc<dyn MembershipStore>,
    requests: Arc<dyn JoinRequestStore>,
    users: Arc<dyn UserStore>,
}

impl JoinRequestService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        members: Arc<dyn MembershipStore>,
        requests: Arc<dyn JoinRequestStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            groups,
            members,
            requests,
            users,
        }
    }

    /// 申请加入私密群组
    /// 已有 pending 申请时原样返回；已决的旧申请被新 pending 行取代
    pub async fn request_to_join(
        &self,
        group_id: &str,
        user_id: &str,
        message: Option<String>,
    ) -> Result<JoinRequest, StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        if !group.is_private {
            return Err(StoreError::Validation(
                "this group is public, join it directly".to_string(),
            ));
        }

        let is_member = self
            .members
            .find(group_id, user_id)
            .await?
            .map(|m| m.status.is_active())
            .unwrap_or(false);
        if is_member {
            return Err(StoreError::Validation(
                "already an active member of this group".to_string(),
            ));
        }

        if let Some(existing) = self.requests.find_for_user(group_id, user_id).await? {
            if existing.status.is_pending() {
                return Ok(existing);
            }
        }

        let request = JoinRequest::new_pending(group_id, user_id, message);
        self.requests.replace_for_user(&request).await?;
        tracing::info!("User {} requested to join group {}", user_id, group_id);
        Ok(request)
    }

    /// 撤回自己的申请，只有 pending 状态可撤回（硬删除）
    pub async fn cancel(&self, group_id: &str, user_id: &str) -> Result<(), StoreError> {
        let request = self
            .requests
            .find_for_user(group_id, user_id)
            .await?
            .ok_or(StoreError::NotFound("join request"))?;

        if !request.status.is_pending() {
            return Err(StoreError::Validation(
                "only a pending request can be cancelled".to_string(),
            ));
        }

        self.requests.delete(&request.request_id).await?;
        tracing::info!("User {} cancelled join request for group {}", user_id, group_id);
        Ok(())
    }

    /// 批准申请：成员行与申请状态在同一事务中落库
    pub async fn approve(
        &self,
        request_id: &str,
        approver_id: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(StoreError::NotFound("join request"))?;

        if !request.status.is_pending() {
            return Err(StoreError::Validation(
                "this request has already been resolved".to_string(),
            ));
        }

        let group = self
            .groups
            .find_by_id(&request.group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        ensure_moderator(&self.members, &group, approver_id).await?;

        self.requests.approve(request_id, Utc::now()).await?;
        tracing::info!(
            "User {} approved join request {} for group {}",
            approver_id,
            request_id,
            request.group_id
        );
        Ok(())
    }

    /// 驳回申请
    pub async fn reject(&self, request_id: &str, rejecter_id: &str) -> Result<(), StoreError> {
        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(StoreError::NotFound("join request"))?;

        if !request.status.is_pending() {
            return Err(StoreError::Validation(
                "this request has already been resolved".to_string(),
            ));
        }

        let group = self
            .groups
            .find_by_id(&request.group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        ensure_moderator(&self.members, &group, rejecter_id).await?;

        self.requests
            .set_status(request_id, crate::models::RequestStatus::Rejected)
            .await?;
        tracing::info!(
            "User {} rejected join request {} for group {}",
            rejecter_id,
            request_id,
            request.group_id
        );
        Ok(())
    }

    /// 待审列表，群主或管理员可见，带申请人档案
    pub async fn pending(
        &self,
        group_id: &str,
        acting_user_id: &str,
    ) -> Result<Vec<PendingRequest>, StoreError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(StoreError::NotFound("group"))?;

        ensure_moderator(&self.members, &group, acting_user_id).await?;

        let requests = self.requests.pending_for_group(group_id).await?;
        let ids: Vec<String> = requests.iter().map(|r| r.user_id.clone()).collect();
        let profiles: HashMap<String, UserProfile> = self
            .users
            .find_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();

        Ok(requests
            .into_iter()
            .map(|r| {
                let profile = profiles.get(&r.user_id);
                PendingRequest {
                    request_id: r.request_id,
                    display_name: profile
                        .map(|p| p.display_name())
                        .unwrap_or_else(|| r.user_id.clone()),
                    avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                    user_id: r.user_id,
                    message: r.message,
                    created_at: r.created_at,
                }
            })
            .collect())
    }
}
