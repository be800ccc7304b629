// 服务层
// 每个服务只持有存储 trait 对象，在 main 中构造一次后放入应用状态

mod group;
mod join_request;
mod membership;
mod roles;

pub use group::GroupService;
pub use join_request::JoinRequestService;
pub use membership::MembershipService;
pub use roles::RoleService;

use std::sync::Arc;

use crate::models::Group;
use crate::store::{GroupStore, JoinRequestStore, MembershipStore, StoreError, UserStore};

#[derive(Clone)]
pub struct Services {
    pub groups: GroupService,
    pub members: MembershipService,
    pub requests: JoinRequestService,
    pub roles: RoleService,
}

impl Services {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        members: Arc<dyn MembershipStore>,
        requests: Arc<dyn JoinRequestStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let membership =
            MembershipService::new(groups.clone(), members.clone(), users.clone());
        Self {
            groups: GroupService::new(groups.clone(), requests.clone(), membership.clone()),
            members: membership,
            requests: JoinRequestService::new(
                groups.clone(),
                members.clone(),
                requests,
                users,
            ),
            roles: RoleService::new(groups, members),
        }
    }
}

/// 管理权限检查：群组创建者，或持有 active 管理角色的成员
/// 创建者按 groups.created_by 判定，成员行缺失（历史脏数据）时依然有效
pub(crate) async fn ensure_moderator(
    members: &Arc<dyn MembershipStore>,
    group: &Group,
    user_id: &str,
) -> Result<(), StoreError> {
    if group.created_by == user_id {
        return Ok(());
    }

    let membership = members.find(&group.group_id, user_id).await?;
    let allowed = membership
        .map(|m| m.status.is_active() && m.role.can_moderate())
        .unwrap_or(false);

    if allowed {
        Ok(())
    } else {
        Err(StoreError::PermissionDenied(
            "requires owner or admin role in this group".to_string(),
        ))
    }
}
