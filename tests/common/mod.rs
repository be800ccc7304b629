// 测试用的内存存储假实现
// 四个存储 trait 都由同一个 FakeDb 实现，以便跨表操作共享状态
// fail_member_writes 打开后成员表的写入全部失败，用来驱动修复降级路径

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use backend::models::{
    Group, GroupRole, JoinRequest, MemberStatus, Membership, RequestStatus, UpdateGroupRequest,
    UserProfile,
};
use backend::services::Services;
use backend::store::{
    GroupStore, JoinRequestStore, MembershipStore, StoreError, UserStore,
};

#[derive(Default)]
struct Inner {
    groups: HashMap<String, Group>,
    members: HashMap<(String, String), Membership>,
    requests: HashMap<String, JoinRequest>,
    users: HashMap<String, UserProfile>,
}

#[derive(Default)]
pub struct FakeDb {
    inner: Mutex<Inner>,
    pub fail_member_writes: AtomicBool,
}

fn write_failure() -> StoreError {
    StoreError::Database(sqlx::Error::PoolClosed)
}

impl FakeDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_member_writes(&self, fail: bool) {
        self.fail_member_writes.store(fail, Ordering::SeqCst);
    }

    fn member_writes_fail(&self) -> bool {
        self.fail_member_writes.load(Ordering::SeqCst)
    }

    pub fn seed_user(&self, user_id: &str, username: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(
            user_id.to_string(),
            UserProfile {
                user_id: user_id.to_string(),
                username: username.to_string(),
                first_name: None,
                last_name: None,
                avatar_url: None,
            },
        );
    }

    /// 完整播种：群组行加创建者的 owner 成员行
    pub fn seed_group(&self, group_id: &str, creator_id: &str, is_private: bool) {
        self.seed_group_row(group_id, creator_id, is_private);
        self.seed_membership(
            group_id,
            creator_id,
            GroupRole::Owner,
            MemberStatus::Active,
            past_time(),
        );
    }

    /// 漂移播种：只有群组行，没有创建者成员行
    pub fn seed_group_row(&self, group_id: &str, creator_id: &str, is_private: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.groups.insert(
            group_id.to_string(),
            Group {
                group_id: group_id.to_string(),
                name: format!("group-{}", group_id),
                description: None,
                location: None,
                avatar_url: None,
                created_by: creator_id.to_string(),
                is_private,
                total_distance: 0.0,
                total_rides: 0,
                created_at: past_time(),
            },
        );
    }

    pub fn seed_membership(
        &self,
        group_id: &str,
        user_id: &str,
        role: GroupRole,
        status: MemberStatus,
        joined_at: DateTime<Utc>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.members.insert(
            (group_id.to_string(), user_id.to_string()),
            Membership {
                group_id: group_id.to_string(),
                user_id: user_id.to_string(),
                role,
                status,
                joined_at,
            },
        );
    }

    pub fn membership(&self, group_id: &str, user_id: &str) -> Option<Membership> {
        let inner = self.inner.lock().unwrap();
        inner
            .members
            .get(&(group_id.to_string(), user_id.to_string()))
            .cloned()
    }

    pub fn group(&self, group_id: &str) -> Option<Group> {
        let inner = self.inner.lock().unwrap();
        inner.groups.get(group_id).cloned()
    }

    pub fn request(&self, request_id: &str) -> Option<JoinRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.get(request_id).cloned()
    }

    pub fn requests_for(&self, group_id: &str, user_id: &str) -> Vec<JoinRequest> {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .values()
            .filter(|r| r.group_id == group_id && r.user_id == user_id)
            .cloned()
            .collect()
    }
}

pub fn make_services(db: &Arc<FakeDb>) -> Services {
    Services::new(db.clone(), db.clone(), db.clone(), db.clone())
}

pub fn past_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

#[async_trait]
impl GroupStore for FakeDb {
    async fn create_with_owner(&self, group: &Group) -> Result<(), StoreError> {
        // 与真实实现一致：事务性，成员写失败时群组行也不落库
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        inner.groups.insert(group.group_id.clone(), group.clone());
        inner.members.insert(
            (group.group_id.clone(), group.created_by.clone()),
            Membership {
                group_id: group.group_id.clone(),
                user_id: group.created_by.clone(),
                role: GroupRole::Owner,
                status: MemberStatus::Active,
                joined_at: group.created_at,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, group_id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.group(group_id))
    }

    async fn update(
        &self,
        group_id: &str,
        updates: &UpdateGroupRequest,
    ) -> Result<Group, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let group = inner
            .groups
            .get_mut(group_id)
            .ok_or(StoreError::NotFound("group"))?;
        if let Some(name) = &updates.name {
            group.name = name.clone();
        }
        if let Some(description) = &updates.description {
            group.description = Some(description.clone());
        }
        if let Some(location) = &updates.location {
            group.location = Some(location.clone());
        }
        if let Some(avatar_url) = &updates.avatar_url {
            group.avatar_url = Some(avatar_url.clone());
        }
        if let Some(is_private) = updates.is_private {
            group.is_private = is_private;
        }
        Ok(group.clone())
    }

    async fn delete(&self, group_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .groups
            .remove(group_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("group"))
    }

    async fn find_not_joined(&self, user_id: &str, limit: i64) -> Result<Vec<Group>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| {
                inner
                    .members
                    .get(&(g.group_id.clone(), user_id.to_string()))
                    .map(|m| !m.status.is_active())
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        groups.truncate(limit as usize);
        Ok(groups)
    }

    async fn transfer_ownership(
        &self,
        group_id: &str,
        new_owner_id: &str,
        old_owner_id: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let group = inner
            .groups
            .get_mut(group_id)
            .ok_or(StoreError::NotFound("group"))?;
        group.created_by = new_owner_id.to_string();
        if let Some(m) = inner
            .members
            .get_mut(&(group_id.to_string(), new_owner_id.to_string()))
        {
            m.role = GroupRole::Owner;
        }
        if let Some(m) = inner
            .members
            .get_mut(&(group_id.to_string(), old_owner_id.to_string()))
        {
            if m.role == GroupRole::Owner {
                m.role = GroupRole::Admin;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for FakeDb {
    async fn find(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self.membership(group_id, user_id))
    }

    async fn active_members(&self, group_id: &str) -> Result<Vec<Membership>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut members: Vec<Membership> = inner
            .members
            .values()
            .filter(|m| m.group_id == group_id && m.status.is_active())
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn insert(&self, membership: &Membership) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let key = (membership.group_id.clone(), membership.user_id.clone());
        // ON CONFLICT DO NOTHING
        inner.members.entry(key).or_insert_with(|| membership.clone());
        Ok(())
    }

    async fn reactivate(
        &self,
        group_id: &str,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let m = inner
            .members
            .get_mut(&(group_id.to_string(), user_id.to_string()))
            .ok_or(StoreError::NotFound("membership"))?;
        m.status = MemberStatus::Active;
        m.joined_at = joined_at;
        Ok(())
    }

    async fn set_status(
        &self,
        group_id: &str,
        user_id: &str,
        status: MemberStatus,
    ) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let m = inner
            .members
            .get_mut(&(group_id.to_string(), user_id.to_string()))
            .ok_or(StoreError::NotFound("membership"))?;
        m.status = status;
        Ok(())
    }

    async fn set_role(
        &self,
        group_id: &str,
        user_id: &str,
        role: GroupRole,
    ) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let m = inner
            .members
            .get_mut(&(group_id.to_string(), user_id.to_string()))
            .ok_or(StoreError::NotFound("membership"))?;
        m.role = role;
        Ok(())
    }

    async fn upsert_owner(&self, group_id: &str, user_id: &str) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let key = (group_id.to_string(), user_id.to_string());
        match inner.members.get_mut(&key) {
            Some(m) => {
                m.role = GroupRole::Owner;
                m.status = MemberStatus::Active;
            }
            None => {
                inner.members.insert(
                    key,
                    Membership {
                        group_id: group_id.to_string(),
                        user_id: user_id.to_string(),
                        role: GroupRole::Owner,
                        status: MemberStatus::Active,
                        joined_at: Utc::now(),
                    },
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JoinRequestStore for FakeDb {
    async fn find_by_id(&self, request_id: &str) -> Result<Option<JoinRequest>, StoreError> {
        Ok(self.request(request_id))
    }

    async fn find_for_user(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Option<JoinRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .values()
            .filter(|r| r.group_id == group_id && r.user_id == user_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn pending_for_group(&self, group_id: &str) -> Result<Vec<JoinRequest>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut requests: Vec<JoinRequest> = inner
            .requests
            .values()
            .filter(|r| r.group_id == group_id && r.status.is_pending())
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(requests)
    }

    async fn replace_for_user(&self, request: &JoinRequest) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .requests
            .retain(|_, r| !(r.group_id == request.group_id && r.user_id == request.user_id));
        inner
            .requests
            .insert(request.request_id.clone(), request.clone());
        Ok(())
    }

    async fn delete(&self, request_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .requests
            .remove(request_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("join request"))
    }

    async fn approve(
        &self,
        request_id: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.member_writes_fail() {
            return Err(write_failure());
        }
        let mut inner = self.inner.lock().unwrap();
        let request = inner
            .requests
            .get(request_id)
            .cloned()
            .ok_or(StoreError::NotFound("join request"))?;

        let key = (request.group_id.clone(), request.user_id.clone());
        match inner.members.get_mut(&key) {
            Some(m) => {
                m.status = MemberStatus::Active;
                m.joined_at = joined_at;
            }
            None => {
                inner.members.insert(
                    key,
                    Membership {
                        group_id: request.group_id.clone(),
                        user_id: request.user_id.clone(),
                        role: GroupRole::Member,
                        status: MemberStatus::Active,
                        joined_at,
                    },
                );
            }
        }
        inner.requests.get_mut(request_id).unwrap().status = RequestStatus::Approved;
        Ok(())
    }

    async fn set_status(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let r = inner
            .requests
            .get_mut(request_id)
            .ok_or(StoreError::NotFound("join request"))?;
        r.status = status;
        Ok(())
    }

    async fn statuses_for_user(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, RequestStatus>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .map(|r| (r.group_id.clone(), r.status))
            .collect())
    }
}

#[async_trait]
impl UserStore for FakeDb {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }
}
