mod group;
mod join_request;
mod member;
mod user;

pub use group::{CreateGroupRequest, Group, GroupDetail, SuggestedGroup, UpdateGroupRequest};
pub use join_request::{JoinRequest, PendingRequest, RequestStatus};
pub use member::{GroupMember, GroupRole, MemberStatus, Membership};
pub use user::UserProfile;
