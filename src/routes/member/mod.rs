mod handler;

pub use handler::{
    demote_member, get_group_members, join_group, leave_group, promote_member, remove_member,
    transfer_ownership,
};
