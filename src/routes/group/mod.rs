mod handler;

pub use handler::{create_group, delete_group, get_group_detail, get_suggested_groups, update_group};
