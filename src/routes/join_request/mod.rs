mod handler;

pub use handler::{
    approve_join_request, cancel_join_request, create_join_request, get_pending_requests,
    reject_join_request,
};
