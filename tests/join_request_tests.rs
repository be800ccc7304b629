// 入群申请工作流测试

mod common;

use backend::models::{GroupRole, MemberStatus, RequestStatus};
use backend::store::StoreError;
use common::{FakeDb, make_services, past_time};

#[tokio::test]
async fn request_refused_for_public_group() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", false);

    let services = make_services(&db);
    let err = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn request_refused_for_active_member() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);
    db.seed_membership("g1", "u2", GroupRole::Member, MemberStatus::Active, past_time());

    let services = make_services(&db);
    let err = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn pending_request_is_returned_unchanged() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let first = services
        .requests
        .request_to_join("g1", "u2", Some("hi".to_string()))
        .await
        .unwrap();
    let second = services
        .requests
        .request_to_join("g1", "u2", Some("hello again".to_string()))
        .await
        .unwrap();

    assert_eq!(first.request_id, second.request_id);
    assert_eq!(second.message.as_deref(), Some("hi"));
    assert_eq!(db.requests_for("g1", "u2").len(), 1);
}

#[tokio::test]
async fn rejected_request_is_superseded_by_new_pending() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let first = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();
    services.requests.reject(&first.request_id, "u1").await.unwrap();

    let second = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();

    // 被驳回的旧行被删除，只剩一条新的 pending
    let remaining = db.requests_for("g1", "u2");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].request_id, second.request_id);
    assert_eq!(remaining[0].status, RequestStatus::Pending);
    assert!(db.request(&first.request_id).is_none());
}

#[tokio::test]
async fn cancel_deletes_only_pending_request() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let request = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();

    services.requests.cancel("g1", "u2").await.unwrap();
    assert!(db.request(&request.request_id).is_none());
}

#[tokio::test]
async fn cancel_refused_for_resolved_request() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let request = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();
    services.requests.reject(&request.request_id, "u1").await.unwrap();

    let err = services.requests.cancel("g1", "u2").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(
        db.request(&request.request_id).unwrap().status,
        RequestStatus::Rejected
    );
}

#[tokio::test]
async fn approve_requires_moderator_role() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_user("u3", "carol");
    db.seed_group("g1", "u1", true);
    db.seed_membership("g1", "u3", GroupRole::Member, MemberStatus::Active, past_time());

    let services = make_services(&db);
    let request = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();

    let err = services
        .requests
        .approve(&request.request_id, "u3")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied(_)));
    assert_eq!(
        db.request(&request.request_id).unwrap().status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn approve_creates_membership_and_resolves_request() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let request = services
        .requests
        .request_to_join("g1", "u2", Some("hi".to_string()))
        .await
        .unwrap();
    services
        .requests
        .approve(&request.request_id, "u1")
        .await
        .unwrap();

    assert_eq!(
        db.request(&request.request_id).unwrap().status,
        RequestStatus::Approved
    );

    // 新成员出现在成员列表里
    let (members, count) = services.members.group_members("g1").await.unwrap();
    assert_eq!(count, 2);
    let member = members.iter().find(|m| m.user_id == "u2").unwrap();
    assert_eq!(member.role, GroupRole::Member);

    let membership = db.membership("g1", "u2").unwrap();
    assert!(membership.status.is_active());
}

#[tokio::test]
async fn approve_refused_for_resolved_request() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_group("g1", "u1", true);

    let services = make_services(&db);
    let request = services
        .requests
        .request_to_join("g1", "u2", None)
        .await
        .unwrap();
    services
        .requests
        .approve(&request.request_id, "u1")
        .await
        .unwrap();

    let err = services
        .requests
        .approve(&request.request_id, "u1")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn pending_listing_is_moderator_only_and_resolves_profiles() {
    let db = FakeDb::new();
    db.seed_user("u1", "alice");
    db.seed_user("u2", "bob");
    db.seed_user("u3", "carol");
    db.seed_group("g1", "u1", true);
    db.seed_membership("g1", "u3", GroupRole::Member, MemberStatus::Active, past_time());

    let services = make_services(&db);
    services
        .requests
        .request_to_join("g1", "u2", Some("hi".to_string()))
        .await
        .unwrap();

    let err = services.requests.pending("g1", "u3").await.unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied(_)));

    let pending = services.requests.pending("g1", "u1").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, "u2");
    assert_eq!(pending[0].display_name, "bob");
    assert_eq!(pending[0].message.as_deref(), Some("hi"));
}
