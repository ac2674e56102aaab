//! Membership removal through `DELETE /memberships/{id}`.

use axum::http::StatusCode;
use rolegate::models::MembershipRole::*;

#[path = "../common/mod.rs"]
mod common;
use common::*;

const ORG: i64 = 2;

#[tokio::test]
async fn maintainer_removes_a_worker() {
    let t = TestApp::new();
    let target = member(ORG, Worker, 1);

    let (status, body) = t
        .delete(
            &member(ORG, Maintainer, 0).username,
            &format!("/memberships/{}?org_id={}", target.id, ORG),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert_eq!(stored_role(&t.state, target.id), None);

    let (status, body) = t
        .get("admin1", &format!("/memberships?org_id={}&page_size=all", ORG))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], fixture().memberships_of_org(ORG).len() - 1);
}

#[tokio::test]
async fn removal_follows_rank() {
    let t = TestApp::new();

    // Peers cannot remove each other
    let peer = member(ORG, Maintainer, 1);
    let (status, _) = t
        .delete(
            &member(ORG, Maintainer, 0).username,
            &format!("/memberships/{}", peer.id),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_role(&t.state, peer.id), Some(Maintainer));

    // Supervisors cannot manage members at all
    let worker = member(ORG, Worker, 1);
    let (status, _) = t
        .delete(
            &member(ORG, Supervisor, 0).username,
            &format!("/memberships/{}", worker.id),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_role(&t.state, worker.id), Some(Worker));
}

#[tokio::test]
async fn nobody_removes_their_own_membership() {
    let t = TestApp::new();
    let owner = member(ORG, Owner, 0);

    let (status, _) = t
        .delete(&owner.username, &format!("/memberships/{}", owner.id))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_role(&t.state, owner.id), Some(Owner));
}

#[tokio::test]
async fn admin_removes_non_owners_only() {
    let t = TestApp::new();
    let owner = member(ORG, Owner, 0);
    let supervisor = member(ORG, Supervisor, 1);

    let (status, _) = t
        .delete("admin2", &format!("/memberships/{}", owner.id))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_role(&t.state, owner.id), Some(Owner));

    let (status, _) = t
        .delete("admin2", &format!("/memberships/{}", supervisor.id))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stored_role(&t.state, supervisor.id), None);
}

#[tokio::test]
async fn removed_member_loses_organization_access() {
    let t = TestApp::new();
    let target = member(ORG, Worker, 0);

    let (status, _) = t
        .delete(
            &member(ORG, Owner, 0).username,
            &format!("/memberships/{}", target.id),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t
        .get(&target.username, &format!("/memberships?org_id={}", ORG))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn removal_is_audited() {
    let t = TestApp::with_audit_log();
    let target = member(ORG, Supervisor, 1);

    let (status, _) = t
        .delete(
            &member(ORG, Owner, 0).username,
            &format!("/memberships/{}", target.id),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let conn = t.state.audit.get().unwrap();
    let logs =
        queries::list_audit_logs_for_resource(&conn, "membership", &target.id.to_string())
            .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, AuditAction::DeleteMembership.as_ref());
    assert_eq!(logs[0].details.as_ref().unwrap()["role"], "supervisor");
}
