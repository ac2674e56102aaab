//! Who can see which memberships through `GET /memberships`.

use axum::http::StatusCode;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn admin_sees_every_membership() {
    let t = TestApp::new();

    let (status, body) = t.get("admin2", "/memberships?page_size=all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], fixture().memberships.len());
    assert_same_records(&body, &fixture().memberships);
}

#[tokio::test]
async fn unscoped_listing_shows_only_own_memberships() {
    let t = TestApp::new();

    for username in ["business1", "user1", "dummy1", "worker2"] {
        let expected = fixture().memberships_of_user(username);
        assert!(!expected.is_empty(), "{} has no memberships", username);

        let (status, body) = t.get(username, "/memberships?page_size=all").await;

        assert_eq!(status, StatusCode::OK, "{} listing own memberships", username);
        assert_same_records(&body, &expected);
    }
}

#[tokio::test]
async fn user_with_two_organizations_sees_both() {
    let t = TestApp::new();

    let (_, body) = t.get("user1", "/memberships?page_size=all").await;

    let mut orgs: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["organization"].as_i64().unwrap())
        .collect();
    orgs.sort();
    assert_eq!(orgs, vec![1, 2]);
}

#[tokio::test]
async fn members_see_their_whole_organization() {
    let t = TestApp::new();
    let expected = fixture().memberships_of_org(1);

    for membership in &expected {
        let username = &membership.user.username;
        let (status, body) = t.get(username, "/memberships?org_id=1&page_size=all").await;

        assert_eq!(status, StatusCode::OK, "{} listing org 1", username);
        assert_same_records(&body, &expected);
    }
}

#[tokio::test]
async fn admin_sees_any_organization() {
    let t = TestApp::new();

    let (status, body) = t.get("admin1", "/memberships?org_id=2&page_size=all").await;

    assert_eq!(status, StatusCode::OK);
    assert_same_records(&body, &fixture().memberships_of_org(2));
}

#[tokio::test]
async fn non_members_are_denied_organization_listing() {
    let t = TestApp::new();

    for username in ["user2", "worker3"] {
        let (status, _) = t.get(username, "/memberships?org_id=1").await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} listing org 1", username);
    }
}

#[tokio::test]
async fn every_non_member_is_denied() {
    let t = TestApp::new();

    for org in role_index().organizations() {
        for user in fixture().non_members_of_org(org) {
            if user.is_superuser {
                continue;
            }
            let (status, _) = t
                .get(&user.username, &format!("/memberships?org_id={}", org))
                .await;
            assert_eq!(
                status,
                StatusCode::FORBIDDEN,
                "{} listing org {}",
                user.username,
                org
            );
        }
    }
}

#[tokio::test]
async fn default_page_size_truncates() {
    let t = TestApp::new();
    let total = fixture().memberships.len();
    assert!(total > 10);

    let (status, body) = t.get("admin1", "/memberships").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], total);
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
    assert_eq!(body["next"], 2);
    assert!(body["previous"].is_null());
}

#[tokio::test]
async fn second_page_holds_the_remainder() {
    let t = TestApp::new();
    let total = fixture().memberships.len();

    let (status, body) = t.get("admin1", "/memberships?page=2&page_size=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), total - 10);
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], 1);
}

#[tokio::test]
async fn results_are_ordered_by_id() {
    let t = TestApp::new();

    let (_, body) = t.get("admin1", "/memberships?page_size=all").await;

    let ids: Vec<i64> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn role_filter_narrows_results() {
    let t = TestApp::new();

    let (status, body) = t
        .get("business2", "/memberships?org_id=2&role=maintainer&page_size=all")
        .await;

    assert_eq!(status, StatusCode::OK);
    let expected: Vec<Membership> = fixture()
        .memberships_of_org(2)
        .into_iter()
        .filter(|m| m.role == MembershipRole::Maintainer)
        .collect();
    assert_same_records(&body, &expected);
}

#[tokio::test]
async fn member_reads_a_peer_membership() {
    let t = TestApp::new();
    let target = member(1, MembershipRole::Owner, 0);
    let expected = fixture()
        .memberships
        .iter()
        .find(|m| m.id == target.id)
        .unwrap();

    let (status, body) = t
        .get("dummy1", &format!("/memberships/{}?org_id=1", target.id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::to_value(expected).unwrap());
}

#[tokio::test]
async fn outsider_cannot_read_a_membership() {
    let t = TestApp::new();
    let target = member(1, MembershipRole::Owner, 0);

    let (status, _) = t
        .get("worker3", &format!("/memberships/{}", target.id))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
