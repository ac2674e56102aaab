//! Seeding the shipped fixture into a fresh database.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use rolegate::pagination::Window;

const ALL: Window = Window {
    limit: -1,
    offset: 0,
};

#[test]
fn test_seed_round_trips_every_membership() {
    let mut conn = setup_test_db();
    fixture::seed(&mut conn, fixture()).unwrap();

    let (stored, total) =
        queries::list_memberships_paginated(&conn, &Default::default(), ALL).unwrap();

    assert_eq!(total as usize, fixture().memberships.len());
    let mut expected = fixture().memberships.clone();
    expected.sort_by_key(|m| m.id);
    assert_eq!(stored, expected);
}

#[test]
fn test_seed_issues_one_working_key_per_user() {
    let mut conn = setup_test_db();
    let keys = fixture::seed(&mut conn, fixture()).unwrap();

    assert_eq!(keys.len(), fixture().users.len());
    for user in &fixture().users {
        let key = &keys[&user.username];
        assert!(key.starts_with("rg_"));
        let (resolved, _) = queries::get_user_by_api_key(&conn, key).unwrap().unwrap();
        assert_eq!(&resolved, user);
    }
}

#[test]
fn test_seed_is_all_or_nothing() {
    let mut conn = setup_test_db();
    let mut broken = fixture().clone();
    // Same user twice in one organization violates UNIQUE(user_id, org_id)
    let mut duplicate = broken.memberships[0].clone();
    duplicate.id = 1000;
    broken.memberships.push(duplicate);

    let err = fixture::seed(&mut conn, &broken).unwrap_err();
    assert!(matches!(err, rolegate::fixture::FixtureError::Seed(_)));

    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 0);
}

#[test]
fn test_fixture_users_are_consistent() {
    let fixture = fixture();
    for membership in &fixture.memberships {
        let user = fixture
            .users
            .iter()
            .find(|u| u.id == membership.user.id)
            .unwrap_or_else(|| panic!("membership {} has unknown user", membership.id));
        assert_eq!(user.username, membership.user.username);
        assert!(
            fixture
                .organizations
                .iter()
                .any(|o| o.id == membership.organization)
        );
    }
}
