use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
};
use rusqlite::Connection;

use crate::authz::{self, Actor, Decision};
use crate::db::{AppState, queries, queries::MembershipFilter};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::UserContext;
use crate::models::{
    ActorType, AuditAction, Membership, MembershipListQuery, OrgScopeQuery, UpdateMembership,
};
use crate::pagination::{Paginated, PaginationQuery};
use crate::util::AuditLogBuilder;

/// Load a membership, requiring it to belong to `org_id` when one is given.
fn load_target(conn: &Connection, id: i64, org_id: Option<i64>) -> Result<Membership> {
    let membership =
        queries::get_membership_by_id(conn, id)?.or_not_found(msg::MEMBERSHIP_NOT_FOUND)?;

    if org_id.is_some_and(|org_id| org_id != membership.organization) {
        return Err(AppError::NotFound(msg::MEMBERSHIP_NOT_FOUND.into()));
    }

    Ok(membership)
}

fn log_denial(ctx: &UserContext, action: &str, target: &Membership, decision: Decision) {
    if let Decision::Deny(reason) = decision {
        tracing::info!(
            "Denied {} {} on membership {} (org {}): {}",
            ctx.user.username,
            action,
            target.id,
            target.organization,
            reason
        );
    }
}

/// List memberships visible to the caller.
///
/// Unscoped, admins get every membership and everyone else gets their own.
/// With `org_id`, members and admins get the whole organization.
pub async fn list_memberships(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Query(query): Query<MembershipListQuery>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Paginated<Membership>>> {
    let window = pagination.window()?;
    let conn = state.db.get()?;

    let mut filter = MembershipFilter {
        role: query.role,
        ..Default::default()
    };

    match query.org_id {
        Some(org_id) => {
            queries::get_organization_by_id(&conn, org_id)?.or_not_found(msg::ORG_NOT_FOUND)?;
            let own = ctx.membership_in(&conn, org_id)?;
            let decision = authz::view_organization(&Actor::new(&ctx.user, own.as_ref()));
            if let Decision::Deny(reason) = decision {
                tracing::info!(
                    "Denied {} listing org {}: {}",
                    ctx.user.username,
                    org_id,
                    reason
                );
            }
            decision.into_result()?;
            filter.org_id = Some(org_id);
        }
        None if ctx.is_admin() => {}
        None => filter.user_id = Some(ctx.user.id),
    }

    let (items, total) = queries::list_memberships_paginated(&conn, &filter, window)?;
    Ok(Json(Paginated::new(items, total, &pagination, window)))
}

pub async fn get_membership(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<i64>,
    Query(scope): Query<OrgScopeQuery>,
) -> Result<Json<Membership>> {
    let conn = state.db.get()?;
    let target = load_target(&conn, id, scope.org_id)?;

    let own = ctx.membership_in(&conn, target.organization)?;
    authz::view_membership(&Actor::new(&ctx.user, own.as_ref()), &target).into_result()?;

    Ok(Json(target))
}

/// Change a membership's role. The caller must outrank the current role and
/// may assign at most their own (see `authz::change_role`).
pub async fn update_membership(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<i64>,
    Query(scope): Query<OrgScopeQuery>,
    headers: HeaderMap,
    Json(input): Json<UpdateMembership>,
) -> Result<Json<Membership>> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let target = load_target(&conn, id, scope.org_id)?;
    let own = ctx.membership_in(&conn, target.organization)?;

    let decision = authz::change_role(&Actor::new(&ctx.user, own.as_ref()), &target, input.role);
    log_denial(&ctx, "role change", &target, decision);
    decision.into_result()?;

    let updated = queries::update_membership_role(&conn, id, input.role)?
        .or_not_found(msg::MEMBERSHIP_NOT_FOUND)?;

    let resource_id = id.to_string();
    let entry = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::User, Some(ctx.user.id), Some(&ctx.user.username))
        .action(AuditAction::UpdateMembership)
        .resource("membership", &resource_id)
        .details(&serde_json::json!({
            "username": target.user.username,
            "from": target.role,
            "to": updated.role,
        }))
        .org(target.organization)
        .auth_credential(&ctx.auth_method.key_prefix)
        .save()?;
    tracing::info!("{}", entry.formatted());

    Ok(Json(updated))
}

pub async fn delete_membership(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<i64>,
    Query(scope): Query<OrgScopeQuery>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let target = load_target(&conn, id, scope.org_id)?;
    let own = ctx.membership_in(&conn, target.organization)?;

    let decision = authz::remove_member(&Actor::new(&ctx.user, own.as_ref()), &target);
    log_denial(&ctx, "removal", &target, decision);
    decision.into_result()?;

    if !queries::delete_membership(&conn, id)? {
        return Err(AppError::NotFound(msg::MEMBERSHIP_NOT_FOUND.into()));
    }

    let resource_id = id.to_string();
    let entry = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled, &headers)
        .actor(ActorType::User, Some(ctx.user.id), Some(&ctx.user.username))
        .action(AuditAction::DeleteMembership)
        .resource("membership", &resource_id)
        .details(&serde_json::json!({
            "username": target.user.username,
            "role": target.role,
        }))
        .org(target.organization)
        .auth_credential(&ctx.auth_method.key_prefix)
        .save()?;
    tracing::info!("{}", entry.formatted());

    Ok(StatusCode::NO_CONTENT)
}
