//! Membership access decisions.
//!
//! Every decision is a pure function of the acting user, the actor's own
//! membership in the organization in question, and the target. Handlers
//! resolve those from the database and turn a `Decision::Deny` into a 403.
//!
//! Rules:
//! - Admins (superusers) see everything and may change or remove any
//!   membership except an owner's, and may not hand out the owner role.
//! - Active members see every membership of their organization.
//! - A member may change or remove another membership only if their own role
//!   manages members and the target ranks strictly below them. A role change
//!   may raise the target at most to the member's own rank.
//! - Nobody acts on their own membership through these rules.

use crate::error::{AppError, Result, msg};
use crate::models::{Membership, MembershipRole, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// `Deny` becomes `AppError::Forbidden` carrying the denial reason.
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(AppError::Forbidden(reason.into())),
        }
    }
}

/// A user acting within one organization.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub user: &'a User,
    /// The actor's active membership in the organization, if any
    pub membership: Option<&'a Membership>,
}

impl<'a> Actor<'a> {
    pub fn new(user: &'a User, membership: Option<&'a Membership>) -> Self {
        Self { user, membership }
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_superuser
    }

    pub fn role(&self) -> Option<MembershipRole> {
        self.membership.map(|m| m.role)
    }

    fn owns(&self, target: &Membership) -> bool {
        target.user.id == self.user.id
    }
}

/// Whether the actor may list an organization's memberships.
pub fn view_organization(actor: &Actor) -> Decision {
    if actor.is_admin() || actor.membership.is_some() {
        Decision::Allow
    } else {
        Decision::Deny(msg::NOT_ORG_MEMBER)
    }
}

/// Whether the actor may read one membership. `actor.membership` must be the
/// actor's membership in the target's organization.
pub fn view_membership(actor: &Actor, target: &Membership) -> Decision {
    if actor.owns(target) {
        return Decision::Allow;
    }
    view_organization(actor)
}

/// Checks shared by role changes and removals.
fn manage_target(actor: &Actor, target: &Membership) -> std::result::Result<(), Decision> {
    if actor.is_admin() {
        if target.role == MembershipRole::Owner {
            return Err(Decision::Deny(msg::OWNER_MEMBERSHIP));
        }
        return Ok(());
    }

    let Some(role) = actor.role() else {
        return Err(Decision::Deny(msg::NOT_ORG_MEMBER));
    };
    if actor.owns(target) {
        return Err(Decision::Deny(msg::SELF_MEMBERSHIP));
    }
    if !role.can_manage_members() {
        return Err(Decision::Deny(msg::CANNOT_MANAGE_MEMBERS));
    }
    if target.role >= role {
        return Err(Decision::Deny(msg::TARGET_NOT_BELOW));
    }
    Ok(())
}

/// Whether the actor may set `target`'s role to `new_role`.
pub fn change_role(actor: &Actor, target: &Membership, new_role: MembershipRole) -> Decision {
    if let Err(denied) = manage_target(actor, target) {
        return denied;
    }

    if actor.is_admin() {
        if new_role == MembershipRole::Owner {
            return Decision::Deny(msg::OWNER_ROLE);
        }
        return Decision::Allow;
    }

    match actor.role() {
        Some(role) if new_role <= role => Decision::Allow,
        _ => Decision::Deny(msg::ROLE_ABOVE_ACTOR),
    }
}

/// Whether the actor may remove `target` from its organization.
pub fn remove_member(actor: &Actor, target: &Membership) -> Decision {
    match manage_target(actor, target) {
        Ok(()) => Decision::Allow,
        Err(denied) => denied,
    }
}
