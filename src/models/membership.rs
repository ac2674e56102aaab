use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Organization roles, declared lowest to highest. The derived `Ord` is the rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
    Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MembershipRole {
    Worker,
    Supervisor,
    Maintainer,
    Owner,
}

impl MembershipRole {
    pub const ALL: [MembershipRole; 4] = [
        MembershipRole::Worker,
        MembershipRole::Supervisor,
        MembershipRole::Maintainer,
        MembershipRole::Owner,
    ];

    pub fn can_manage_members(&self) -> bool {
        matches!(self, MembershipRole::Maintainer | MembershipRole::Owner)
    }
}

/// The user summary embedded in a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MembershipUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A user's membership in an organization. The serialized form is the wire
/// format of the API and the format of `assets/memberships.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Membership {
    pub id: i64,
    pub user: MembershipUser,
    pub organization: i64,
    pub is_active: bool,
    pub joined_date: Option<String>,
    pub role: MembershipRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMembership {
    pub role: MembershipRole,
}

/// Query parameters accepted by `GET /memberships`.
#[derive(Debug, Default, Deserialize)]
pub struct MembershipListQuery {
    pub org_id: Option<i64>,
    pub role: Option<MembershipRole>,
}

/// Query parameters accepted by the single-membership endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct OrgScopeQuery {
    pub org_id: Option<i64>,
}
