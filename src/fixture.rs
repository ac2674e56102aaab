//! Fixed datasets under `assets/`.
//!
//! Each file is `{"results": [...]}`. Records are parsed strictly (unknown
//! fields are rejected) so a record that round-trips through the database and
//! the API can be compared with the file structurally.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::db::queries;
use crate::error::AppError;
use crate::models::{Membership, MembershipRole, Organization, User};

pub const MEMBERSHIPS_FILE: &str = "memberships.json";
pub const USERS_FILE: &str = "users.json";
pub const ORGANIZATIONS_FILE: &str = "organizations.json";

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No {role} at position {position} in organization {org}")]
    Lookup {
        org: i64,
        role: MembershipRole,
        position: usize,
    },

    #[error("Failed to seed fixture: {0}")]
    Seed(#[from] AppError),
}

#[derive(Deserialize)]
struct ResultsEnvelope<T> {
    results: Vec<T>,
}

fn load_results<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: ResultsEnvelope<T> =
        serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(envelope.results)
}

/// Load the `results` array of a memberships file.
pub fn load_memberships(path: impl AsRef<Path>) -> Result<Vec<Membership>, FixtureError> {
    load_results(path.as_ref())
}

/// The complete dataset: users, organizations and memberships, in file order.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    pub users: Vec<User>,
    pub organizations: Vec<Organization>,
    pub memberships: Vec<Membership>,
}

impl FixtureSet {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let dir = dir.as_ref();
        let set = Self {
            users: load_results(&dir.join(USERS_FILE))?,
            organizations: load_results(&dir.join(ORGANIZATIONS_FILE))?,
            memberships: load_memberships(dir.join(MEMBERSHIPS_FILE))?,
        };
        tracing::debug!(
            "Loaded fixture from {}: {} users, {} organizations, {} memberships",
            dir.display(),
            set.users.len(),
            set.organizations.len(),
            set.memberships.len()
        );
        Ok(set)
    }

    pub fn role_index(&self) -> RoleIndex {
        RoleIndex::build(&self.memberships)
    }

    pub fn memberships_of_user(&self, username: &str) -> Vec<Membership> {
        self.memberships
            .iter()
            .filter(|m| m.user.username == username)
            .cloned()
            .collect()
    }

    pub fn memberships_of_org(&self, org_id: i64) -> Vec<Membership> {
        self.memberships
            .iter()
            .filter(|m| m.organization == org_id)
            .cloned()
            .collect()
    }

    /// Users without an active membership in the organization.
    pub fn non_members_of_org(&self, org_id: i64) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| {
                !self
                    .memberships
                    .iter()
                    .any(|m| m.organization == org_id && m.user.id == u.id && m.is_active)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleEntry {
    pub username: String,
    pub id: i64,
}

/// Organization -> role -> members holding that role, in first-seen order.
///
/// Combinations without members are absent rather than empty.
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    orgs: BTreeMap<i64, BTreeMap<MembershipRole, Vec<RoleEntry>>>,
}

impl RoleIndex {
    pub fn build(memberships: &[Membership]) -> Self {
        let mut orgs: BTreeMap<i64, BTreeMap<MembershipRole, Vec<RoleEntry>>> = BTreeMap::new();
        for membership in memberships {
            orgs.entry(membership.organization)
                .or_default()
                .entry(membership.role)
                .or_default()
                .push(RoleEntry {
                    username: membership.user.username.clone(),
                    id: membership.id,
                });
        }
        Self { orgs }
    }

    pub fn members(&self, org: i64, role: MembershipRole) -> Option<&[RoleEntry]> {
        self.orgs
            .get(&org)
            .and_then(|roles| roles.get(&role))
            .map(Vec::as_slice)
    }

    /// The member at `position` under `role` in `org`.
    pub fn member(
        &self,
        org: i64,
        role: MembershipRole,
        position: usize,
    ) -> Result<&RoleEntry, FixtureError> {
        self.members(org, role)
            .and_then(|entries| entries.get(position))
            .ok_or(FixtureError::Lookup {
                org,
                role,
                position,
            })
    }

    pub fn organizations(&self) -> impl Iterator<Item = i64> + '_ {
        self.orgs.keys().copied()
    }
}

/// Insert the dataset and issue one API key per user.
///
/// Returns username -> API key. Runs in a single transaction.
pub fn seed(
    conn: &mut Connection,
    fixture: &FixtureSet,
) -> Result<HashMap<String, String>, FixtureError> {
    let tx = conn.transaction().map_err(AppError::from)?;

    let mut keys = HashMap::with_capacity(fixture.users.len());
    for user in &fixture.users {
        queries::create_user(&tx, user)?;
        let (_, api_key) = queries::create_api_key(&tx, user.id)?;
        keys.insert(user.username.clone(), api_key);
    }
    for org in &fixture.organizations {
        queries::create_organization(&tx, org)?;
    }
    for membership in &fixture.memberships {
        queries::create_membership(&tx, membership)?;
    }

    tx.commit().map_err(AppError::from)?;

    tracing::info!(
        "Seeded {} users, {} organizations, {} memberships",
        fixture.users.len(),
        fixture.organizations.len(),
        fixture.memberships.len()
    );
    Ok(keys)
}
