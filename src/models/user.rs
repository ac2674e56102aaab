use serde::{Deserialize, Serialize};

/// User identity. Superusers are system administrators and are not bound to
/// any organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_superuser: bool,
}
