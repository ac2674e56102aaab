use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActorType {
    User,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    UpdateMembership,
    DeleteMembership,
    SeedFixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub timestamp: i64,
    pub actor_type: ActorType,
    pub user_id: Option<i64>,
    /// Username of the actor at the time of the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: Option<serde_json::Value>,
    pub org_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Visible prefix of the API key used (e.g. "rg_a1b2c3d4")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_credential: Option<String>,
}

impl AuditLog {
    /// Format as a single human-readable line.
    ///
    /// Example: `[2024-01-15 14:32:05] "user2" update_membership membership 9 in org 2`
    pub fn formatted(&self) -> String {
        use chrono::{TimeZone, Utc};

        let timestamp = Utc
            .timestamp_opt(self.timestamp, 0)
            .single()
            .map(|dt| format!("[{}]", dt.format("%Y-%m-%d %H:%M:%S")))
            .unwrap_or_else(|| format!("[{}]", self.timestamp));

        let actor = match (&self.username, self.actor_type) {
            (Some(name), _) => format!("\"{}\"", name),
            (None, ActorType::System) => "system".to_string(),
            (None, ActorType::User) => self
                .user_id
                .map(|id| format!("user {}", id))
                .unwrap_or_else(|| "unknown user".to_string()),
        };

        let mut line = format!(
            "{} {} {} {} {}",
            timestamp, actor, self.action, self.resource_type, self.resource_id
        );
        if let Some(org_id) = self.org_id {
            line.push_str(&format!(" in org {}", org_id));
        }
        line
    }
}
