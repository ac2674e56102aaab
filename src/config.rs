use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    /// Directory holding users.json, organizations.json and memberships.json
    pub assets_dir: String,
    pub audit_log_enabled: bool,
    pub dev_mode: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ROLEGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "rolegate.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "rolegate_audit.db".to_string()),
            assets_dir: env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".to_string()),
            audit_log_enabled: env_flag("AUDIT_LOG_ENABLED", true),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
