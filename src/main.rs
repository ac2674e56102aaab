use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rolegate::config::Config;
use rolegate::db::{AppState, create_pool, init_audit_db, init_db, queries};
use rolegate::fixture::{self, FixtureSet};
use rolegate::models::{ActorType, AuditAction};

#[derive(Parser, Debug)]
#[command(name = "rolegate")]
#[command(about = "Role-based organization membership service")]
struct Cli {
    /// Seed the database from the fixture files in ASSETS_DIR (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Delete databases on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Load the fixture and insert it, printing one API key per user.
/// Skipped when the database already holds users.
fn seed_dev_data(state: &AppState, assets_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = state.db.get()?;
    let audit_conn = state.audit.get()?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if existing > 0 {
        tracing::info!("Database already has data, skipping seed");
        return Ok(());
    }

    let fixture = FixtureSet::load(assets_dir)?;
    let keys = fixture::seed(&mut conn, &fixture)?;

    queries::create_audit_log(
        &audit_conn,
        state.audit_log_enabled,
        ActorType::System,
        None,
        None,
        AuditAction::SeedFixture.as_ref(),
        "fixture",
        assets_dir,
        Some(&serde_json::json!({
            "users": fixture.users.len(),
            "organizations": fixture.organizations.len(),
            "memberships": fixture.memberships.len(),
        })),
        None,
        None,
        None,
        None,
    )?;

    let mut usernames: Vec<&String> = keys.keys().collect();
    usernames.sort();

    println!();
    println!("--- COPY FROM HERE ---");
    for username in usernames {
        println!("  {}: {}", username, keys[username]);
    }
    println!("--- END COPY ---");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolegate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        audit_log_enabled: config.audit_log_enabled,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ROLEGATE_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&state, &config.assets_dir) {
            tracing::error!("Seeding from {} failed: {}", config.assets_dir, e);
            std::process::exit(1);
        }
    }

    let app = rolegate::app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: databases will be deleted on exit");
    }

    tracing::info!("Rolegate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral databases...");
        for path in [&config.database_path, &config.audit_database_path] {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::info!("Removed {}", path),
                Err(e) => tracing::warn!("Failed to remove {}: {}", path, e),
            }
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
