//! Runtime Configuration
//! Mission: Resolve server settings from CLI flags, environment and `.env`

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Server configuration. Every flag falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "scholarship")]
#[command(about = "Scholarship management REST API")]
pub struct Config {
    /// Address the API server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: String,

    /// SQLite database path (relative paths resolve against the crate root)
    #[arg(long, env = "DATABASE_PATH", default_value = "scholarships.db")]
    pub database_path: String,

    /// HMAC secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Bearer token lifetime in hours
    #[arg(
        long,
        env = "JWT_EXPIRATION_HOURS",
        default_value_t = 24,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub jwt_expiration_hours: i64,

    /// bcrypt work factor for password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Create a default admin account when none exists
    #[arg(long, env = "SEED_ADMIN", default_value_t = true, action = clap::ArgAction::Set)]
    pub seed_admin: bool,

    #[arg(long, env = "ADMIN_EMAIL", default_value = "admin@scholarships.local")]
    pub admin_email: String,

    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin12345")]
    pub admin_password: String,

    /// Gate scholarship create/update/delete behind the admin role
    #[arg(long, env = "SCHOLARSHIP_WRITES_REQUIRE_ADMIN", default_value_t = false, action = clap::ArgAction::Set)]
    pub scholarship_writes_require_admin: bool,
}

impl Config {
    /// Parse flags and environment, loading `.env` files first.
    pub fn load() -> Self {
        load_env();
        let mut config = Self::parse();
        config.database_path = resolve_data_path(&config.database_path);
        config
    }

    /// Secret for token signing, falling back to a development value.
    pub fn jwt_secret(&self) -> String {
        match self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret.to_string(),
            None => {
                warn!("JWT_SECRET not set, using development secret");
                DEV_JWT_SECRET.to_string()
            }
        }
    }

    /// In-memory configuration used by tests: cheap hashing, no file paths.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            database_path: ":memory:".to_string(),
            jwt_secret: Some("test-secret-key-12345".to_string()),
            jwt_expiration_hours: 24,
            bcrypt_cost: 4,
            seed_admin: true,
            admin_email: "admin@scholarships.local".to_string(),
            admin_password: "admin12345".to_string(),
            scholarship_writes_require_admin: false,
        }
    }
}

fn resolve_data_path(raw: &str) -> String {
    if raw == ":memory:" {
        return raw.to_string();
    }

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(p)
        .to_string_lossy()
        .to_string()
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate root.
    let _ = dotenv::dotenv();

    let candidate = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
