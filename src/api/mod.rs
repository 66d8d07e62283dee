pub mod admin;
pub mod extract;
pub mod routes;

pub use routes::create_router;

use crate::applications::ApplicationStore;
use crate::auth::{JwtHandler, UserStore};
use crate::config::Config;
use crate::db::Database;
use crate::scholarships::ScholarshipStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub users: Arc<UserStore>,
    pub scholarships: Arc<ScholarshipStore>,
    pub applications: Arc<ApplicationStore>,
    pub jwt: Arc<JwtHandler>,
}

impl AppState {
    /// Open the database, build the stores and seed the admin account.
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;

        let users = Arc::new(UserStore::new(db.clone(), config.bcrypt_cost));
        if config.seed_admin && users.seed_admin(&config.admin_email, &config.admin_password)? {
            info!("👑 Seeded admin account {}", config.admin_email);
        }

        let jwt = Arc::new(JwtHandler::new(
            &config.jwt_secret(),
            config.jwt_expiration_hours,
        ));

        Ok(Self {
            scholarships: Arc::new(ScholarshipStore::new(db.clone())),
            applications: Arc::new(ApplicationStore::new(db.clone())),
            users,
            jwt,
            db,
            config: Arc::new(config),
        })
    }
}
