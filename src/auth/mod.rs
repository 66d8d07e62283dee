//! Authentication Module
//! Mission: Bearer tokens, user accounts and role-based access

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, require_permission, AuthUser};
pub use models::{User, UserRole};
pub use permissions::Permission;
pub use user_store::UserStore;
