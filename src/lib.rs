//! Scholarship Backend Library
//!
//! Exposes the API server pieces and the dashboard client for the binaries and tests.

pub mod api;
pub mod applications;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod scholarships;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ApiError, ApiResult};
