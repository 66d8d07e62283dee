//! Scholarships Module
//! Mission: Funding opportunities published by administrators

pub mod api;
pub mod models;
pub mod store;

pub use models::{Scholarship, ScholarshipStatus};
pub use store::ScholarshipStore;
