//! Applications Module
//! Mission: Student submissions against scholarships and their review outcome

pub mod api;
pub mod models;
pub mod store;

pub use models::{Application, ApplicationData, ApplicationStatus, ReviewDecision, ReviewStatus};
pub use store::ApplicationStore;
