//! Role Capabilities
//! Mission: Map roles to capabilities in exactly one place
//!
//! Route groups and the dashboard ask `role.can(permission)` instead of
//! comparing role strings.

use crate::auth::models::UserRole;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// List every user account
    ManageUsers,
    /// Read the aggregate admin counters
    ViewStats,
    /// Work the review queue and set outcomes
    ReviewApplications,
    /// Create, edit and delete scholarships
    ManageScholarships,
    /// Apply for a scholarship
    ApplyForScholarships,
}

impl Permission {
    /// Roles holding this permission.
    pub fn roles(self) -> &'static [UserRole] {
        match self {
            Permission::ManageUsers | Permission::ViewStats | Permission::ManageScholarships => {
                &[UserRole::Admin]
            }
            Permission::ReviewApplications => &[UserRole::Reviewer, UserRole::Admin],
            Permission::ApplyForScholarships => &[UserRole::Student],
        }
    }
}

impl UserRole {
    pub fn can(self, permission: Permission) -> bool {
        permission.roles().contains(&self)
    }

    /// Reviewers and admins may read any application; students only their own.
    pub fn sees_all_applications(self) -> bool {
        self.can(Permission::ReviewApplications)
    }
}
