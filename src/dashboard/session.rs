//! Dashboard session: bearer token plus the user it belongs to.

use crate::auth::{models::UserResponse, Permission, UserRole};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserResponse,
}

impl Session {
    pub fn new(token: String, user: UserResponse) -> Self {
        Self { token, user }
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.user.role.can(permission)
    }

    /// Read a stored session; a missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session file {}", path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write session file {}", path.display()))
    }

    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove session file {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> Session {
        Session::new(
            "tok".into(),
            UserResponse {
                id: 7,
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role,
                created_at: "2024-01-01T00:00:00.000000Z".into(),
            },
        )
    }

    #[test]
    fn test_permissions_follow_role() {
        assert!(session(UserRole::Admin).can(Permission::ViewStats));
        assert!(!session(UserRole::Student).can(Permission::ViewStats));
        assert!(session(UserRole::Student).can(Permission::ApplyForScholarships));
        assert!(session(UserRole::Reviewer).can(Permission::ReviewApplications));
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");

        assert!(Session::load(&path).unwrap().is_none());

        let stored = session(UserRole::Reviewer);
        stored.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Some(stored));

        Session::clear(&path).unwrap();
        assert!(!path.exists());
    }
}
