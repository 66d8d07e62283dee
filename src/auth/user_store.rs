//! User Storage
//! Mission: Store user accounts and revoked tokens in SQLite

use crate::auth::models::{User, UserRole};
use crate::db::{like_pattern, Database};
use crate::models::{now_rfc3339, Page, PageRequest};
use anyhow::{Context, Result};
use bcrypt::{hash, verify};
use chrono::Utc;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use tracing::{debug, info, warn};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Fields a profile update may change
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Admin user listing filter
#[derive(Debug, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Case-insensitive substring over name OR email
    pub search: Option<String>,
}

/// User storage with SQLite backend
pub struct UserStore {
    db: Database,
    bcrypt_cost: u32,
}

impl UserStore {
    pub fn new(db: Database, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Create the default admin account if no admin exists. Returns true if one was created.
    pub fn seed_admin(&self, email: &str, password: &str) -> Result<bool> {
        let count: i64 = self
            .db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count > 0 {
            return Ok(false);
        }

        self.create_user("Administrator", email, password, UserRole::Admin)?;

        info!("🔐 Default admin user created (email: {})", email);
        warn!("⚠️  CHANGE DEFAULT ADMIN PASSWORD IN PRODUCTION!");
        Ok(true)
    }

    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User> {
        let password_hash = hash(password, self.bcrypt_cost).context("Failed to hash password")?;
        let now = now_rfc3339();

        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![name, email, password_hash, role, now],
        )
        .context("Failed to insert user")?;

        let user = User {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("✅ Created user: {} ({})", user.email, user.role);

        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                Self::map_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                Self::map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Whether `email` belongs to an account other than `except_id`.
    pub fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool> {
        let conn = self.db.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2",
            params![email, except_id.unwrap_or(-1)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Verify email and password. `None` on unknown email or wrong password.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        Ok(valid.then_some(user))
    }

    /// Apply the provided fields. `None` if the user does not exist.
    pub fn update_profile(&self, id: i64, changes: ProfileChanges) -> Result<Option<User>> {
        let Some(mut user) = self.get_user_by_id(id)? else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password) = changes.password {
            user.password_hash =
                hash(password, self.bcrypt_cost).context("Failed to hash password")?;
        }
        user.updated_at = now_rfc3339();

        self.db
            .conn()
            .execute(
                "UPDATE users SET name = ?1, email = ?2, password_hash = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![user.name, user.email, user.password_hash, user.updated_at, id],
            )
            .context("Failed to update user")?;

        debug!("Updated profile for user {}", id);
        Ok(Some(user))
    }

    /// List users (admin only), newest first
    pub fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>> {
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(role) = filter.role {
            args.push(Value::Text(role.as_str().to_string()));
            clauses.push(format!("role = ?{}", args.len()));
        }
        if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            args.push(Value::Text(like_pattern(term.trim())));
            let n = args.len();
            clauses.push(format!(
                "(name LIKE ?{n} ESCAPE '\\' OR email LIKE ?{n} ESCAPE '\\')"
            ));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.db.conn();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM users {}", where_sql),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        args.push(Value::Integer(page.limit()));
        args.push(Value::Integer(page.offset_i64()));
        let sql = format!(
            "SELECT {} FROM users {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            USER_COLUMNS,
            where_sql,
            args.len() - 1,
            args.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params_from_iter(args.iter()), Self::map_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, page, total as u64))
    }

    pub fn count_users(&self) -> Result<u64> {
        let count: i64 = self
            .db
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Blacklist a token id until its expiry; prunes rows that expired already.
    pub fn revoke_token(&self, jti: &str, expires_at: usize) -> Result<()> {
        let now = Utc::now().timestamp();
        let conn = self.db.conn();

        conn.execute(
            "DELETE FROM revoked_tokens WHERE expires_at < ?1",
            params![now],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?1, ?2)",
            params![jti, expires_at as i64],
        )
        .context("Failed to revoke token")?;

        debug!("Revoked token {}", jti);
        Ok(())
    }

    pub fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM revoked_tokens WHERE jti = ?1",
            params![jti],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> UserStore {
        UserStore::new(Database::open_in_memory().unwrap(), 4)
    }

    #[test]
    fn test_seed_admin_only_once() {
        let store = create_test_store();

        assert!(store.seed_admin("admin@example.com", "admin12345").unwrap());
        assert!(!store.seed_admin("other@example.com", "admin12345").unwrap());

        let admin = store.get_user_by_email("admin@example.com").unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(store.get_user_by_email("other@example.com").unwrap().is_none());
    }

    #[test]
    fn test_authenticate() {
        let store = create_test_store();
        store
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .unwrap();

        assert!(store.authenticate("ada@example.com", "password123").unwrap().is_some());
        assert!(store.authenticate("ada@example.com", "wrong-password").unwrap().is_none());
        assert!(store.authenticate("nobody@example.com", "password123").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected_case_insensitively() {
        let store = create_test_store();
        store
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .unwrap();

        assert!(store.email_taken("ADA@example.com", None).unwrap());
        let err = store
            .create_user("Ada 2", "ADA@example.com", "password123", UserRole::Student)
            .unwrap_err();
        assert!(crate::db::is_unique_violation(&err));
    }

    #[test]
    fn test_email_taken_ignores_own_account() {
        let store = create_test_store();
        let user = store
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .unwrap();

        assert!(!store.email_taken("ada@example.com", Some(user.id)).unwrap());
    }

    #[test]
    fn test_update_profile_changes_only_given_fields() {
        let store = create_test_store();
        let user = store
            .create_user("Ada", "ada@example.com", "password123", UserRole::Reviewer)
            .unwrap();

        let updated = store
            .update_profile(
                user.id,
                ProfileChanges {
                    name: Some("Ada Lovelace".into()),
                    password: Some("newpassword".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, "ada@example.com");
        assert_eq!(updated.role, UserRole::Reviewer);
        assert!(store.authenticate("ada@example.com", "newpassword").unwrap().is_some());
        assert!(store.update_profile(9999, ProfileChanges::default()).unwrap().is_none());
    }

    #[test]
    fn test_list_users_filters() {
        let store = create_test_store();
        store.create_user("Ada", "ada@uni.edu", "pass1234", UserRole::Student).unwrap();
        store.create_user("Grace", "grace@uni.edu", "pass1234", UserRole::Reviewer).unwrap();
        store.create_user("Linus", "linus@corp.com", "pass1234", UserRole::Student).unwrap();

        let all = store.list_users(&UserFilter::default(), PageRequest::default()).unwrap();
        assert_eq!(all.total, 3);

        let students = store
            .list_users(
                &UserFilter { role: Some(UserRole::Student), search: None },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(students.total, 2);

        let uni = store
            .list_users(
                &UserFilter { role: None, search: Some("UNI.EDU".into()) },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(uni.total, 2);
        assert_eq!(store.count_users().unwrap(), 3);
    }

    #[test]
    fn test_token_revocation() {
        let store = create_test_store();
        let exp = (Utc::now().timestamp() + 3600) as usize;

        assert!(!store.is_token_revoked("jti-1").unwrap());
        store.revoke_token("jti-1", exp).unwrap();
        store.revoke_token("jti-1", exp).unwrap();
        assert!(store.is_token_revoked("jti-1").unwrap());
    }

    #[test]
    fn test_users_persist_across_reopen() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_str().unwrap();

        UserStore::new(Database::open(path).unwrap(), 4)
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .unwrap();

        let reopened = UserStore::new(Database::open(path).unwrap(), 4);
        assert!(reopened.get_user_by_email("ada@example.com").unwrap().is_some());
    }
}
