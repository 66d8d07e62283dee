//! Scholarship Storage

use crate::db::{like_pattern, Database};
use crate::models::{now_rfc3339, Page, PageRequest};
use crate::scholarships::models::{
    Scholarship, ScholarshipInput, ScholarshipPatch, ScholarshipStatus,
};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use tracing::{debug, info};

const SCHOLARSHIP_COLUMNS: &str = "id, title, description, provider, amount, deadline, \
     eligibility_criteria, application_process, status, created_at, updated_at";

/// Listing filter
#[derive(Debug, Default, Clone)]
pub struct ScholarshipFilter {
    /// Exact match on the status column; unknown values simply match nothing
    pub status: Option<String>,
    /// Case-insensitive substring over title OR description
    pub search: Option<String>,
}

pub struct ScholarshipStore {
    db: Database,
}

impl ScholarshipStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Scholarship> {
        Ok(Scholarship {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            provider: row.get(3)?,
            amount: row.get(4)?,
            deadline: row.get(5)?,
            eligibility_criteria: row.get(6)?,
            application_process: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// Newest first, one page at a time
    pub fn list(&self, filter: &ScholarshipFilter, page: PageRequest) -> Result<Page<Scholarship>> {
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            args.push(Value::Text(status.to_string()));
            clauses.push(format!("status = ?{}", args.len()));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            args.push(Value::Text(like_pattern(term)));
            let n = args.len();
            clauses.push(format!(
                "(title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"
            ));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.db.conn();
        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM scholarships {}", where_sql),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )
            .context("Failed to count scholarships")?;

        args.push(Value::Integer(page.limit()));
        args.push(Value::Integer(page.offset_i64()));
        let sql = format!(
            "SELECT {} FROM scholarships {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            SCHOLARSHIP_COLUMNS,
            where_sql,
            args.len() - 1,
            args.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            total,
            page = page.page,
            returned = rows.len(),
            "Listed scholarships"
        );

        Ok(Page::new(rows, page, total as u64))
    }

    pub fn get(&self, id: i64) -> Result<Option<Scholarship>> {
        let conn = self.db.conn();
        let scholarship = conn
            .query_row(
                &format!("SELECT {} FROM scholarships WHERE id = ?1", SCHOLARSHIP_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(scholarship)
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM scholarships WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create(&self, input: ScholarshipInput) -> Result<Scholarship> {
        let now = now_rfc3339();
        let conn = self.db.conn();

        conn.execute(
            "INSERT INTO scholarships (title, description, provider, amount, deadline,
                 eligibility_criteria, application_process, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                input.title,
                input.description,
                input.provider,
                input.amount,
                input.deadline,
                input.eligibility_criteria,
                input.application_process,
                input.status,
                now,
            ],
        )
        .context("Failed to insert scholarship")?;

        let scholarship = Scholarship {
            id: conn.last_insert_rowid(),
            title: input.title,
            description: input.description,
            provider: input.provider,
            amount: input.amount,
            deadline: input.deadline,
            eligibility_criteria: input.eligibility_criteria,
            application_process: input.application_process,
            status: input.status,
            created_at: now.clone(),
            updated_at: now,
        };

        info!("🎓 Created scholarship {}: {}", scholarship.id, scholarship.title);
        Ok(scholarship)
    }

    /// Apply the patch. `None` if the scholarship does not exist.
    pub fn update(&self, id: i64, patch: ScholarshipPatch) -> Result<Option<Scholarship>> {
        let Some(mut scholarship) = self.get(id)? else {
            return Ok(None);
        };

        patch.apply(&mut scholarship);
        scholarship.updated_at = now_rfc3339();

        self.db
            .conn()
            .execute(
                "UPDATE scholarships SET title = ?1, description = ?2, provider = ?3,
                     amount = ?4, deadline = ?5, eligibility_criteria = ?6,
                     application_process = ?7, status = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    scholarship.title,
                    scholarship.description,
                    scholarship.provider,
                    scholarship.amount,
                    scholarship.deadline,
                    scholarship.eligibility_criteria,
                    scholarship.application_process,
                    scholarship.status,
                    scholarship.updated_at,
                    id,
                ],
            )
            .context("Failed to update scholarship")?;

        debug!("Updated scholarship {}", id);
        Ok(Some(scholarship))
    }

    /// Delete; false if it was already gone. Applications cascade.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .db
            .conn()
            .execute("DELETE FROM scholarships WHERE id = ?1", params![id])
            .context("Failed to delete scholarship")?;

        if rows > 0 {
            info!("🗑️  Deleted scholarship {}", id);
        }
        Ok(rows > 0)
    }

    pub fn count(&self, status: Option<ScholarshipStatus>) -> Result<u64> {
        let conn = self.db.conn();
        let count: i64 = match status {
            Some(status) => conn.query_row(
                "SELECT COUNT(*) FROM scholarships WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM scholarships", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input(title: &str, description: &str, status: ScholarshipStatus) -> ScholarshipInput {
        ScholarshipInput {
            title: title.to_string(),
            description: description.to_string(),
            provider: "Acme Foundation".to_string(),
            amount: 2500.0,
            deadline: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            eligibility_criteria: "Enrolled full time".to_string(),
            application_process: "Submit an essay".to_string(),
            status,
        }
    }

    fn store() -> ScholarshipStore {
        ScholarshipStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_create_and_get_round_trip() {
        let store = store();
        let created = store
            .create(input("STEM Grant", "Science funding", ScholarshipStatus::Active))
            .unwrap();

        let fetched = store.get(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get(created.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_status_filter() {
        let store = store();
        store.create(input("A", "a", ScholarshipStatus::Active)).unwrap();
        store.create(input("B", "b", ScholarshipStatus::Inactive)).unwrap();
        store.create(input("C", "c", ScholarshipStatus::Active)).unwrap();

        let filter = ScholarshipFilter {
            status: Some("active".into()),
            search: None,
        };
        let page = store.list(&filter, PageRequest::default()).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.data.iter().all(|s| s.status == ScholarshipStatus::Active));

        let unknown = ScholarshipFilter {
            status: Some("archived".into()),
            search: None,
        };
        assert_eq!(store.list(&unknown, PageRequest::default()).unwrap().total, 0);
    }

    #[test]
    fn test_search_matches_title_or_description_case_insensitively() {
        let store = store();
        store.create(input("Arts Award", "For painters", ScholarshipStatus::Active)).unwrap();
        store.create(input("Music Prize", "Open to ROBOTICS clubs", ScholarshipStatus::Active)).unwrap();
        store.create(input("Robotics Fund", "Hardware", ScholarshipStatus::Inactive)).unwrap();

        let filter = ScholarshipFilter {
            status: None,
            search: Some("robotics".into()),
        };
        let page = store.list(&filter, PageRequest::default()).unwrap();
        assert_eq!(page.total, 2);

        // Search groups as (title OR description) AND status
        let active_only = ScholarshipFilter {
            status: Some("active".into()),
            search: Some("robotics".into()),
        };
        let page = store.list(&active_only, PageRequest::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].title, "Music Prize");
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let store = store();
        store.create(input("100% tuition", "full ride", ScholarshipStatus::Active)).unwrap();
        store.create(input("Partial", "half", ScholarshipStatus::Active)).unwrap();

        let filter = ScholarshipFilter {
            status: None,
            search: Some("%".into()),
        };
        assert_eq!(store.list(&filter, PageRequest::default()).unwrap().total, 1);
    }

    #[test]
    fn test_pagination_is_fixed_size_newest_first() {
        let store = store();
        for i in 0..12 {
            store
                .create(input(&format!("S{i}"), "d", ScholarshipStatus::Active))
                .unwrap();
        }

        let first = store.list(&ScholarshipFilter::default(), PageRequest::new(Some(1))).unwrap();
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.last_page, 2);
        assert_eq!(first.data[0].title, "S11");

        let second = store.list(&ScholarshipFilter::default(), PageRequest::new(Some(2))).unwrap();
        assert_eq!(second.data.len(), 2);
        assert_eq!(second.from, Some(11));
    }

    #[test]
    fn test_update_changes_only_patched_fields() {
        let store = store();
        let created = store.create(input("Old", "desc", ScholarshipStatus::Active)).unwrap();

        let updated = store
            .update(
                created.id,
                ScholarshipPatch {
                    title: Some("New".into()),
                    status: Some(ScholarshipStatus::Inactive),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.status, ScholarshipStatus::Inactive);
        assert_eq!(updated.description, "desc");
        assert!(store.update(9999, ScholarshipPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_delete_twice() {
        let store = store();
        let created = store.create(input("Gone", "soon", ScholarshipStatus::Active)).unwrap();

        assert!(store.delete(created.id).unwrap());
        assert!(!store.delete(created.id).unwrap());
        assert!(store.get(created.id).unwrap().is_none());
        assert_eq!(store.count(None).unwrap(), 0);
    }
}
