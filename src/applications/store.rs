//! Application Storage
//!
//! State transitions are conditional UPDATEs, so a concurrent submit/review
//! can never move a row out of a state it is no longer in.

use crate::applications::models::{
    Application, ApplicationData, ApplicationStatus, ReviewDecision, ReviewStatus,
};
use crate::db::Database;
use crate::models::{now_rfc3339, Page, PageRequest};
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};
use tracing::{debug, info};

const APPLICATION_SELECT: &str = "SELECT a.id, a.scholarship_id, a.user_id, a.application_data,
        a.status, a.review_status, a.review_notes, a.reviewer_id, a.submitted_at,
        a.reviewed_at, a.created_at, a.updated_at, s.title, u.name
     FROM applications a
     JOIN scholarships s ON s.id = a.scholarship_id
     JOIN users u ON u.id = a.user_id";

/// Listing filter; every field narrows the result
#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    /// Restrict to one applicant (students listing their own)
    pub user_id: Option<i64>,
    pub scholarship_id: Option<i64>,
    pub status: Option<String>,
    pub review_status: Option<String>,
}

/// Result of a conditional state change
#[derive(Debug)]
pub enum Transition {
    Applied(Application),
    /// The row exists but was not in the required prior state
    Rejected(Application),
    NotFound,
}

/// Aggregate counts for admin stats
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationCounts {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

pub struct ApplicationStore {
    db: Database,
}

impl ApplicationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Application> {
        let data_json: String = row.get(3)?;
        let application_data: ApplicationData = serde_json::from_str(&data_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(Application {
            id: row.get(0)?,
            scholarship_id: row.get(1)?,
            user_id: row.get(2)?,
            application_data,
            status: row.get(4)?,
            review_status: row.get(5)?,
            review_notes: row.get(6)?,
            reviewer_id: row.get(7)?,
            submitted_at: row.get(8)?,
            reviewed_at: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            scholarship_title: row.get(12)?,
            applicant_name: row.get(13)?,
        })
    }

    /// Newest first
    pub fn list(&self, filter: &ApplicationFilter, page: PageRequest) -> Result<Page<Application>> {
        self.query_page(filter, page, "a.created_at DESC, a.id DESC")
    }

    /// Submitted applications awaiting an outcome, oldest submission first
    pub fn review_queue(&self, page: PageRequest) -> Result<Page<Application>> {
        let filter = ApplicationFilter {
            status: Some(ApplicationStatus::Submitted.to_string()),
            review_status: Some(ReviewStatus::Pending.to_string()),
            ..Default::default()
        };
        self.query_page(&filter, page, "a.submitted_at ASC, a.id ASC")
    }

    fn query_page(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
        order_by: &str,
    ) -> Result<Page<Application>> {
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(user_id) = filter.user_id {
            args.push(Value::Integer(user_id));
            clauses.push(format!("a.user_id = ?{}", args.len()));
        }
        if let Some(scholarship_id) = filter.scholarship_id {
            args.push(Value::Integer(scholarship_id));
            clauses.push(format!("a.scholarship_id = ?{}", args.len()));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            args.push(Value::Text(status.to_string()));
            clauses.push(format!("a.status = ?{}", args.len()));
        }
        if let Some(review) = filter.review_status.as_deref().filter(|s| !s.is_empty()) {
            args.push(Value::Text(review.to_string()));
            clauses.push(format!("a.review_status = ?{}", args.len()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let conn = self.db.conn();
        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM applications a {}", where_sql),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )
            .context("Failed to count applications")?;

        args.push(Value::Integer(page.limit()));
        args.push(Value::Integer(page.offset_i64()));
        let sql = format!(
            "{} {} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            APPLICATION_SELECT,
            where_sql,
            order_by,
            args.len() - 1,
            args.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(rows, page, total as u64))
    }

    pub fn get(&self, id: i64) -> Result<Option<Application>> {
        let conn = self.db.conn();
        let application = conn
            .query_row(
                &format!("{} WHERE a.id = ?1", APPLICATION_SELECT),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(application)
    }

    /// Create a draft. Duplicate (scholarship, user) pairs are allowed.
    pub fn create(
        &self,
        user_id: i64,
        scholarship_id: i64,
        data: &ApplicationData,
    ) -> Result<Application> {
        let now = now_rfc3339();
        let data_json = serde_json::to_string(data).context("Failed to encode application data")?;

        let id = {
            let conn = self.db.conn();
            conn.execute(
                "INSERT INTO applications (scholarship_id, user_id, application_data, status,
                     review_status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    scholarship_id,
                    user_id,
                    data_json,
                    ApplicationStatus::Draft,
                    ReviewStatus::Pending,
                    now,
                ],
            )
            .context("Failed to insert application")?;
            conn.last_insert_rowid()
        };

        info!(
            application_id = id,
            user_id, scholarship_id, "📄 Application drafted"
        );

        self.get(id)?
            .context("Application vanished right after insert")
    }

    /// Replace the answers; only drafts change.
    pub fn update_data(&self, id: i64, data: &ApplicationData) -> Result<Transition> {
        let data_json = serde_json::to_string(data).context("Failed to encode application data")?;
        let rows = self.db.conn().execute(
            "UPDATE applications SET application_data = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'draft'",
            params![data_json, now_rfc3339(), id],
        )?;
        self.finish_transition(id, rows)
    }

    /// draft -> submitted
    pub fn submit(&self, id: i64) -> Result<Transition> {
        let now = now_rfc3339();
        let rows = self.db.conn().execute(
            "UPDATE applications SET status = 'submitted', submitted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND status = 'draft'",
            params![now, id],
        )?;

        if rows > 0 {
            info!(application_id = id, "📨 Application submitted");
        }
        self.finish_transition(id, rows)
    }

    /// submitted + pending -> approved | rejected
    pub fn review(
        &self,
        id: i64,
        reviewer_id: i64,
        decision: ReviewDecision,
        notes: Option<&str>,
    ) -> Result<Transition> {
        let now = now_rfc3339();
        let outcome = ReviewStatus::from(decision);
        let rows = self.db.conn().execute(
            "UPDATE applications
             SET review_status = ?1, review_notes = ?2, reviewer_id = ?3,
                 reviewed_at = ?4, updated_at = ?4
             WHERE id = ?5 AND status = 'submitted' AND review_status = 'pending'",
            params![outcome, notes, reviewer_id, now, id],
        )?;

        if rows > 0 {
            info!(application_id = id, reviewer_id, outcome = %outcome, "⚖️ Application reviewed");
        }
        self.finish_transition(id, rows)
    }

    fn finish_transition(&self, id: i64, rows_changed: usize) -> Result<Transition> {
        Ok(match self.get(id)? {
            None => Transition::NotFound,
            Some(app) if rows_changed > 0 => Transition::Applied(app),
            Some(app) => {
                debug!(application_id = id, status = %app.status, review = %app.review_status, "Transition refused");
                Transition::Rejected(app)
            }
        })
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .db
            .conn()
            .execute("DELETE FROM applications WHERE id = ?1", params![id])
            .context("Failed to delete application")?;
        Ok(rows > 0)
    }

    pub fn counts(&self) -> Result<ApplicationCounts> {
        let conn = self.db.conn();
        let counts = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'submitted' AND review_status = 'pending'), 0),
                    COALESCE(SUM(review_status = 'approved'), 0),
                    COALESCE(SUM(review_status = 'rejected'), 0)
             FROM applications",
            [],
            |row| {
                Ok(ApplicationCounts {
                    total: row.get::<_, i64>(0)? as u64,
                    pending: row.get::<_, i64>(1)? as u64,
                    approved: row.get::<_, i64>(2)? as u64,
                    rejected: row.get::<_, i64>(3)? as u64,
                })
            },
        )?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{models::UserRole, UserStore};
    use crate::scholarships::{models::ScholarshipInput, ScholarshipStatus, ScholarshipStore};
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        store: ApplicationStore,
        student: i64,
        reviewer: i64,
        scholarship: i64,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let users = UserStore::new(db.clone(), 4);
        let student = users
            .create_user("Sam Student", "sam@example.com", "password123", UserRole::Student)
            .unwrap()
            .id;
        let reviewer = users
            .create_user("Rita Reviewer", "rita@example.com", "password123", UserRole::Reviewer)
            .unwrap()
            .id;
        let scholarship = ScholarshipStore::new(db.clone())
            .create(ScholarshipInput {
                title: "STEM Grant".into(),
                description: "Science".into(),
                provider: "Acme".into(),
                amount: 1000.0,
                deadline: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                eligibility_criteria: "Any".into(),
                application_process: "Essay".into(),
                status: ScholarshipStatus::Active,
            })
            .unwrap()
            .id;

        Fixture {
            store: ApplicationStore::new(db.clone()),
            db,
            student,
            reviewer,
            scholarship,
        }
    }

    fn data() -> ApplicationData {
        ApplicationData {
            essay: "I love science".into(),
            achievements: "Science fair winner".into(),
            extracurricular: "Robotics club".into(),
        }
    }

    #[test]
    fn test_create_draft_with_joined_names() {
        let f = fixture();
        let app = f.store.create(f.student, f.scholarship, &data()).unwrap();

        assert_eq!(app.status, ApplicationStatus::Draft);
        assert_eq!(app.review_status, ReviewStatus::Pending);
        assert_eq!(app.scholarship_title, "STEM Grant");
        assert_eq!(app.applicant_name, "Sam Student");
        assert_eq!(app.application_data, data());
        assert!(app.submitted_at.is_none());
    }

    #[test]
    fn test_duplicate_applications_are_permitted() {
        let f = fixture();
        let a = f.store.create(f.student, f.scholarship, &data()).unwrap();
        let b = f.store.create(f.student, f.scholarship, &data()).unwrap();

        assert_ne!(a.id, b.id);
        let filter = ApplicationFilter {
            user_id: Some(f.student),
            ..Default::default()
        };
        assert_eq!(f.store.list(&filter, PageRequest::default()).unwrap().total, 2);
    }

    #[test]
    fn test_submit_only_from_draft() {
        let f = fixture();
        let app = f.store.create(f.student, f.scholarship, &data()).unwrap();

        match f.store.submit(app.id).unwrap() {
            Transition::Applied(app) => {
                assert_eq!(app.status, ApplicationStatus::Submitted);
                assert!(app.submitted_at.is_some());
            }
            other => panic!("expected submit to apply, got {other:?}"),
        }

        assert!(matches!(f.store.submit(app.id).unwrap(), Transition::Rejected(_)));
        assert!(matches!(f.store.submit(9999).unwrap(), Transition::NotFound));
    }

    #[test]
    fn test_review_requires_submitted_pending() {
        let f = fixture();
        let app = f.store.create(f.student, f.scholarship, &data()).unwrap();

        // Draft cannot be reviewed
        assert!(matches!(
            f.store.review(app.id, f.reviewer, ReviewDecision::Approved, None).unwrap(),
            Transition::Rejected(_)
        ));

        f.store.submit(app.id).unwrap();
        match f
            .store
            .review(app.id, f.reviewer, ReviewDecision::Rejected, Some("Incomplete"))
            .unwrap()
        {
            Transition::Applied(app) => {
                assert_eq!(app.review_status, ReviewStatus::Rejected);
                assert_eq!(app.reviewer_id, Some(f.reviewer));
                assert_eq!(app.review_notes.as_deref(), Some("Incomplete"));
                assert!(app.reviewed_at.is_some());
            }
            other => panic!("expected review to apply, got {other:?}"),
        }

        // Outcome is final
        assert!(matches!(
            f.store.review(app.id, f.reviewer, ReviewDecision::Approved, None).unwrap(),
            Transition::Rejected(_)
        ));
    }

    #[test]
    fn test_update_data_only_for_drafts() {
        let f = fixture();
        let app = f.store.create(f.student, f.scholarship, &data()).unwrap();
        let mut changed = data();
        changed.essay = "Rewritten".into();

        assert!(matches!(
            f.store.update_data(app.id, &changed).unwrap(),
            Transition::Applied(a) if a.application_data.essay == "Rewritten"
        ));

        f.store.submit(app.id).unwrap();
        assert!(matches!(
            f.store.update_data(app.id, &data()).unwrap(),
            Transition::Rejected(_)
        ));
    }

    #[test]
    fn test_review_queue_and_counts() {
        let f = fixture();
        let first = f.store.create(f.student, f.scholarship, &data()).unwrap();
        let second = f.store.create(f.student, f.scholarship, &data()).unwrap();
        let _draft = f.store.create(f.student, f.scholarship, &data()).unwrap();

        f.store.submit(first.id).unwrap();
        f.store.submit(second.id).unwrap();

        let queue = f.store.review_queue(PageRequest::default()).unwrap();
        assert_eq!(queue.total, 2);
        assert_eq!(queue.data[0].id, first.id);

        f.store
            .review(first.id, f.reviewer, ReviewDecision::Approved, None)
            .unwrap();

        let counts = f.store.counts().unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.rejected, 0);
    }

    #[test]
    fn test_deleting_scholarship_cascades() {
        let f = fixture();
        let app = f.store.create(f.student, f.scholarship, &data()).unwrap();

        ScholarshipStore::new(f.db.clone()).delete(f.scholarship).unwrap();
        assert!(f.store.get(app.id).unwrap().is_none());
    }
}
