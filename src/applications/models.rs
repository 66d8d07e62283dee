//! Application Models
//!
//! Two independent lifecycles live on one row:
//! - submission: `draft` -> `submitted` (owner action)
//! - review: `pending` -> `approved` | `rejected` (reviewer action, submitted rows only)

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: i64,
    pub scholarship_id: i64,
    pub user_id: i64,
    pub application_data: ApplicationData,
    pub status: ApplicationStatus,
    pub review_status: ReviewStatus,
    pub review_notes: Option<String>,
    pub reviewer_id: Option<i64>,
    pub submitted_at: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Joined from `scholarships`
    pub scholarship_title: String,
    /// Joined from `users`
    pub applicant_name: String,
}

/// Free-form answers captured by the application form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct ApplicationData {
    #[serde(default, deserialize_with = "crate::models::trimmed_text")]
    #[validate(length(min = 1, message = "The essay field is required."))]
    pub essay: String,
    #[serde(default, deserialize_with = "crate::models::trimmed_text")]
    #[validate(length(min = 1, message = "The achievements field is required."))]
    pub achievements: String,
    #[serde(default, deserialize_with = "crate::models::trimmed_text")]
    pub extracurricular: String,
}

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
}

text_enum!(ApplicationStatus {
    Draft => "draft",
    Submitted => "submitted",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(ReviewStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Outcome a reviewer may set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ReviewStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected => ReviewStatus::Rejected,
        }
    }
}

/// POST /applications
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewApplication {
    #[validate(required(message = "The scholarship id field is required."))]
    pub scholarship_id: Option<i64>,
    #[validate(required(message = "The application data field is required."), nested)]
    pub application_data: Option<ApplicationData>,
}

/// PUT /applications/:id, replaces the answers of a draft
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateApplication {
    #[validate(required(message = "The application data field is required."), nested)]
    pub application_data: Option<ApplicationData>,
}

/// POST /applications/:id/review
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(required(message = "The decision field is required."))]
    pub decision: Option<ReviewDecision>,
    #[validate(length(max = 5000, message = "The notes may not be greater than 5000 characters."))]
    pub notes: Option<String>,
}

/// Listing query string
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ApplicationQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
