//! Scholarship Models

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scholarship {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub provider: String,
    pub amount: f64,
    /// Advisory only; the server never rejects anything because of it.
    pub deadline: NaiveDate,
    pub eligibility_criteria: String,
    pub application_process: String,
    pub status: ScholarshipStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Scholarship {
    pub fn is_past_deadline(&self, today: NaiveDate) -> bool {
        self.deadline < today
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScholarshipStatus {
    Active,
    Inactive,
}

impl ScholarshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScholarshipStatus::Active => "active",
            ScholarshipStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ScholarshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScholarshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ScholarshipStatus::Active),
            "inactive" => Ok(ScholarshipStatus::Inactive),
            other => Err(format!("unknown scholarship status '{}'", other)),
        }
    }
}

impl ToSql for ScholarshipStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ScholarshipStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Amount as a JSON number or a numeric string (`5000` or `"5000"`).
fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Numeric {
        Number(f64),
        Text(String),
    }

    let value = match Option::<Numeric>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Numeric::Number(n)) => n,
        Some(Numeric::Text(raw)) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom("The amount must be a number."))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom("The amount must be a number."));
    }
    Ok(Some(value))
}

/// Create body. Fields are optional at the serde level so a missing field
/// surfaces as a per-field validation message rather than a parse failure.
#[derive(Debug, Deserialize, Validate)]
pub struct NewScholarship {
    #[serde(default, deserialize_with = "crate::models::trimmed")]
    #[validate(
        required(message = "The title field is required."),
        length(min = 1, max = 200, message = "The title must be between 1 and 200 characters.")
    )]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::models::trimmed")]
    #[validate(
        required(message = "The description field is required."),
        length(min = 1, message = "The description field is required.")
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::models::trimmed")]
    #[validate(
        required(message = "The provider field is required."),
        length(min = 1, max = 200, message = "The provider must be between 1 and 200 characters.")
    )]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    #[validate(
        required(message = "The amount field is required."),
        range(min = 0.0, message = "The amount must be a non-negative number.")
    )]
    pub amount: Option<f64>,
    #[validate(required(message = "The deadline field is required."))]
    pub deadline: Option<NaiveDate>,
    #[serde(default, deserialize_with = "crate::models::trimmed")]
    #[validate(
        required(message = "The eligibility criteria field is required."),
        length(min = 1, message = "The eligibility criteria field is required.")
    )]
    pub eligibility_criteria: Option<String>,
    #[serde(default, deserialize_with = "crate::models::trimmed")]
    #[validate(
        required(message = "The application process field is required."),
        length(min = 1, message = "The application process field is required.")
    )]
    pub application_process: Option<String>,
    #[validate(required(message = "The status field is required."))]
    pub status: Option<ScholarshipStatus>,
}

/// Fully-specified scholarship fields, ready to persist.
#[derive(Debug, Clone)]
pub struct ScholarshipInput {
    pub title: String,
    pub description: String,
    pub provider: String,
    pub amount: f64,
    pub deadline: NaiveDate,
    pub eligibility_criteria: String,
    pub application_process: String,
    pub status: ScholarshipStatus,
}

impl NewScholarship {
    /// `None` if any required field is absent; call after `validate()`.
    pub fn into_input(self) -> Option<ScholarshipInput> {
        Some(ScholarshipInput {
            title: self.title?,
            description: self.description?,
            provider: self.provider?,
            amount: self.amount?,
            deadline: self.deadline?,
            eligibility_criteria: self.eligibility_criteria?,
            application_process: self.application_process?,
            status: self.status?,
        })
    }
}

/// Update body; only provided fields change
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ScholarshipPatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::trimmed_or_blank"
    )]
    #[validate(length(min = 1, max = 200, message = "The title must be between 1 and 200 characters."))]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::trimmed_or_blank"
    )]
    #[validate(length(min = 1, message = "The description must not be empty."))]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::trimmed_or_blank"
    )]
    #[validate(length(min = 1, max = 200, message = "The provider must be between 1 and 200 characters."))]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "amount")]
    #[validate(range(min = 0.0, message = "The amount must be a non-negative number."))]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::trimmed_or_blank"
    )]
    #[validate(length(min = 1, message = "The eligibility criteria must not be empty."))]
    pub eligibility_criteria: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::models::trimmed_or_blank"
    )]
    #[validate(length(min = 1, message = "The application process must not be empty."))]
    pub application_process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ScholarshipStatus>,
}

impl ScholarshipPatch {
    pub fn apply(self, s: &mut Scholarship) {
        if let Some(v) = self.title {
            s.title = v;
        }
        if let Some(v) = self.description {
            s.description = v;
        }
        if let Some(v) = self.provider {
            s.provider = v;
        }
        if let Some(v) = self.amount {
            s.amount = v;
        }
        if let Some(v) = self.deadline {
            s.deadline = v;
        }
        if let Some(v) = self.eligibility_criteria {
            s.eligibility_criteria = v;
        }
        if let Some(v) = self.application_process {
            s.application_process = v;
        }
        if let Some(v) = self.status {
            s.status = v;
        }
    }
}

/// Listing query string: `?status=active&search=stem&page=2`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ScholarshipQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}
