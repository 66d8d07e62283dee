//! API Errors
//! Mission: One taxonomy, one JSON shape, for every failing request

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Field name -> human readable messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated.")]
    Unauthorized,

    #[error("This action is unauthorized.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        ApiError::Validation { message, errors }
    }

    pub fn not_found(resource: &str, id: i64) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errs: ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        collect_field_errors("", &errs, &mut errors);

        let message = errors
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());

        ApiError::Validation { message, errors }
    }
}

/// Flatten nested validation errors into dotted keys (`application_data.essay`).
fn collect_field_errors(prefix: &str, errs: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errs.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errs) => {
                let messages = field_errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => format!("The {} field is invalid.", key),
                    })
                    .collect();
                out.insert(key, messages);
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&key, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{}.{}", key, index), nested, out);
                }
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                json!({ "message": "Internal server error" })
            }
            ApiError::Validation { message, errors } => json!({
                "message": message,
                "errors": errors,
            }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "The name must be at least 3 characters."))]
        name: String,
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::invalid_field("x", "bad").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("Scholarship", 3).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidState("nope".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_errors_keep_field_messages() {
        let errs = Signup { name: "ab".into() }.validate().unwrap_err();
        match ApiError::from(errs) {
            ApiError::Validation { message, errors } => {
                assert_eq!(message, "The name must be at least 3 characters.");
                assert_eq!(errors["name"].len(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::from(anyhow::anyhow!("disk on fire")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Internal server error");
    }
}
