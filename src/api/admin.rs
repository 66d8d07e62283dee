//! Admin API Endpoints
//! Mission: User directory and platform-wide counts

use crate::api::{extract::Query, AppState};
use crate::auth::{models::UserResponse, user_store::UserFilter, UserRole};
use crate::error::{ApiError, ApiResult};
use crate::models::{AdminStats, Page, PageRequest};
use crate::scholarships::ScholarshipStatus;
use axum::{extract::State, Json};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

/// GET /admin/users?role=&search=&page=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Page<UserResponse>>> {
    let role = match query.role.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => Some(
            raw.parse::<UserRole>()
                .map_err(|_| ApiError::invalid_field("role", "The selected role is invalid."))?,
        ),
        None => None,
    };

    let filter = UserFilter {
        role,
        search: query.search,
    };
    let page = state
        .users
        .list_users(&filter, PageRequest::new(query.page))?;

    Ok(Json(page.map(|user| UserResponse::from_user(&user))))
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let applications = state.applications.counts()?;

    Ok(Json(AdminStats {
        total_scholarships: state.scholarships.count(None)?,
        active_scholarships: state.scholarships.count(Some(ScholarshipStatus::Active))?,
        total_applications: applications.total,
        pending_applications: applications.pending,
        approved_applications: applications.approved,
        rejected_applications: applications.rejected,
        total_users: state.users.count_users()?,
    }))
}
