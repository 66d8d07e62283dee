//! Scholarship API Endpoints
//! Mission: CRUD over scholarship listings

use crate::api::{
    extract::{Path, Query, ValidatedJson},
    AppState,
};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{MessageResponse, Page, PageRequest};
use crate::scholarships::{
    models::{NewScholarship, Scholarship, ScholarshipPatch, ScholarshipQuery},
    store::ScholarshipFilter,
};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

/// GET /scholarships?status=&search=&page=
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ScholarshipQuery>,
) -> ApiResult<Json<Page<Scholarship>>> {
    let filter = ScholarshipFilter {
        status: query.status,
        search: query.search,
    };
    let page = state
        .scholarships
        .list(&filter, PageRequest::new(query.page))?;
    Ok(Json(page))
}

/// GET /scholarships/:id
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Scholarship>> {
    state
        .scholarships
        .get(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Scholarship", id))
}

/// POST /scholarships
pub async fn store(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewScholarship>,
) -> ApiResult<(StatusCode, Json<Scholarship>)> {
    let input = payload
        .into_input()
        .ok_or_else(|| ApiError::invalid_field("title", "The given data was invalid."))?;

    let scholarship = state.scholarships.create(input)?;

    info!(
        user_id = caller.id(),
        scholarship_id = scholarship.id,
        "Scholarship published"
    );

    Ok((StatusCode::CREATED, Json(scholarship)))
}

/// PUT /scholarships/:id
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(patch): ValidatedJson<ScholarshipPatch>,
) -> ApiResult<Json<Scholarship>> {
    let scholarship = state
        .scholarships
        .update(id, patch)?
        .ok_or_else(|| ApiError::not_found("Scholarship", id))?;

    info!(user_id = caller.id(), scholarship_id = id, "Scholarship updated");

    Ok(Json(scholarship))
}

/// DELETE /scholarships/:id
pub async fn destroy(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.scholarships.delete(id)? {
        return Err(ApiError::not_found("Scholarship", id));
    }

    info!(user_id = caller.id(), scholarship_id = id, "Scholarship deleted");

    Ok(Json(MessageResponse::new("Scholarship deleted successfully")))
}
