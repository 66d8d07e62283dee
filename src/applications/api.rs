//! Application API Endpoints
//! Mission: Drafting, submission and review of scholarship applications

use crate::api::{
    extract::{Path, Query, ValidatedJson},
    AppState,
};
use crate::applications::{
    models::{Application, ApplicationQuery, NewApplication, ReviewRequest, UpdateApplication},
    store::{ApplicationFilter, Transition},
};
use crate::auth::{AuthUser, Permission, UserRole};
use crate::error::{ApiError, ApiResult};
use crate::models::{MessageResponse, Page, PageRequest};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

fn load(state: &AppState, id: i64) -> ApiResult<Application> {
    state
        .applications
        .get(id)?
        .ok_or_else(|| ApiError::not_found("Application", id))
}

/// Owners always see their own rows; reviewers and admins see everything.
fn ensure_visible(caller: &AuthUser, app: &Application) -> ApiResult<()> {
    if app.user_id == caller.id() || caller.user.role.sees_all_applications() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn ensure_owner(caller: &AuthUser, app: &Application) -> ApiResult<()> {
    if app.user_id == caller.id() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// GET /applications?status=&review_status=&scholarship_id=&page=
pub async fn index(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Json<Page<Application>>> {
    let filter = ApplicationFilter {
        user_id: (!caller.user.role.sees_all_applications()).then(|| caller.id()),
        scholarship_id: query.scholarship_id,
        status: query.status,
        review_status: query.review_status,
    };

    let page = state
        .applications
        .list(&filter, PageRequest::new(query.page))?;
    Ok(Json(page))
}

/// POST /applications
pub async fn store(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<NewApplication>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let (Some(scholarship_id), Some(data)) = (payload.scholarship_id, payload.application_data)
    else {
        return Err(ApiError::invalid_field(
            "scholarship_id",
            "The scholarship id field is required.",
        ));
    };

    if !state.scholarships.exists(scholarship_id)? {
        return Err(ApiError::invalid_field(
            "scholarship_id",
            "The selected scholarship id is invalid.",
        ));
    }

    let application = state
        .applications
        .create(caller.id(), scholarship_id, &data)?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /applications/:id
pub async fn show(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Application>> {
    let app = load(&state, id)?;
    ensure_visible(&caller, &app)?;
    Ok(Json(app))
}

/// PUT /applications/:id
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateApplication>,
) -> ApiResult<Json<Application>> {
    let app = load(&state, id)?;
    ensure_owner(&caller, &app)?;

    let data = payload.application_data.ok_or_else(|| {
        ApiError::invalid_field("application_data", "The application data field is required.")
    })?;

    match state.applications.update_data(id, &data)? {
        Transition::Applied(app) => Ok(Json(app)),
        Transition::Rejected(_) => Err(ApiError::InvalidState(
            "Only draft applications can be edited.".to_string(),
        )),
        Transition::NotFound => Err(ApiError::not_found("Application", id)),
    }
}

/// DELETE /applications/:id
pub async fn destroy(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let app = load(&state, id)?;
    if app.user_id != caller.id() && caller.user.role != UserRole::Admin {
        return Err(ApiError::Forbidden);
    }

    if !state.applications.delete(id)? {
        return Err(ApiError::not_found("Application", id));
    }

    info!(user_id = caller.id(), application_id = id, "Application deleted");
    Ok(Json(MessageResponse::new("Application deleted successfully")))
}

/// POST /applications/:id/submit
pub async fn submit(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Application>> {
    let app = load(&state, id)?;
    ensure_owner(&caller, &app)?;

    match state.applications.submit(id)? {
        Transition::Applied(app) => Ok(Json(app)),
        Transition::Rejected(_) => Err(ApiError::InvalidState(
            "Application has already been submitted.".to_string(),
        )),
        Transition::NotFound => Err(ApiError::not_found("Application", id)),
    }
}

/// POST /applications/:id/review
pub async fn review(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> ApiResult<Json<Application>> {
    caller.require(Permission::ReviewApplications)?;

    let decision = payload
        .decision
        .ok_or_else(|| ApiError::invalid_field("decision", "The decision field is required."))?;
    let notes = payload.notes.as_deref().filter(|n| !n.trim().is_empty());

    match state.applications.review(id, caller.id(), decision, notes)? {
        Transition::Applied(app) => Ok(Json(app)),
        Transition::Rejected(_) => Err(ApiError::InvalidState(
            "Only submitted applications pending review can be reviewed.".to_string(),
        )),
        Transition::NotFound => Err(ApiError::not_found("Application", id)),
    }
}

/// GET /reviewer/applications
pub async fn reviewer_queue(
    State(state): State<AppState>,
    Query(query): Query<ApplicationQuery>,
) -> ApiResult<Json<Page<Application>>> {
    let page = state
        .applications
        .review_queue(PageRequest::new(query.page))?;
    Ok(Json(page))
}
