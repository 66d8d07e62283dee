//! HTTP Router
//! Mission: Wire every endpoint to its handler and the right access gate
//!
//! Layout:
//! - public: health, register, login
//! - authenticated: logout, profile, scholarships, applications
//! - permission-gated: admin users/stats, reviewer queue

use crate::api::{admin, AppState};
use crate::applications::api as applications_api;
use crate::auth::{api as auth_api, auth_middleware, require_permission, Permission};
use crate::middleware::request_logging_simple;
use crate::scholarships::api as scholarships_api;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Wrap a router so every route requires `permission` (auth runs first).
fn gated(router: Router<AppState>, state: &AppState, permission: Permission) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(permission, require_permission))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn scholarship_routes(state: &AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/scholarships", get(scholarships_api::index))
        .route("/scholarships/:id", get(scholarships_api::show))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let writes = Router::new()
        .route("/scholarships", post(scholarships_api::store))
        .route(
            "/scholarships/:id",
            axum::routing::put(scholarships_api::update).delete(scholarships_api::destroy),
        );

    let writes = if state.config.scholarship_writes_require_admin {
        info!("🔒 Scholarship writes restricted to admins");
        gated(writes, state, Permission::ManageScholarships)
    } else {
        writes.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
    };

    reads.merge(writes)
}

/// Build the full API router.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(auth_api::register))
        .route("/login", post(auth_api::login));

    let protected_routes = Router::new()
        .route("/logout", post(auth_api::logout))
        .route(
            "/user/profile",
            get(auth_api::profile).put(auth_api::update_profile),
        )
        .route(
            "/applications",
            get(applications_api::index).post(applications_api::store),
        )
        .route(
            "/applications/:id",
            get(applications_api::show)
                .put(applications_api::update)
                .delete(applications_api::destroy),
        )
        .route("/applications/:id/submit", post(applications_api::submit))
        .route("/applications/:id/review", post(applications_api::review))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let user_admin = gated(
        Router::new().route("/admin/users", get(admin::list_users)),
        &state,
        Permission::ManageUsers,
    );
    let stats_admin = gated(
        Router::new().route("/admin/stats", get(admin::stats)),
        &state,
        Permission::ViewStats,
    );
    let reviewer_routes = gated(
        Router::new().route("/reviewer/applications", get(applications_api::reviewer_queue)),
        &state,
        Permission::ReviewApplications,
    );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(scholarship_routes(&state))
        .merge(user_admin)
        .merge(stats_admin)
        .merge(reviewer_routes)
        .layer(middleware::from_fn(request_logging_simple))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
