//! Authentication API Endpoints
//! Mission: Register, login, logout and profile management

use crate::api::{extract::ValidatedJson, AppState};
use crate::auth::{
    middleware::AuthUser,
    models::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse},
    user_store::ProfileChanges,
};
use crate::db::is_unique_violation;
use crate::error::{ApiError, ApiResult};
use crate::models::MessageResponse;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

fn email_taken() -> ApiError {
    ApiError::invalid_field("email", "The email has already been taken.")
}

/// Store failure on a user write; the UNIQUE email index maps to the 422.
fn email_conflict(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        email_taken()
    } else {
        ApiError::Internal(err)
    }
}

/// Register endpoint - POST /register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    // Presence is guaranteed by validation
    let (Some(name), Some(email), Some(password), Some(role)) =
        (payload.name, payload.email, payload.password, payload.role)
    else {
        return Err(ApiError::invalid_field("name", "The given data was invalid."));
    };

    if state.users.email_taken(&email, None)? {
        return Err(email_taken());
    }

    // A concurrent registration can still reach the UNIQUE index first
    let user = state
        .users
        .create_user(&name, &email, &password, role)
        .map_err(email_conflict)?;

    info!("📝 Registered user: {} ({})", user.email, user.role);

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Login endpoint - POST /login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    info!("🔐 Login attempt: {}", email);

    let Some(user) = state.users.authenticate(&email, &password)? else {
        warn!("❌ Failed login attempt: {}", email);
        return Err(ApiError::InvalidCredentials);
    };

    let (token, expires_in) = state.jwt.generate_token(&user)?;

    info!("✅ Login successful: {} ({})", user.email, user.role);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in,
        user: UserResponse::from_user(&user),
    }))
}

/// Logout endpoint - POST /logout
/// Revokes the token used for this request; other sessions stay valid.
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    state
        .users
        .revoke_token(&caller.claims.jti, caller.claims.exp)?;

    info!("👋 Logged out: {}", caller.user.email);

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Current user - GET /user/profile
pub async fn profile(caller: AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from_user(&caller.user))
}

/// Update current user - PUT /user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if let Some(email) = payload.email.as_deref() {
        if state.users.email_taken(email, Some(caller.id()))? {
            return Err(email_taken());
        }
    }

    let changes = ProfileChanges {
        name: payload.name,
        email: payload.email,
        password: payload.password,
    };

    let user = state
        .users
        .update_profile(caller.id(), changes)
        .map_err(email_conflict)?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse::from_user(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{user_store::UserStore, UserRole};
    use crate::db::Database;

    #[test]
    fn test_email_index_conflict_is_taken_email() {
        let users = UserStore::new(Database::open_in_memory().unwrap(), 4);
        users
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .unwrap();

        // Second insert skips the pre-check, as a racing request would
        let err = users
            .create_user("Ada", "ada@example.com", "password123", UserRole::Student)
            .map_err(email_conflict)
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        match err {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors["email"], vec!["The email has already been taken.".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let other = email_conflict(anyhow::anyhow!("disk full"));
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
