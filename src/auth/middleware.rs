//! Authentication Middleware
//! Mission: Resolve the bearer token before dispatch, then gate route groups by permission
//!
//! Per request: unauthenticated -> authenticated(role) once the token checks out.
//! Missing or bad tokens end the request with 401; a role lacking the route's
//! permission ends it with 403.

use crate::api::AppState;
use crate::auth::{
    models::{Claims, User},
    permissions::Permission,
};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::{debug, warn};

/// The authenticated caller, attached to request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.user.role.can(permission)
    }

    /// `Forbidden` unless the caller holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Validate `Authorization: Bearer <token>` and attach the caller.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;

    let user = authenticate_token(&state, bearer.token())?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Token -> caller. Checks signature, expiry, revocation and that the user still exists.
pub fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = state.jwt.validate_token(token).map_err(|e| {
        debug!("Rejected bearer token: {:#}", e);
        ApiError::Unauthorized
    })?;

    if state.users.is_token_revoked(&claims.jti)? {
        debug!("Rejected revoked token {}", claims.jti);
        return Err(ApiError::Unauthorized);
    }

    let user_id = claims.user_id().ok_or(ApiError::Unauthorized)?;
    let user = state.users.get_user_by_id(user_id)?.ok_or_else(|| {
        warn!("Token for unknown user {}", user_id);
        ApiError::Unauthorized
    })?;

    Ok(AuthUser { user, claims })
}

/// Route-group gate. Must run inside [`auth_middleware`].
pub async fn require_permission(
    State(permission): State<Permission>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(ApiError::Unauthorized)?;

    if !caller.can(permission) {
        warn!(
            user_id = caller.id(),
            role = %caller.user.role,
            ?permission,
            "Permission denied"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}
