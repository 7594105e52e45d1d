use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;

use crate::{
    models::{Capability, User},
    AppState,
};
use service_core::error::AppError;

/// The authenticated principal plus their capability set, resolved fresh
/// for this request. Role or mapping changes therefore apply on the very
/// next request without re-login.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub capabilities: HashSet<Capability>,
}

/// Middleware requiring a valid bearer token.
///
/// Verifies the signature and expiry, then re-fetches the user and their
/// current role's capabilities - the token itself carries no capability
/// claims to go stale.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Authorization token missing.".to_string()))?;

    let claims = state.jwt.validate_token(token.trim())?;

    let user = state
        .db
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("User referenced by token no longer exists.".to_string())
        })?;

    let capabilities = state.db.resolve_capabilities(user.id).await?;

    req.extensions_mut().insert(CurrentUser { user, capabilities });

    Ok(next.run(req).await)
}

/// Extractor handing handlers the authenticated principal.
pub struct AuthUser(pub CurrentUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = parts.extensions.get::<CurrentUser>().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Auth principal missing from request extensions"
            ))
        })?;

        Ok(AuthUser(current.clone()))
    }
}
