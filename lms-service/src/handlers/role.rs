//! Role lookup endpoint.

use axum::{extract::State, Json};

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::{Capability, CrudAction, RoleWithPermissions};
use crate::services::authorizer;
use crate::AppState;
use service_core::error::AppError;

/// GET /api/roles
///
/// Returns every role with its effective permissions flattened to
/// `module:action` strings.
pub async fn get_roles(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ApiResponse<Vec<RoleWithPermissions>>>, AppError> {
    authorizer::authorize(
        &current.capabilities,
        &[Capability::new("roles", CrudAction::Read)],
    )?;

    let roles = state.db.list_roles_with_permissions().await?;

    Ok(Json(ApiResponse::new("Roles fetched successfully.", roles)))
}
