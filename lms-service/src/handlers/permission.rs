//! Permission CRUD endpoints.
//!
//! These maintain the `(module, action, role_id)` uniqueness invariant and
//! keep the role-permission mapping consistent: a supplied `roleIds` list
//! REPLACES the full link set for the permission inside one transaction,
//! and deletion cascades the links before the row.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::permission::{
    CreatePermissionRequest, PermissionResponse, UpdatePermissionRequest,
};
use crate::models::{Capability, CrudAction};
use crate::services::authorizer;
use crate::AppState;
use service_core::error::AppError;

fn require(action: CrudAction) -> [Capability; 1] {
    [Capability::new("permissions", action)]
}

/// POST /api/permissions
pub async fn create_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(req): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionResponse>>), AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Create))?;

    let module = req.module.trim().to_lowercase();
    if module.is_empty() {
        return Err(AppError::Validation(
            "Permission module is required.".to_string(),
        ));
    }
    let action: CrudAction = req.action.parse().map_err(AppError::Validation)?;

    // No explicit link list defaults to linking the owner role.
    let links = req
        .role_ids
        .or_else(|| req.role_id.map(|role_id| vec![role_id]));

    let permission = state
        .db
        .create_permission(&module, action, req.role_id, links.as_deref())
        .await?;

    let roles = state.db.roles_with_access(permission.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Permission created successfully.",
            PermissionResponse::new(permission, roles),
        )),
    ))
}

/// GET /api/permissions
pub async fn get_permissions(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ApiResponse<Vec<PermissionResponse>>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let data = state
        .db
        .list_permissions_with_roles()
        .await?
        .into_iter()
        .map(|(permission, roles)| PermissionResponse::new(permission, roles))
        .collect();

    Ok(Json(ApiResponse::new(
        "Permissions fetched successfully.",
        data,
    )))
}

/// PUT /api/permissions/:id
pub async fn update_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePermissionRequest>,
) -> Result<Json<ApiResponse<PermissionResponse>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Update))?;

    let mut permission = state
        .db
        .find_permission_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Permission not found.".to_string()))?;

    if let Some(module) = req.module {
        let module = module.trim().to_lowercase();
        if module.is_empty() {
            return Err(AppError::Validation(
                "Permission module cannot be empty.".to_string(),
            ));
        }
        permission.module = module;
    }

    if let Some(action) = req.action {
        let action: CrudAction = action.parse().map_err(AppError::Validation)?;
        permission.action = action.as_str().to_string();
    }

    if let Some(role_id) = req.role_id {
        permission.role_id = role_id;
    }

    let updated = state
        .db
        .update_permission(&permission, req.role_ids.as_deref())
        .await?;

    let roles = state.db.roles_with_access(updated.id).await?;

    Ok(Json(ApiResponse::new(
        "Permission updated successfully.",
        PermissionResponse::new(updated, roles),
    )))
}

/// DELETE /api/permissions/:id
pub async fn delete_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Delete))?;

    if !state.db.delete_permission(id).await? {
        return Err(AppError::NotFound("Permission not found.".to_string()));
    }

    Ok(Json(ApiResponse::message_only(
        "Permission deleted successfully.",
    )))
}
