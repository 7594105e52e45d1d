//! User management endpoints.
//!
//! Updates follow the self-or-capability rule: a principal may edit their
//! own profile freely, except that changing their own role still requires
//! `users:update` (escalation guard).

use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::HashMap;

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::user::{UpdateUserRequest, UserResponse};
use crate::models::{Capability, CrudAction};
use crate::services::authorizer;
use crate::utils::password::{hash_password, verify_password, Password};
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// GET /api/users
pub async fn get_users(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let users = state.db.list_users().await?;
    let roles: HashMap<i64, _> = state
        .db
        .list_roles_with_permissions()
        .await?
        .into_iter()
        .map(|r| (r.role.id, r))
        .collect();

    let data = users
        .into_iter()
        .map(|u| {
            let role = roles.get(&u.role_id).cloned();
            u.sanitized(role)
        })
        .collect();

    Ok(Json(ApiResponse::new("Users fetched successfully.", data)))
}

/// GET /api/users/:id
pub async fn get_user_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = state
        .db
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let role = state.db.role_with_permissions(user.role_id).await?;

    Ok(Json(ApiResponse::new(
        "User fetched successfully.",
        user.sanitized(role),
    )))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    authorizer::guard_role_escalation(
        current.user.id,
        id,
        req.role_id.is_some(),
        &current.capabilities,
    )?;
    authorizer::authorize_self_or(
        current.user.id,
        id,
        &current.capabilities,
        &[Capability::new("users", CrudAction::Update)],
    )?;

    let mut user = state
        .db
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if let Some(email) = &req.email {
        if state.db.email_taken_by_other(email, id).await? {
            return Err(AppError::Conflict("Email already in use.".to_string()));
        }
        user.email = email.clone();
    }

    if let Some(username) = &req.username {
        if state.db.username_taken_by_other(username, id).await? {
            return Err(AppError::Conflict("Username already in use.".to_string()));
        }
        user.username = username.clone();
    }

    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }

    // Re-hash only when the credential actually changes; re-hashing an
    // unchanged password would churn the salt for nothing.
    if let Some(password) = req.password {
        let password = Password::new(password);
        if verify_password(&password, &user.password).is_err() {
            user.password = hash_password(&password)?.into_string();
        }
    }

    if let Some(role_id) = req.role_id {
        state
            .db
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role with id {} not found.", role_id)))?;
        user.role_id = role_id;
    }

    let updated = state.db.update_user(&user).await?;
    let role = state.db.role_with_permissions(updated.role_id).await?;

    Ok(Json(ApiResponse::new(
        "User updated successfully.",
        updated.sanitized(role),
    )))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.db.delete_user(id).await? {
        return Err(AppError::NotFound("User not found.".to_string()));
    }

    Ok(Json(ApiResponse::message_only("User deleted successfully.")))
}
