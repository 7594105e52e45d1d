//! Master catalogue CRUD endpoints, gated by `masters:*` capabilities.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::master::{CreateMasterRequest, UpdateMasterRequest};
use crate::models::{Capability, CrudAction, Master};
use crate::services::authorizer;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

fn require(action: CrudAction) -> [Capability; 1] {
    [Capability::new("masters", action)]
}

/// POST /api/masters
pub async fn create_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateMasterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Master>>), AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Create))?;

    if state.db.master_code_taken(&req.code).await? {
        return Err(AppError::Conflict(
            "A master with the provided code already exists.".to_string(),
        ));
    }

    let master = state
        .db
        .insert_master(
            &req.name,
            &req.code,
            req.is_active.unwrap_or(true),
            req.sequence.unwrap_or(0),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Master created successfully.", master)),
    ))
}

/// GET /api/masters
pub async fn get_masters(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ApiResponse<Vec<Master>>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let masters = state.db.list_masters().await?;

    Ok(Json(ApiResponse::new(
        "Masters fetched successfully.",
        masters,
    )))
}

/// GET /api/masters/:id
pub async fn get_master_by_id(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Master>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let master = state
        .db
        .find_master_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    Ok(Json(ApiResponse::new(
        "Master fetched successfully.",
        master,
    )))
}

/// PUT /api/masters/:id
pub async fn update_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateMasterRequest>,
) -> Result<Json<ApiResponse<Master>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Update))?;

    let mut master = state
        .db
        .find_master_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Master not found.".to_string()))?;

    if let Some(code) = req.code {
        // Conflict only matters when the code actually changes.
        if code != master.code && state.db.master_code_taken(&code).await? {
            return Err(AppError::Conflict(
                "A master with the provided code already exists.".to_string(),
            ));
        }
        master.code = code;
    }

    if let Some(name) = req.name {
        master.name = name;
    }
    if let Some(is_active) = req.is_active {
        master.is_active = is_active;
    }
    if let Some(sequence) = req.sequence {
        master.sequence = sequence;
    }

    let updated = state.db.update_master(&master).await?;

    Ok(Json(ApiResponse::new(
        "Master updated successfully.",
        updated,
    )))
}

/// DELETE /api/masters/:id
pub async fn delete_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Delete))?;

    if !state.db.soft_delete_master(id).await? {
        return Err(AppError::NotFound("Master not found.".to_string()));
    }

    Ok(Json(ApiResponse::message_only(
        "Master deleted successfully.",
    )))
}
