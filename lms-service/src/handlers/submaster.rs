//! SubMaster catalogue CRUD endpoints, gated by `submasters:*`
//! capabilities.
//!
//! A sub-master references exactly one master (must exist) and optionally
//! a parent sub-master (must exist). Parent assignments are checked
//! against the live tree so the self-referential hierarchy can never
//! acquire a cycle.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::master::{
    introduces_cycle, parent_chain_terminates, CreateSubMasterRequest, UpdateSubMasterRequest,
};
use crate::models::{Capability, CrudAction, SubMaster};
use crate::services::authorizer;
use crate::utils::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

fn require(action: CrudAction) -> [Capability; 1] {
    [Capability::new("submasters", action)]
}

async fn ensure_master_exists(state: &AppState, master_id: i64) -> Result<(), AppError> {
    state
        .db
        .find_master_by_id(master_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Associated master not found.".to_string()))?;
    Ok(())
}

async fn ensure_parent_exists(state: &AppState, parent_id: i64) -> Result<(), AppError> {
    state
        .db
        .find_sub_master_by_id(parent_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Parent SubMaster not found.".to_string()))?;
    Ok(())
}

/// POST /api/submasters
pub async fn create_sub_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateSubMasterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubMaster>>), AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Create))?;

    ensure_master_exists(&state, req.master_id).await?;
    if let Some(parent_id) = req.parent_id {
        ensure_parent_exists(&state, parent_id).await?;

        let links = state.db.sub_master_links().await?;
        if !parent_chain_terminates(Some(parent_id), &links) {
            return Err(AppError::Validation(
                "SubMaster parent chain contains a cycle.".to_string(),
            ));
        }
    }

    if state.db.sub_master_code_taken(&req.code).await? {
        return Err(AppError::Conflict(
            "A SubMaster with the provided code already exists.".to_string(),
        ));
    }

    let sub_master = state
        .db
        .insert_sub_master(
            &req.name,
            &req.code,
            req.master_id,
            req.parent_id,
            req.is_active.unwrap_or(true),
            req.sequence.unwrap_or(0),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "SubMaster created successfully.",
            sub_master,
        )),
    ))
}

/// GET /api/submasters
pub async fn get_sub_masters(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ApiResponse<Vec<SubMaster>>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let sub_masters = state.db.list_sub_masters().await?;

    Ok(Json(ApiResponse::new(
        "SubMasters fetched successfully.",
        sub_masters,
    )))
}

/// GET /api/submasters/:id
pub async fn get_sub_master_by_id(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SubMaster>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let sub_master = state
        .db
        .find_sub_master_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("SubMaster not found.".to_string()))?;

    Ok(Json(ApiResponse::new(
        "SubMaster fetched successfully.",
        sub_master,
    )))
}

/// PUT /api/submasters/:id
pub async fn update_sub_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateSubMasterRequest>,
) -> Result<Json<ApiResponse<SubMaster>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Update))?;

    let mut sub_master = state
        .db
        .find_sub_master_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("SubMaster not found.".to_string()))?;

    if let Some(code) = req.code {
        if code != sub_master.code && state.db.sub_master_code_taken(&code).await? {
            return Err(AppError::Conflict(
                "A SubMaster with the provided code already exists.".to_string(),
            ));
        }
        sub_master.code = code;
    }

    if let Some(master_id) = req.master_id {
        ensure_master_exists(&state, master_id).await?;
        sub_master.master_id = master_id;
    }

    if let Some(parent_id) = req.parent_id {
        if let Some(parent_id) = parent_id {
            ensure_parent_exists(&state, parent_id).await?;
        }

        let links = state.db.sub_master_links().await?;
        if introduces_cycle(id, parent_id, &links) {
            return Err(AppError::Validation(
                "SubMaster parent assignment would create a cycle.".to_string(),
            ));
        }
        sub_master.parent_id = parent_id;
    }

    if let Some(name) = req.name {
        sub_master.name = name;
    }
    if let Some(is_active) = req.is_active {
        sub_master.is_active = is_active;
    }
    if let Some(sequence) = req.sequence {
        sub_master.sequence = sequence;
    }

    let updated = state.db.update_sub_master(&sub_master).await?;

    Ok(Json(ApiResponse::new(
        "SubMaster updated successfully.",
        updated,
    )))
}

/// DELETE /api/submasters/:id
pub async fn delete_sub_master(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Delete))?;

    if !state.db.soft_delete_sub_master(id).await? {
        return Err(AppError::NotFound("SubMaster not found.".to_string()));
    }

    Ok(Json(ApiResponse::message_only(
        "SubMaster deleted successfully.",
    )))
}
