//! Employee permission override endpoints, gated by
//! `employee-permissions:*` capabilities.
//!
//! This is the second, role-independent authorization axis: per-employee,
//! per-entity flag sets. The referenced system entity must exist before
//! any write; the `(empId, entityId)` pair is a hard unique key.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::collections::HashMap;

use crate::handlers::ApiResponse;
use crate::middleware::AuthUser;
use crate::models::employee::{
    CreateEmployeePermissionRequest, EmployeePermissionWithEntity,
    UpdateEmployeePermissionRequest,
};
use crate::models::{Capability, CrudAction, SystemEntity};
use crate::services::authorizer;
use crate::AppState;
use service_core::error::AppError;

fn require(action: CrudAction) -> [Capability; 1] {
    [Capability::new("employee-permissions", action)]
}

async fn ensure_entity_exists(state: &AppState, entity_id: i64) -> Result<SystemEntity, AppError> {
    state
        .db
        .find_system_entity_by_id(entity_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Referenced system entity not found.".to_string()))
}

/// POST /api/employee-permissions
pub async fn create_employee_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(req): Json<CreateEmployeePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EmployeePermissionWithEntity>>), AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Create))?;

    let entity = ensure_entity_exists(&state, req.entity_id).await?;

    if state
        .db
        .find_employee_permission_by_pair(req.emp_id, req.entity_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Permissions for this employee and entity already exist.".to_string(),
        ));
    }

    let record = state
        .db
        .insert_employee_permission(
            req.emp_id,
            req.entity_id,
            req.admin_access(),
            req.create_permission(),
            req.read_permission(),
            req.update_permission(),
            req.delete_permission(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Employee permission created successfully.",
            EmployeePermissionWithEntity {
                permission: record,
                entity,
            },
        )),
    ))
}

/// GET /api/employee-permissions
pub async fn get_employee_permissions(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<ApiResponse<Vec<EmployeePermissionWithEntity>>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let records = state.db.list_employee_permissions().await?;
    let entity_ids: Vec<i64> = records.iter().map(|r| r.entity_id).collect();
    let entities: HashMap<i64, SystemEntity> = state
        .db
        .find_system_entities_by_ids(&entity_ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    let data = records
        .into_iter()
        .filter_map(|record| {
            entities
                .get(&record.entity_id)
                .cloned()
                .map(|entity| EmployeePermissionWithEntity {
                    permission: record,
                    entity,
                })
        })
        .collect();

    Ok(Json(ApiResponse::new(
        "Employee permissions fetched successfully.",
        data,
    )))
}

/// GET /api/employee-permissions/:id
pub async fn get_employee_permission_by_id(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EmployeePermissionWithEntity>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Read))?;

    let record = state
        .db
        .find_employee_permission_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee permission not found.".to_string()))?;

    let entity = ensure_entity_exists(&state, record.entity_id).await?;

    Ok(Json(ApiResponse::new(
        "Employee permission fetched successfully.",
        EmployeePermissionWithEntity {
            permission: record,
            entity,
        },
    )))
}

/// PUT /api/employee-permissions/:id
pub async fn update_employee_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEmployeePermissionRequest>,
) -> Result<Json<ApiResponse<EmployeePermissionWithEntity>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Update))?;

    let mut record = state
        .db
        .find_employee_permission_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee permission not found.".to_string()))?;

    // Entity existence only needs re-validation when the caller actually
    // moves the row to a different entity.
    if let Some(entity_id) = req.entity_id {
        if entity_id != record.entity_id {
            ensure_entity_exists(&state, entity_id).await?;
        }
        record.entity_id = entity_id;
    }

    if let Some(emp_id) = req.emp_id {
        record.emp_id = emp_id;
    }
    if let Some(admin_access) = req.admin_access {
        record.admin_access = admin_access;
    }
    if let Some(create_permission) = req.create_permission {
        record.create_permission = create_permission;
    }
    if let Some(read_permission) = req.read_permission {
        record.read_permission = read_permission;
    }
    if let Some(update_permission) = req.update_permission {
        record.update_permission = update_permission;
    }
    if let Some(delete_permission) = req.delete_permission {
        record.delete_permission = delete_permission;
    }

    let updated = state.db.update_employee_permission(&record).await?;
    let entity = ensure_entity_exists(&state, updated.entity_id).await?;

    Ok(Json(ApiResponse::new(
        "Employee permission updated successfully.",
        EmployeePermissionWithEntity {
            permission: updated,
            entity,
        },
    )))
}

/// DELETE /api/employee-permissions/:id
pub async fn delete_employee_permission(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    authorizer::authorize(&current.capabilities, &require(CrudAction::Delete))?;

    if !state.db.soft_delete_employee_permission(id).await? {
        return Err(AppError::NotFound(
            "Employee permission not found.".to_string(),
        ));
    }

    Ok(Json(ApiResponse::message_only(
        "Employee permission deleted successfully.",
    )))
}
