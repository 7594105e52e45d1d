//! Employee hierarchy models and the per-employee permission override axis.
//!
//! Employees and Users are parallel identity concepts: nothing links an
//! employee-permission decision back to a User or Role record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Lifecycle;

/// Employee entity, attached to the catalogue tree via its sub-master.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub sub_master_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Named, coded catalogue entity that employee permissions are scoped to.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SystemEntity {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SystemEntity {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_deleted_at(self.deleted_at)
    }
}

/// Fine-grained access flags for one `(employee, entity)` pair. The pair is
/// unique; this axis never consults Role or Permission.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePermission {
    pub id: i64,
    pub emp_id: i64,
    pub entity_id: i64,
    pub admin_access: bool,
    pub create_permission: bool,
    pub read_permission: bool,
    pub update_permission: bool,
    pub delete_permission: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EmployeePermission {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_deleted_at(self.deleted_at)
    }
}

/// Request body for POST /api/employee-permissions. Flag defaults: read
/// access on, everything else off.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePermissionRequest {
    pub emp_id: i64,
    pub entity_id: i64,
    pub admin_access: Option<bool>,
    pub create_permission: Option<bool>,
    pub read_permission: Option<bool>,
    pub update_permission: Option<bool>,
    pub delete_permission: Option<bool>,
}

impl CreateEmployeePermissionRequest {
    pub fn admin_access(&self) -> bool {
        self.admin_access.unwrap_or(false)
    }

    pub fn create_permission(&self) -> bool {
        self.create_permission.unwrap_or(false)
    }

    pub fn read_permission(&self) -> bool {
        self.read_permission.unwrap_or(true)
    }

    pub fn update_permission(&self) -> bool {
        self.update_permission.unwrap_or(false)
    }

    pub fn delete_permission(&self) -> bool {
        self.delete_permission.unwrap_or(false)
    }
}

/// Request body for PUT /api/employee-permissions/:id. Absent fields keep
/// their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePermissionRequest {
    pub emp_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub admin_access: Option<bool>,
    pub create_permission: Option<bool>,
    pub read_permission: Option<bool>,
    pub update_permission: Option<bool>,
    pub delete_permission: Option<bool>,
}

/// Employee-permission row with its entity embedded, the list/read shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePermissionWithEntity {
    #[serde(flatten)]
    pub permission: EmployeePermission,
    pub entity: SystemEntity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_read_only() {
        let req: CreateEmployeePermissionRequest =
            serde_json::from_str(r#"{"empId": 5, "entityId": 9}"#).unwrap();
        assert!(!req.admin_access());
        assert!(!req.create_permission());
        assert!(req.read_permission());
        assert!(!req.update_permission());
        assert!(!req.delete_permission());
    }

    #[test]
    fn test_create_request_explicit_flags_win() {
        let req: CreateEmployeePermissionRequest = serde_json::from_str(
            r#"{"empId": 5, "entityId": 9, "readPermission": false, "adminAccess": true}"#,
        )
        .unwrap();
        assert!(req.admin_access());
        assert!(!req.read_permission());
    }
}
