//! Permission model - module-scoped CRUD grants and the role mapping rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::capability::{Capability, CrudAction};
use crate::models::role::Role;
use service_core::error::AppError;

/// Permission entity. `role_id` is the optional single-owner link; the
/// authorization surface is the mapping table, not this column.
///
/// Uniqueness is the `(module, action, role_id)` triple. The `module:action`
/// name is a derived display string and carries no constraint of its own.
#[derive(Debug, Clone, FromRow)]
pub struct Permission {
    pub id: i64,
    pub module: String,
    pub action: String,
    pub role_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// The parsed action. Rows only ever hold the four CRUD verbs (enforced
    /// on write and by a CHECK constraint), so a failure here means the
    /// store was corrupted out-of-band.
    pub fn action(&self) -> Result<CrudAction, AppError> {
        self.action
            .parse()
            .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))
    }

    /// The capability this row contributes when mapped to a role.
    pub fn capability(&self) -> Result<Capability, AppError> {
        Ok(Capability::new(&self.module, self.action()?))
    }
}

/// Join row granting a permission to a role.
#[derive(Debug, Clone, FromRow)]
pub struct RolePermission {
    pub role_id: i64,
    pub permission_id: i64,
}

/// Request body for POST /api/permissions.
///
/// When `role_ids` is present it REPLACES the full set of role links for
/// the new permission; when absent but `role_id` is set, the owner role is
/// linked by default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
    pub module: String,
    pub action: String,
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub role_ids: Option<Vec<i64>>,
}

/// Request body for PUT /api/permissions/:id. Absent fields keep their
/// stored value; `role_ids`, when present, replaces all existing links.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionRequest {
    pub module: Option<String>,
    pub action: Option<String>,
    /// Absent means "keep"; an explicit `null` clears the owner role.
    #[serde(default, deserialize_with = "double_option")]
    pub role_id: Option<Option<i64>>,
    #[serde(default)]
    pub role_ids: Option<Vec<i64>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Permission response with the derived capability name and the roles
/// granted access through the mapping table.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub id: i64,
    pub module: String,
    pub action: String,
    pub name: String,
    pub role_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles_with_access: Vec<Role>,
}

impl PermissionResponse {
    pub fn new(permission: Permission, roles_with_access: Vec<Role>) -> Self {
        let name = format!("{}:{}", permission.module, permission.action);
        Self {
            id: permission.id,
            module: permission.module,
            action: permission.action,
            name,
            role_id: permission.role_id,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
            roles_with_access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_permission(module: &str, action: &str) -> Permission {
        let now = Utc::now();
        Permission {
            id: 1,
            module: module.to_string(),
            action: action.to_string(),
            role_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_capability_from_row() {
        let cap = sample_permission("courses", "create").capability().unwrap();
        assert_eq!(cap.to_string(), "courses:create");
    }

    #[test]
    fn test_corrupt_action_is_internal_error() {
        let err = sample_permission("courses", "approve").capability();
        assert!(err.is_err());
    }

    #[test]
    fn test_response_derives_name() {
        let response = PermissionResponse::new(sample_permission("users", "read"), vec![]);
        assert_eq!(response.name, "users:read");
    }

    #[test]
    fn test_update_request_distinguishes_absent_and_null_role() {
        let absent: UpdatePermissionRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.role_id.is_none());

        let cleared: UpdatePermissionRequest = serde_json::from_str(r#"{"roleId": null}"#).unwrap();
        assert_eq!(cleared.role_id, Some(None));

        let set: UpdatePermissionRequest = serde_json::from_str(r#"{"roleId": 4}"#).unwrap();
        assert_eq!(set.role_id, Some(Some(4)));
    }
}
