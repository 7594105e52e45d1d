//! Role model - named capability bundles assigned to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role entity. Authorization never matches on the role name; the
/// capability strings flattened from the mapping table are the surface.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role with its effective capability set, serialized as flattened
/// `module:action` strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<String>,
}

impl RoleWithPermissions {
    pub fn new(role: Role, permissions: Vec<String>) -> Self {
        Self { role, permissions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_with_permissions_flattens_role_fields() {
        let now = Utc::now();
        let payload = RoleWithPermissions::new(
            Role {
                id: 1,
                name: "Trainer".to_string(),
                description: Some("Course Trainer".to_string()),
                created_at: now,
                updated_at: now,
            },
            vec!["courses:read".to_string(), "courses:update".to_string()],
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["name"], "Trainer");
        assert_eq!(json["permissions"][0], "courses:read");
    }
}
