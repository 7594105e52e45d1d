//! Idempotent bootstrap of default roles, permissions, and their mapping.
//!
//! The whole seed runs in one transaction: either the complete default
//! matrix lands or nothing does. Every insert is duplicate-suppressed, so
//! re-running against an already-seeded database is a no-op.

use sqlx::{Postgres, Transaction};

use crate::config::SeedConfig;
use crate::models::{Capability, CrudAction};
use crate::services::Database;
use crate::utils::password::{hash_password, Password};
use service_core::error::AppError;

/// Default roles created at bootstrap.
pub const DEFAULT_ROLES: [(&str, &str); 3] = [
    ("Admin", "Administrator with full platform access."),
    ("Trainer", "Trainer responsible for managing learning materials."),
    ("Employee", "Employee with course consumption capabilities."),
];

/// Resource modules that get the full CRUD permission matrix.
pub const DEFAULT_MODULES: [&str; 7] = [
    "users",
    "roles",
    "courses",
    "permissions",
    "masters",
    "submasters",
    "employee-permissions",
];

/// The full default permission matrix: every module crossed with every
/// CRUD action.
pub fn default_permissions() -> Vec<Capability> {
    DEFAULT_MODULES
        .iter()
        .flat_map(|module| {
            CrudAction::ALL
                .iter()
                .map(|action| Capability::new(module, *action))
        })
        .collect()
}

/// Capabilities granted to each default role.
pub fn role_capability_map() -> Vec<(&'static str, Vec<Capability>)> {
    vec![
        ("Admin", default_permissions()),
        (
            "Trainer",
            vec![
                Capability::new("courses", CrudAction::Create),
                Capability::new("courses", CrudAction::Read),
                Capability::new("courses", CrudAction::Update),
                Capability::new("users", CrudAction::Read),
            ],
        ),
        (
            "Employee",
            vec![Capability::new("courses", CrudAction::Read)],
        ),
    ]
}

/// Seed default roles, the permission matrix, and the role-permission
/// mapping, plus the bootstrap admin account when configured.
pub async fn run(db: &Database, config: &SeedConfig) -> Result<(), AppError> {
    let mut tx = db.pool().begin().await?;

    for (name, description) in DEFAULT_ROLES {
        sqlx::query(
            r#"
            INSERT INTO roles (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(description)
        .execute(&mut *tx)
        .await?;
    }

    for capability in default_permissions() {
        sqlx::query(
            r#"
            INSERT INTO permissions (module, action)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(capability.module())
        .bind(capability.action().as_str())
        .execute(&mut *tx)
        .await?;
    }

    for (role_name, capabilities) in role_capability_map() {
        let role_id = lookup_role_id(&mut tx, role_name).await?;
        for capability in capabilities {
            let permission_id = lookup_permission_id(&mut tx, &capability).await?;
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    if let Some(admin) = &config.admin {
        let admin_role_id = lookup_role_id(&mut tx, "Admin").await?;
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2 LIMIT 1")
                .bind(&admin.email)
                .bind(&admin.username)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_none() {
            let password_hash = hash_password(&Password::new(admin.password.clone()))?;
            sqlx::query(
                r#"
                INSERT INTO users (first_name, last_name, username, email, password, role_id)
                VALUES ('System', 'Admin', $1, $2, $3, $4)
                "#,
            )
            .bind(&admin.username)
            .bind(&admin.email)
            .bind(password_hash.as_str())
            .bind(admin_role_id)
            .execute(&mut *tx)
            .await?;
            tracing::info!(username = %admin.username, "Seeded bootstrap admin user");
        }
    }

    tx.commit().await?;
    tracing::info!("Default roles and permissions seeded");
    Ok(())
}

async fn lookup_role_id(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as("SELECT id FROM roles WHERE name = $1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(id)
}

/// Seeded permissions are the unassigned (role_id IS NULL) rows.
async fn lookup_permission_id(
    tx: &mut Transaction<'_, Postgres>,
    capability: &Capability,
) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "SELECT id FROM permissions WHERE module = $1 AND action = $2 AND role_id IS NULL",
    )
    .bind(capability.module())
    .bind(capability.action().as_str())
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_matrix_covers_every_module_and_action() {
        let matrix = default_permissions();
        assert_eq!(matrix.len(), DEFAULT_MODULES.len() * CrudAction::ALL.len());

        let unique: HashSet<_> = matrix.iter().collect();
        assert_eq!(unique.len(), matrix.len());

        assert!(matrix.contains(&Capability::new("courses", CrudAction::Create)));
        assert!(matrix.contains(&Capability::new("employee-permissions", CrudAction::Delete)));
    }

    #[test]
    fn test_admin_gets_the_full_matrix() {
        let map = role_capability_map();
        let admin = &map.iter().find(|(name, _)| *name == "Admin").unwrap().1;
        assert_eq!(admin.len(), default_permissions().len());
    }

    #[test]
    fn test_trainer_and_employee_grants() {
        let map = role_capability_map();
        let trainer = &map.iter().find(|(name, _)| *name == "Trainer").unwrap().1;
        assert!(trainer.contains(&Capability::new("courses", CrudAction::Update)));
        assert!(!trainer.contains(&Capability::new("courses", CrudAction::Delete)));

        let employee = &map.iter().find(|(name, _)| *name == "Employee").unwrap().1;
        assert_eq!(
            employee.as_slice(),
            &[Capability::new("courses", CrudAction::Read)]
        );
    }
}
