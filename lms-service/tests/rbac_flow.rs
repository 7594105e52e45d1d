//! RBAC flow tests against a live PostgreSQL instance.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::collections::HashSet;

use lms_service::config::{DatabaseConfig, SeedConfig};
use lms_service::db;
use lms_service::models::{Capability, CrudAction};
use lms_service::services::{seed, Database};

async fn test_database() -> Database {
    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/lms_test".to_string()),
        max_connections: 5,
        min_connections: 1,
    };
    let pool = db::create_pool(&config).await.expect("connect to PostgreSQL");
    db::run_migrations(&pool).await.expect("run migrations");

    let database = Database::new(pool);
    seed::run(&database, &SeedConfig::default())
        .await
        .expect("seed defaults");
    database
}

/// Remove any permission rows for a module left behind by earlier runs.
async fn cleanup_module(database: &Database, module: &str) {
    let permissions = database
        .list_permissions_with_roles()
        .await
        .expect("list permissions");
    for (permission, _) in permissions {
        if permission.module == module {
            database
                .delete_permission(permission.id)
                .await
                .expect("cleanup permission");
        }
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn seeding_twice_leaves_exactly_one_row_per_mapping() {
    let database = test_database().await;

    // Second run must be a pure no-op thanks to duplicate suppression.
    seed::run(&database, &SeedConfig::default())
        .await
        .expect("re-seed");

    let admin = database
        .find_role_by_name("Admin")
        .await
        .unwrap()
        .expect("Admin role seeded");
    let permissions = database.role_permission_strings(admin.id).await.unwrap();

    let unique: HashSet<_> = permissions.iter().collect();
    assert_eq!(permissions.len(), unique.len());
    assert!(permissions.contains(&"courses:create".to_string()));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn created_permission_round_trips_as_capability() {
    let database = test_database().await;
    cleanup_module(&database, "reports").await;

    let permission = database
        .create_permission("reports", CrudAction::Create, None, None)
        .await
        .unwrap();

    let listed = database.list_permissions_with_roles().await.unwrap();
    let found = listed
        .iter()
        .find(|(p, _)| p.id == permission.id)
        .expect("created permission listed");
    assert_eq!(
        found.0.capability().unwrap(),
        Capability::new("reports", CrudAction::Create)
    );

    // The uniqueness invariant rejects a second identical triple.
    let duplicate = database
        .create_permission("reports", CrudAction::Create, None, None)
        .await;
    assert!(duplicate.is_err());

    cleanup_module(&database, "reports").await;
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn deleting_permission_revokes_it_from_every_linked_role() {
    let database = test_database().await;
    cleanup_module(&database, "reports").await;

    let trainer = database
        .find_role_by_name("Trainer")
        .await
        .unwrap()
        .expect("Trainer role seeded");
    let employee = database
        .find_role_by_name("Employee")
        .await
        .unwrap()
        .expect("Employee role seeded");

    let permission = database
        .create_permission(
            "reports",
            CrudAction::Read,
            None,
            Some(&[trainer.id, employee.id, trainer.id]),
        )
        .await
        .unwrap();

    for role_id in [trainer.id, employee.id] {
        let strings = database.role_permission_strings(role_id).await.unwrap();
        assert_eq!(
            strings.iter().filter(|s| *s == "reports:read").count(),
            1,
            "duplicate link ids must collapse to one mapping row"
        );
    }

    assert!(database.delete_permission(permission.id).await.unwrap());

    for role_id in [trainer.id, employee.id] {
        let strings = database.role_permission_strings(role_id).await.unwrap();
        assert!(!strings.contains(&"reports:read".to_string()));
    }
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn role_link_replacement_is_total_not_incremental() {
    let database = test_database().await;
    cleanup_module(&database, "reports").await;

    let trainer = database
        .find_role_by_name("Trainer")
        .await
        .unwrap()
        .expect("Trainer role seeded");
    let employee = database
        .find_role_by_name("Employee")
        .await
        .unwrap()
        .expect("Employee role seeded");

    let mut permission = database
        .create_permission("reports", CrudAction::Update, None, Some(&[trainer.id]))
        .await
        .unwrap();

    // Re-sync with only Employee: the Trainer link must disappear.
    permission.module = "reports".to_string();
    let updated = database
        .update_permission(&permission, Some(&[employee.id]))
        .await
        .unwrap();

    let roles = database.roles_with_access(updated.id).await.unwrap();
    let role_ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
    assert_eq!(role_ids, vec![employee.id]);

    cleanup_module(&database, "reports").await;
}
