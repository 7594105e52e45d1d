//! PostgreSQL data access for the LMS backend.
//!
//! One wrapper over the pool, grouped by entity. Multi-row mutations
//! (permission create/update/delete with their mapping rows) run inside a
//! single transaction: either every row lands or none does.

use std::collections::{HashMap, HashSet};

use sqlx::postgres::PgPool;
use sqlx::{FromRow, Postgres, Transaction};

use crate::models::course::CourseDraft;
use crate::models::{
    Capability, Course, CrudAction, EmployeePermission, Master, Permission, Role,
    RoleWithPermissions, SubMaster, SystemEntity, User,
};
use service_core::error::AppError;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Drop duplicate role ids while preserving first-seen order, so link
/// replacement inserts each pair exactly once.
pub(crate) fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ==================== User Operations ====================

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Single lookup matching the identifier against email OR username,
    /// case-sensitive per stored value.
    pub async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 OR username = $1")
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn email_or_username_taken(
        &self,
        email: &str,
        username: &str,
    ) -> Result<bool, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2 LIMIT 1")
                .bind(email)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2 LIMIT 1")
                .bind(email)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn username_taken_by_other(
        &self,
        username: &str,
        user_id: i64,
    ) -> Result<bool, AppError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1 AND id <> $2 LIMIT 1")
                .bind(username)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    pub async fn insert_user(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        role_id: i64,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password, role_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Persist a merged user row. The handler owns the merge; this writes
    /// every mutable column.
    pub async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, username = $3, email = $4,
                password = $5, role_id = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role_id)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Hard delete. Returns false when no row matched.
    pub async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    // ==================== Role Operations ====================

    pub async fn find_role_by_id(&self, id: i64) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    /// Flattened `module:action` strings for one role, via the mapping
    /// table.
    pub async fn role_permission_strings(&self, role_id: i64) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT p.module, p.action FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.module, p.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(module, action)| {
                let action: CrudAction = action
                    .parse()
                    .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
                Ok(Capability::new(&module, action).to_string())
            })
            .collect()
    }

    pub async fn role_with_permissions(
        &self,
        role_id: i64,
    ) -> Result<Option<RoleWithPermissions>, AppError> {
        let Some(role) = self.find_role_by_id(role_id).await? else {
            return Ok(None);
        };
        let permissions = self.role_permission_strings(role_id).await?;
        Ok(Some(RoleWithPermissions::new(role, permissions)))
    }

    pub async fn list_roles_with_permissions(&self) -> Result<Vec<RoleWithPermissions>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.role_permission_strings(role.id).await?;
            result.push(RoleWithPermissions::new(role, permissions));
        }
        Ok(result)
    }

    // ==================== Capability Resolution ====================

    /// The effective capability set of a user's current role, computed
    /// fresh on every call - mapping mutations apply on the next request.
    pub async fn resolve_capabilities(&self, user_id: i64) -> Result<HashSet<Capability>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT p.module, p.action FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN users u ON u.role_id = rp.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(module, action)| {
                let action: CrudAction = action
                    .parse()
                    .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
                Ok(Capability::new(&module, action))
            })
            .collect()
    }

    // ==================== Permission Operations ====================

    pub async fn find_permission_by_id(&self, id: i64) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(permission)
    }

    /// Permissions with the roles granted access through the mapping table.
    pub async fn list_permissions_with_roles(
        &self,
    ) -> Result<Vec<(Permission, Vec<Role>)>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        #[derive(FromRow)]
        struct MappedRole {
            permission_id: i64,
            #[sqlx(flatten)]
            role: Role,
        }

        let mapped = sqlx::query_as::<_, MappedRole>(
            r#"
            SELECT rp.permission_id, r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            JOIN role_permissions rp ON rp.role_id = r.id
            ORDER BY rp.permission_id, r.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_permission: HashMap<i64, Vec<Role>> = HashMap::new();
        for row in mapped {
            by_permission.entry(row.permission_id).or_default().push(row.role);
        }

        Ok(permissions
            .into_iter()
            .map(|p| {
                let roles = by_permission.remove(&p.id).unwrap_or_default();
                (p, roles)
            })
            .collect())
    }

    /// Roles granted access to one permission through the mapping table.
    pub async fn roles_with_access(&self, permission_id: i64) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.* FROM roles r
            JOIN role_permissions rp ON rp.role_id = r.id
            WHERE rp.permission_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(permission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Create a permission and (optionally) its role links in one
    /// transaction. Validates owner-role existence and the `(module,
    /// action, role_id)` uniqueness invariant before writing.
    pub async fn create_permission(
        &self,
        module: &str,
        action: CrudAction,
        role_id: Option<i64>,
        role_links: Option<&[i64]>,
    ) -> Result<Permission, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(role_id) = role_id {
            ensure_role_exists(&mut tx, role_id).await?;
        }
        ensure_permission_unique(&mut tx, module, action, role_id, None).await?;

        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (module, action, role_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(module)
        .bind(action.as_str())
        .bind(role_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(links) = role_links {
            replace_role_links(&mut tx, permission.id, links).await?;
        }

        tx.commit().await?;
        Ok(permission)
    }

    /// Apply a merged permission row and, when `role_links` is given,
    /// REPLACE the full link set - delete-then-recreate, not a diff - all
    /// in one transaction.
    pub async fn update_permission(
        &self,
        permission: &Permission,
        role_links: Option<&[i64]>,
    ) -> Result<Permission, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(role_id) = permission.role_id {
            ensure_role_exists(&mut tx, role_id).await?;
        }
        let action = permission.action()?;
        ensure_permission_unique(
            &mut tx,
            &permission.module,
            action,
            permission.role_id,
            Some(permission.id),
        )
        .await?;

        let updated = sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions
            SET module = $1, action = $2, role_id = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&permission.module)
        .bind(action.as_str())
        .bind(permission.role_id)
        .bind(permission.id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(links) = role_links {
            replace_role_links(&mut tx, updated.id, links).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a permission, cascading its mapping rows first, atomically.
    /// Returns false when no permission matched.
    pub async fn delete_permission(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Course Operations ====================

    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn find_course_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn insert_course(&self, course: &CourseDraft) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (
                name, type, duration, description, trainer_id, target_audiences,
                thumbnail, level, last_date, show_feedback, feedback_question,
                status, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&course.name)
        .bind(&course.r#type)
        .bind(&course.duration)
        .bind(&course.description)
        .bind(course.trainer_id)
        .bind(&course.target_audiences)
        .bind(&course.thumbnail)
        .bind(&course.level)
        .bind(course.last_date)
        .bind(course.show_feedback)
        .bind(&course.feedback_question)
        .bind(&course.status)
        .bind(course.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn update_course(&self, course: &Course) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET name = $1, type = $2, duration = $3, description = $4,
                trainer_id = $5, target_audiences = $6, thumbnail = $7,
                level = $8, last_date = $9, show_feedback = $10,
                feedback_question = $11, status = $12, updated_by = $13,
                updated_at = NOW()
            WHERE id = $14 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&course.name)
        .bind(&course.r#type)
        .bind(&course.duration)
        .bind(&course.description)
        .bind(course.trainer_id)
        .bind(&course.target_audiences)
        .bind(&course.thumbnail)
        .bind(&course.level)
        .bind(course.last_date)
        .bind(course.show_feedback)
        .bind(&course.feedback_question)
        .bind(&course.status)
        .bind(course.updated_by)
        .bind(course.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn soft_delete_course(&self, id: i64, deleted_by: Option<i64>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE courses SET deleted_at = NOW(), deleted_by = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Master Operations ====================

    pub async fn list_masters(&self) -> Result<Vec<Master>, AppError> {
        let masters = sqlx::query_as::<_, Master>(
            "SELECT * FROM masters WHERE deleted_at IS NULL ORDER BY sequence, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(masters)
    }

    pub async fn find_master_by_id(&self, id: i64) -> Result<Option<Master>, AppError> {
        let master = sqlx::query_as::<_, Master>(
            "SELECT * FROM masters WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(master)
    }

    pub async fn master_code_taken(&self, code: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM masters WHERE code = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn insert_master(
        &self,
        name: &str,
        code: &str,
        is_active: bool,
        sequence: i32,
    ) -> Result<Master, AppError> {
        let master = sqlx::query_as::<_, Master>(
            r#"
            INSERT INTO masters (name, code, is_active, sequence)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(is_active)
        .bind(sequence)
        .fetch_one(&self.pool)
        .await?;
        Ok(master)
    }

    pub async fn update_master(&self, master: &Master) -> Result<Master, AppError> {
        let master = sqlx::query_as::<_, Master>(
            r#"
            UPDATE masters
            SET name = $1, code = $2, is_active = $3, sequence = $4, updated_at = NOW()
            WHERE id = $5 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&master.name)
        .bind(&master.code)
        .bind(master.is_active)
        .bind(master.sequence)
        .bind(master.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(master)
    }

    pub async fn soft_delete_master(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE masters SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== SubMaster Operations ====================

    pub async fn list_sub_masters(&self) -> Result<Vec<SubMaster>, AppError> {
        let sub_masters = sqlx::query_as::<_, SubMaster>(
            "SELECT * FROM sub_masters WHERE deleted_at IS NULL ORDER BY sequence, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sub_masters)
    }

    pub async fn find_sub_master_by_id(&self, id: i64) -> Result<Option<SubMaster>, AppError> {
        let sub_master = sqlx::query_as::<_, SubMaster>(
            "SELECT * FROM sub_masters WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub_master)
    }

    pub async fn sub_master_code_taken(&self, code: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM sub_masters WHERE code = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// `(id, parent_id)` pairs of the live tree, the input for cycle
    /// detection on write.
    pub async fn sub_master_links(&self) -> Result<Vec<(i64, Option<i64>)>, AppError> {
        let links: Vec<(i64, Option<i64>)> =
            sqlx::query_as("SELECT id, parent_id FROM sub_masters WHERE deleted_at IS NULL")
                .fetch_all(&self.pool)
                .await?;
        Ok(links)
    }

    pub async fn insert_sub_master(
        &self,
        name: &str,
        code: &str,
        master_id: i64,
        parent_id: Option<i64>,
        is_active: bool,
        sequence: i32,
    ) -> Result<SubMaster, AppError> {
        let sub_master = sqlx::query_as::<_, SubMaster>(
            r#"
            INSERT INTO sub_masters (name, code, master_id, parent_id, is_active, sequence)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(master_id)
        .bind(parent_id)
        .bind(is_active)
        .bind(sequence)
        .fetch_one(&self.pool)
        .await?;
        Ok(sub_master)
    }

    pub async fn update_sub_master(&self, sub_master: &SubMaster) -> Result<SubMaster, AppError> {
        let sub_master = sqlx::query_as::<_, SubMaster>(
            r#"
            UPDATE sub_masters
            SET name = $1, code = $2, master_id = $3, parent_id = $4,
                is_active = $5, sequence = $6, updated_at = NOW()
            WHERE id = $7 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&sub_master.name)
        .bind(&sub_master.code)
        .bind(sub_master.master_id)
        .bind(sub_master.parent_id)
        .bind(sub_master.is_active)
        .bind(sub_master.sequence)
        .bind(sub_master.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(sub_master)
    }

    pub async fn soft_delete_sub_master(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE sub_masters SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== System Entity Operations ====================

    pub async fn find_system_entity_by_id(&self, id: i64) -> Result<Option<SystemEntity>, AppError> {
        let entity = sqlx::query_as::<_, SystemEntity>(
            "SELECT * FROM system_entities WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity)
    }

    pub async fn find_system_entities_by_ids(
        &self,
        ids: &[i64],
    ) -> Result<Vec<SystemEntity>, AppError> {
        let entities = sqlx::query_as::<_, SystemEntity>(
            "SELECT * FROM system_entities WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(entities)
    }

    // ==================== Employee Permission Operations ====================

    pub async fn list_employee_permissions(&self) -> Result<Vec<EmployeePermission>, AppError> {
        let rows = sqlx::query_as::<_, EmployeePermission>(
            "SELECT * FROM employee_permissions WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_employee_permission_by_id(
        &self,
        id: i64,
    ) -> Result<Option<EmployeePermission>, AppError> {
        let row = sqlx::query_as::<_, EmployeePermission>(
            "SELECT * FROM employee_permissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Lookup by the unique `(emp_id, entity_id)` pair.
    pub async fn find_employee_permission_by_pair(
        &self,
        emp_id: i64,
        entity_id: i64,
    ) -> Result<Option<EmployeePermission>, AppError> {
        let row = sqlx::query_as::<_, EmployeePermission>(
            r#"
            SELECT * FROM employee_permissions
            WHERE emp_id = $1 AND entity_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(emp_id)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_employee_permission(
        &self,
        emp_id: i64,
        entity_id: i64,
        admin_access: bool,
        create_permission: bool,
        read_permission: bool,
        update_permission: bool,
        delete_permission: bool,
    ) -> Result<EmployeePermission, AppError> {
        let row = sqlx::query_as::<_, EmployeePermission>(
            r#"
            INSERT INTO employee_permissions (
                emp_id, entity_id, admin_access, create_permission,
                read_permission, update_permission, delete_permission
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(emp_id)
        .bind(entity_id)
        .bind(admin_access)
        .bind(create_permission)
        .bind(read_permission)
        .bind(update_permission)
        .bind(delete_permission)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_employee_permission(
        &self,
        record: &EmployeePermission,
    ) -> Result<EmployeePermission, AppError> {
        let row = sqlx::query_as::<_, EmployeePermission>(
            r#"
            UPDATE employee_permissions
            SET emp_id = $1, entity_id = $2, admin_access = $3,
                create_permission = $4, read_permission = $5,
                update_permission = $6, delete_permission = $7,
                updated_at = NOW()
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(record.emp_id)
        .bind(record.entity_id)
        .bind(record.admin_access)
        .bind(record.create_permission)
        .bind(record.read_permission)
        .bind(record.update_permission)
        .bind(record.delete_permission)
        .bind(record.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn soft_delete_employee_permission(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE employee_permissions SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ==================== Transaction Helpers ====================

async fn ensure_role_exists(
    tx: &mut Transaction<'_, Postgres>,
    role_id: i64,
) -> Result<(), AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM roles WHERE id = $1")
        .bind(role_id)
        .fetch_optional(&mut **tx)
        .await?;
    if row.is_none() {
        return Err(AppError::NotFound(format!(
            "Role with id {} not found.",
            role_id
        )));
    }
    Ok(())
}

/// Uniqueness check for the `(module, action, role_id)` triple.
/// `IS NOT DISTINCT FROM` makes the NULL owner compare as a value.
async fn ensure_permission_unique(
    tx: &mut Transaction<'_, Postgres>,
    module: &str,
    action: CrudAction,
    role_id: Option<i64>,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT id FROM permissions
        WHERE module = $1 AND action = $2 AND role_id IS NOT DISTINCT FROM $3
          AND ($4::bigint IS NULL OR id <> $4)
        LIMIT 1
        "#,
    )
    .bind(module)
    .bind(action.as_str())
    .bind(role_id)
    .bind(exclude_id)
    .fetch_optional(&mut **tx)
    .await?;

    if row.is_some() {
        return Err(AppError::Conflict(
            "A permission with the provided module, action, and role already exists.".to_string(),
        ));
    }
    Ok(())
}

/// Replace the full link set for a permission: delete everything, then
/// insert the deduplicated role list, validating each role on the way.
/// Runs inside the caller's transaction so a missing role unwinds the
/// delete too.
async fn replace_role_links(
    tx: &mut Transaction<'_, Postgres>,
    permission_id: i64,
    role_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM role_permissions WHERE permission_id = $1")
        .bind(permission_id)
        .execute(&mut **tx)
        .await?;

    for role_id in dedup_ids(role_ids) {
        ensure_role_exists(tx, role_id).await?;
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ids_preserves_first_seen_order() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert_eq!(dedup_ids(&[]), Vec::<i64>::new());
    }
}
