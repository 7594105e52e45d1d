//! Data model for the LMS backend.

pub mod capability;
pub mod course;
pub mod employee;
pub mod master;
pub mod permission;
pub mod role;
pub mod user;

pub use capability::{Capability, CrudAction};
pub use course::Course;
pub use employee::{Employee, EmployeePermission, SystemEntity};
pub use master::{Master, SubMaster};
pub use permission::{Permission, RolePermission};
pub use role::{Role, RoleWithPermissions};
pub use user::{User, UserResponse};

/// Lifecycle state of soft-deleted entities.
///
/// Catalogue and content tables are never hard-deleted; rows move to
/// `Deleted` and every read query filters on the active state explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted,
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<chrono::DateTime<chrono::Utc>>) -> Self {
        match deleted_at {
            None => Lifecycle::Active,
            Some(_) => Lifecycle::Deleted,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_from_deleted_at() {
        assert!(Lifecycle::from_deleted_at(None).is_active());
        assert!(!Lifecycle::from_deleted_at(Some(chrono::Utc::now())).is_active());
    }
}
