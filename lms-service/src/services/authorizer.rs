//! Authorization decisions over resolved capability sets.
//!
//! The authentication middleware resolves the principal's capability set
//! fresh on every request (no cross-request cache); the functions here turn
//! that set plus a required list into an Allow/Deny decision. Deny is
//! always `Forbidden`, distinct from the `Unauthorized` of a failed
//! authentication.

use std::collections::HashSet;

use crate::models::{Capability, CrudAction};
use service_core::error::AppError;

/// True iff the granted set covers every required capability (AND
/// semantics - a single missing capability denies).
pub fn has_all(granted: &HashSet<Capability>, required: &[Capability]) -> bool {
    required.iter().all(|cap| granted.contains(cap))
}

/// Allow iff `granted` is a superset of `required`.
pub fn authorize(granted: &HashSet<Capability>, required: &[Capability]) -> Result<(), AppError> {
    if has_all(granted, required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have the required permissions.".to_string(),
        ))
    }
}

/// Self-service rule: a principal may always act on its own resource;
/// anyone else needs the required capabilities.
pub fn authorize_self_or(
    principal_id: i64,
    target_id: i64,
    granted: &HashSet<Capability>,
    required: &[Capability],
) -> Result<(), AppError> {
    if principal_id == target_id {
        return Ok(());
    }
    authorize(granted, required)
}

/// Escalation guard for self-updates: the self-service bypass never covers
/// changing one's own role. A self-update carrying a role change still
/// requires `users:update`.
pub fn guard_role_escalation(
    principal_id: i64,
    target_id: i64,
    role_change_requested: bool,
    granted: &HashSet<Capability>,
) -> Result<(), AppError> {
    if principal_id == target_id
        && role_change_requested
        && !has_all(granted, &[Capability::new("users", CrudAction::Update)])
    {
        return Err(AppError::Forbidden(
            "You are not allowed to change your own role.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn caps(keys: &[&str]) -> HashSet<Capability> {
        keys.iter().map(|k| k.parse().unwrap()).collect()
    }

    fn required(keys: &[&str]) -> Vec<Capability> {
        keys.iter().map(|k| k.parse().unwrap()).collect()
    }

    #[test]
    fn test_allow_requires_every_capability() {
        let granted = caps(&["courses:read", "courses:create"]);
        assert!(authorize(&granted, &required(&["courses:read"])).is_ok());
        assert!(authorize(&granted, &required(&["courses:read", "courses:create"])).is_ok());
        // AND semantics: one missing capability denies the whole request.
        assert!(authorize(&granted, &required(&["courses:read", "courses:delete"])).is_err());
    }

    #[test]
    fn test_empty_required_set_always_allows() {
        assert!(authorize(&caps(&[]), &[]).is_ok());
    }

    #[test]
    fn test_deny_is_forbidden_not_unauthorized() {
        let err = authorize(&caps(&[]), &required(&["users:read"])).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_granting_is_monotonic() {
        // Adding capabilities can only flip Deny to Allow, never the
        // reverse, for an unchanged required set.
        let require = required(&["masters:update", "masters:read"]);
        let mut granted = caps(&["masters:read"]);
        assert!(authorize(&granted, &require).is_err());

        granted.insert("masters:update".parse().unwrap());
        assert!(authorize(&granted, &require).is_ok());

        granted.insert("submasters:delete".parse().unwrap());
        assert!(authorize(&granted, &require).is_ok());
    }

    #[test]
    fn test_self_access_bypasses_capability_check() {
        let granted = caps(&[]);
        assert!(authorize_self_or(7, 7, &granted, &required(&["users:update"])).is_ok());
        assert!(authorize_self_or(7, 8, &granted, &required(&["users:update"])).is_err());
    }

    #[test]
    fn test_other_target_with_capability_allows() {
        let granted = caps(&["users:update"]);
        assert!(authorize_self_or(7, 8, &granted, &required(&["users:update"])).is_ok());
    }

    #[test]
    fn test_self_role_change_needs_users_update() {
        let no_caps = caps(&[]);
        let err = guard_role_escalation(7, 7, true, &no_caps).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // Same request without a role change sails through.
        assert!(guard_role_escalation(7, 7, false, &no_caps).is_ok());

        // With the capability the self role change is allowed.
        assert!(guard_role_escalation(7, 7, true, &caps(&["users:update"])).is_ok());

        // The guard only concerns self-updates; other targets are handled
        // by the self-or rule upstream.
        assert!(guard_role_escalation(7, 8, true, &no_caps).is_ok());
    }
}
