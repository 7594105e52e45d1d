//! Catalogue hierarchy models: Master and the self-referential SubMaster
//! tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use validator::Validate;

use crate::models::Lifecycle;

/// Top-level catalogue entity.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Master {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Master {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_deleted_at(self.deleted_at)
    }
}

/// Second-level catalogue entity. `parent_id` forms an arena-style tree
/// over the id-indexed table; cycle prevention happens on write.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubMaster {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub master_id: i64,
    pub parent_id: Option<i64>,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SubMaster {
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_deleted_at(self.deleted_at)
    }
}

/// Request body for POST /api/masters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMasterRequest {
    #[validate(length(min = 1, max = 150, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "code is required"))]
    pub code: String,
    pub is_active: Option<bool>,
    pub sequence: Option<i32>,
}

/// Request body for PUT /api/masters/:id.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMasterRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub code: Option<String>,
    pub is_active: Option<bool>,
    pub sequence: Option<i32>,
}

/// Request body for POST /api/submasters.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubMasterRequest {
    #[validate(length(min = 1, max = 150, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "code is required"))]
    pub code: String,
    pub master_id: i64,
    pub parent_id: Option<i64>,
    pub is_active: Option<bool>,
    pub sequence: Option<i32>,
}

/// Request body for PUT /api/submasters/:id.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubMasterRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub code: Option<String>,
    pub master_id: Option<i64>,
    /// Absent means "keep"; an explicit `null` detaches from the parent.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
    pub sequence: Option<i32>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// True when the parent chain starting at `start` reaches a root without
/// revisiting a node. Used on create, where the new row cannot itself be
/// part of the chain but a corrupted ancestry still must be refused.
pub fn parent_chain_terminates(start: Option<i64>, links: &[(i64, Option<i64>)]) -> bool {
    let parents: std::collections::HashMap<i64, Option<i64>> = links.iter().copied().collect();
    let mut visited = HashSet::new();
    let mut cursor = start;

    while let Some(id) = cursor {
        if !visited.insert(id) {
            return false;
        }
        cursor = parents.get(&id).copied().flatten();
    }

    true
}

/// Check whether pointing `sub_master_id` at `new_parent_id` would close a
/// cycle in the parent chain. `links` holds `(id, parent_id)` for the live
/// sub-masters.
///
/// Walks the ancestor chain from the proposed parent; a hop back onto
/// `sub_master_id` (or a repeat caused by pre-existing corruption) is a
/// cycle.
pub fn introduces_cycle(
    sub_master_id: i64,
    new_parent_id: Option<i64>,
    links: &[(i64, Option<i64>)],
) -> bool {
    let Some(start) = new_parent_id else {
        return false;
    };
    if start == sub_master_id {
        return true;
    }

    let parents: std::collections::HashMap<i64, Option<i64>> = links.iter().copied().collect();
    let mut visited = HashSet::new();
    let mut cursor = Some(start);

    while let Some(id) = cursor {
        if id == sub_master_id || !visited.insert(id) {
            return true;
        }
        cursor = parents.get(&id).copied().flatten();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_parent_never_cycles() {
        assert!(!introduces_cycle(1, None, &[]));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        assert!(introduces_cycle(1, Some(1), &[(1, None)]));
    }

    #[test]
    fn test_reparenting_onto_own_descendant_is_a_cycle() {
        // 1 -> 2 -> 3; re-parenting 1 under 3 closes the loop.
        let links = [(1, None), (2, Some(1)), (3, Some(2))];
        assert!(introduces_cycle(1, Some(3), &links));
    }

    #[test]
    fn test_valid_chain_is_not_a_cycle() {
        let links = [(1, None), (2, Some(1)), (3, Some(2))];
        assert!(!introduces_cycle(4, Some(3), &links));
        assert!(!introduces_cycle(3, Some(1), &links));
    }

    #[test]
    fn test_parent_chain_terminates() {
        let links = [(1, None), (2, Some(1)), (3, Some(2))];
        assert!(parent_chain_terminates(None, &links));
        assert!(parent_chain_terminates(Some(3), &links));

        let cyclic = [(2, Some(3)), (3, Some(2))];
        assert!(!parent_chain_terminates(Some(2), &cyclic));
    }

    #[test]
    fn test_preexisting_loop_upstream_is_reported() {
        // 2 and 3 already point at each other; attaching anything below
        // either of them must be refused rather than spinning forever.
        let links = [(2, Some(3)), (3, Some(2))];
        assert!(introduces_cycle(1, Some(2), &links));
    }
}
