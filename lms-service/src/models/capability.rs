//! Capability value type - the canonical authorization unit.
//!
//! A capability is a `(module, action)` pair with exactly one serialized
//! form, `"module:action"` in lowercase. Storage comparison, token checks,
//! and API responses all go through this type so two call sites can never
//! disagree on concatenation order or casing.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The four CRUD actions a permission row may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudAction {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudAction {
    pub const ALL: [CrudAction; 4] = [
        CrudAction::Create,
        CrudAction::Read,
        CrudAction::Update,
        CrudAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudAction::Create => "create",
            CrudAction::Read => "read",
            CrudAction::Update => "update",
            CrudAction::Delete => "delete",
        }
    }
}

impl FromStr for CrudAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(CrudAction::Create),
            "read" => Ok(CrudAction::Read),
            "update" => Ok(CrudAction::Update),
            "delete" => Ok(CrudAction::Delete),
            _ => Err(format!(
                "Action must be one of create, read, update, or delete (got '{}').",
                s
            )),
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permitted operation on one resource module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    module: String,
    action: CrudAction,
}

impl Capability {
    /// Build a capability, normalizing the module to lowercase.
    pub fn new(module: &str, action: CrudAction) -> Self {
        Self {
            module: module.trim().to_lowercase(),
            action,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn action(&self) -> CrudAction {
        self.action
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once(':')
            .ok_or_else(|| format!("Capability '{}' is not of the form module:action.", s))?;
        if module.trim().is_empty() {
            return Err(format!("Capability '{}' has an empty module.", s));
        }
        Ok(Capability::new(module, action.parse()?))
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_is_lowercase_module_colon_action() {
        let cap = Capability::new("Courses", CrudAction::Create);
        assert_eq!(cap.to_string(), "courses:create");
    }

    #[test]
    fn test_parse_round_trip() {
        let cap: Capability = "employee-permissions:delete".parse().unwrap();
        assert_eq!(cap.module(), "employee-permissions");
        assert_eq!(cap.action(), CrudAction::Delete);
        assert_eq!(cap.to_string().parse::<Capability>().unwrap(), cap);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let upper: Capability = "USERS:UPDATE".parse().unwrap();
        let lower: Capability = "users:update".parse().unwrap();
        assert_eq!(upper, lower);

        let mut set = HashSet::new();
        set.insert(upper);
        assert!(set.contains(&lower));
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        assert!("users:approve".parse::<Capability>().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!("users".parse::<Capability>().is_err());
        assert!(":read".parse::<Capability>().is_err());
    }

    #[test]
    fn test_action_parse_and_as_str() {
        for action in CrudAction::ALL {
            assert_eq!(action.as_str().parse::<CrudAction>().unwrap(), action);
        }
        assert!("view".parse::<CrudAction>().is_err());
    }
}
