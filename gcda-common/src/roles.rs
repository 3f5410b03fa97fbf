//! Role hierarchy and authorization checks
//!
//! GCDA accounts carry one of three roles with strictly increasing
//! privilege: viewer < labeler < admin. A surface protected at role R is
//! reachable iff the session holds a role ranking at least R.

use std::fmt;

use serde::{Deserialize, Serialize};

// ========================================
// Role Hierarchy
// ========================================

/// Account role, ordered by privilege
///
/// Derived `Ord` follows declaration order, so `Role::Viewer < Role::Labeler
/// < Role::Admin` holds without a manual impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access to dashboards and review history
    Viewer,
    /// May fetch, label, and submit tasks
    Labeler,
    /// Full access, including user administration
    Admin,
}

impl Role {
    /// Numeric rank within the hierarchy (viewer=1, labeler=2, admin=3)
    pub fn rank(&self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Labeler => 2,
            Role::Admin => 3,
        }
    }

    /// Parse a backend role string
    ///
    /// The set is closed; anything outside it is rejected rather than
    /// defaulted.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "viewer" => Some(Role::Viewer),
            "labeler" => Some(Role::Labeler),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Wire representation used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Labeler => "labeler",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================================
// Authorization Gate
// ========================================

/// Decide whether a session may reach a surface protected at `required`
///
/// Pure function over the role hierarchy: grant iff the session role ranks
/// at least as high as the required role. No session denies unconditionally;
/// callers present re-authentication rather than a blank surface.
pub fn can_access(session_role: Option<Role>, required: Role) -> bool {
    match session_role {
        Some(role) => role.rank() >= required.rank(),
        None => false,
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 3] = [Role::Viewer, Role::Labeler, Role::Admin];

    #[test]
    fn test_admin_reaches_every_surface() {
        assert!(can_access(Some(Role::Admin), Role::Viewer));
        assert!(can_access(Some(Role::Admin), Role::Labeler));
        assert!(can_access(Some(Role::Admin), Role::Admin));
    }

    #[test]
    fn test_labeler_cannot_reach_admin_surfaces() {
        assert!(can_access(Some(Role::Labeler), Role::Viewer));
        assert!(can_access(Some(Role::Labeler), Role::Labeler));
        assert!(!can_access(Some(Role::Labeler), Role::Admin));
    }

    #[test]
    fn test_viewer_reaches_only_viewer_surfaces() {
        assert!(can_access(Some(Role::Viewer), Role::Viewer));
        assert!(!can_access(Some(Role::Viewer), Role::Labeler));
        assert!(!can_access(Some(Role::Viewer), Role::Admin));
    }

    #[test]
    fn test_no_session_fails_all_checks() {
        for required in ALL_ROLES {
            assert!(!can_access(None, required));
        }
    }

    #[test]
    fn test_equal_roles_always_pass() {
        for role in ALL_ROLES {
            assert!(can_access(Some(role), role));
        }
    }

    #[test]
    fn test_derived_order_matches_rank() {
        assert!(Role::Viewer < Role::Labeler);
        assert!(Role::Labeler < Role::Admin);
        assert!(Role::Viewer.rank() < Role::Labeler.rank());
        assert!(Role::Labeler.rank() < Role::Admin.rank());
    }

    #[test]
    fn test_parse_accepts_only_known_roles() {
        assert_eq!(Role::parse("viewer"), Some(Role::Viewer));
        assert_eq!(Role::parse("labeler"), Some(Role::Labeler));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_wire_format_is_lowercase() {
        let json = serde_json::to_string(&Role::Labeler).unwrap();
        assert_eq!(json, "\"labeler\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
