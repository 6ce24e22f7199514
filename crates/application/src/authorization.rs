//! Pure authorization decision functions.
//!
//! Consumed by the route guard and by any feature needing an in-page
//! capability check. These functions receive state as input and never
//! touch the session service.

use std::collections::BTreeSet;

use campus_domain::{Permission, Role, permits};

/// Returns whether the user holds at least one of the allowed roles.
///
/// Evaluated against the full held-role set, not the active role: a user
/// can reach a role-gated route whose required role they hold but are not
/// currently acting as. An empty allowed list matches nobody; callers skip
/// this check entirely when a route declares no role constraint.
#[must_use]
pub fn is_role_allowed(user_roles: &BTreeSet<Role>, allowed_roles: &[Role]) -> bool {
    allowed_roles.iter().any(|role| user_roles.contains(role))
}

/// Returns whether every required permission is granted.
#[must_use]
pub fn is_permitted(user_permissions: &BTreeSet<Permission>, required: &[Permission]) -> bool {
    permits(user_permissions, required)
}
