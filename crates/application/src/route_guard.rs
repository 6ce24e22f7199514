use campus_domain::{Permission, Role};

use crate::authorization::{is_permitted, is_role_allowed};
use crate::session_service::SessionSnapshot;

/// Access constraints declared by a protected route.
///
/// Both constraints are optional; an absent constraint skips the
/// corresponding check entirely, which is distinct from declaring an empty
/// list. A route declaring neither admits any authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirements {
    allowed_roles: Option<Vec<Role>>,
    required_permissions: Option<Vec<Permission>>,
}

impl RouteRequirements {
    /// Creates the constraint for routes open to any authenticated user.
    #[must_use]
    pub fn authenticated_only() -> Self {
        Self::default()
    }

    /// Declares the roles allowed to reach the route.
    #[must_use]
    pub fn with_allowed_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles = Some(roles.into_iter().collect());
        self
    }

    /// Declares the permissions required to reach the route.
    #[must_use]
    pub fn with_required_permissions(
        mut self,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.required_permissions = Some(permissions.into_iter().collect());
        self
    }

    /// Returns the declared role constraint, if any.
    #[must_use]
    pub fn allowed_roles(&self) -> Option<&[Role]> {
        self.allowed_roles.as_deref()
    }

    /// Returns the declared permission constraint, if any.
    #[must_use]
    pub fn required_permissions(&self) -> Option<&[Permission]> {
        self.required_permissions.as_deref()
    }
}

/// Outcome of one navigation attempt to a protected path.
///
/// Denied access is always a decision value, never an error, so the user
/// always lands on a navigable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The guarded content may render.
    Render,
    /// No authenticated session; redirect to sign-in, carrying the
    /// originally requested location so the caller can return there after
    /// authentication. The redirect does not retry automatically.
    RedirectToSignIn {
        /// The path the user originally requested.
        from: String,
    },
    /// Authenticated but blocked by a role or permission constraint.
    RedirectToUnauthorized,
}

/// Enforcement point redirecting unauthorized navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    sign_in_path: String,
    unauthorized_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new("/login", "/unauthorized")
    }
}

impl RouteGuard {
    /// Creates a guard with explicit redirect targets.
    #[must_use]
    pub fn new(sign_in_path: impl Into<String>, unauthorized_path: impl Into<String>) -> Self {
        Self {
            sign_in_path: sign_in_path.into(),
            unauthorized_path: unauthorized_path.into(),
        }
    }

    /// Evaluates a navigation attempt in fixed order: authentication,
    /// then the role gate, then the permission gate.
    #[must_use]
    pub fn evaluate(
        &self,
        snapshot: &SessionSnapshot,
        requested_path: &str,
        requirements: &RouteRequirements,
    ) -> RouteDecision {
        let session = match snapshot.session() {
            Some(session) if snapshot.is_authenticated() => session,
            _ => {
                return RouteDecision::RedirectToSignIn {
                    from: requested_path.to_owned(),
                };
            }
        };

        if let Some(allowed) = requirements.allowed_roles() {
            if !is_role_allowed(session.roles(), allowed) {
                return RouteDecision::RedirectToUnauthorized;
            }
        }

        if let Some(required) = requirements.required_permissions() {
            if !is_permitted(session.permissions(), required) {
                return RouteDecision::RedirectToUnauthorized;
            }
        }

        RouteDecision::Render
    }

    /// Returns the redirect path for a decision, or `None` when the route
    /// renders.
    #[must_use]
    pub fn redirect_target(&self, decision: &RouteDecision) -> Option<&str> {
        match decision {
            RouteDecision::Render => None,
            RouteDecision::RedirectToSignIn { .. } => Some(self.sign_in_path.as_str()),
            RouteDecision::RedirectToUnauthorized => Some(self.unauthorized_path.as_str()),
        }
    }
}
