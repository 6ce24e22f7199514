use std::collections::BTreeSet;
use std::str::FromStr;

use campus_core::{AppError, AppResult, UserIdentity};
use serde::{Deserialize, Serialize};

use crate::{Permission, Role, RoleRegistry};

/// Locales the portal can render in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Simplified Chinese.
    Zh,
}

impl Locale {
    /// Returns a stable storage value for this locale.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl FromStr for Locale {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            _ => Err(AppError::Validation(format!(
                "unsupported locale '{value}'"
            ))),
        }
    }
}

/// The in-memory authenticated state for the current user.
///
/// Invariants held at all times:
/// - `roles` is non-empty and `active_role` is a member of it;
/// - `permissions` equals the registry union over every held role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    identity: UserIdentity,
    roles: BTreeSet<Role>,
    active_role: Role,
    permissions: BTreeSet<Permission>,
    locale: Locale,
    consent_accepted: bool,
}

impl Session {
    /// Creates a session for a signed-in user, deriving permissions from
    /// the registry.
    ///
    /// Rejects an empty role set or an active role outside the held set
    /// with [`AppError::InvalidSession`].
    pub fn new(
        identity: UserIdentity,
        roles: BTreeSet<Role>,
        active_role: Role,
        locale: Locale,
        consent_accepted: bool,
        registry: &RoleRegistry,
    ) -> AppResult<Self> {
        if roles.is_empty() {
            return Err(AppError::InvalidSession(
                "session requires at least one role".to_owned(),
            ));
        }

        if !roles.contains(&active_role) {
            return Err(AppError::InvalidSession(format!(
                "active role '{}' is not among the held roles",
                active_role.as_str()
            )));
        }

        let permissions = registry.derive_permissions(roles.iter());

        Ok(Self {
            identity,
            roles,
            active_role,
            permissions,
            locale,
            consent_accepted,
        })
    }

    /// Returns the authenticated identity.
    #[must_use]
    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    /// Returns every role the user holds.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns the role currently selected for rendering.
    #[must_use]
    pub fn active_role(&self) -> Role {
        self.active_role
    }

    /// Returns the derived permission set.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns the preferred locale.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Returns whether the user accepted the consent notice.
    #[must_use]
    pub fn consent_accepted(&self) -> bool {
        self.consent_accepted
    }

    /// Switches the active role, re-deriving permissions.
    ///
    /// Returns `false` without mutating when the role is not held. The
    /// union derivation means the permission value does not change across
    /// a switch; re-deriving keeps the invariant explicit.
    pub fn activate_role(&mut self, role: Role, registry: &RoleRegistry) -> bool {
        if !self.roles.contains(&role) {
            return false;
        }

        self.active_role = role;
        self.permissions = registry.derive_permissions(self.roles.iter());
        true
    }

    /// Updates the consent flag. Returns `false` when the value is unchanged.
    pub fn set_consent(&mut self, accepted: bool) -> bool {
        if self.consent_accepted == accepted {
            return false;
        }

        self.consent_accepted = accepted;
        true
    }

    /// Updates the locale. Returns `false` when the value is unchanged.
    pub fn set_locale(&mut self, locale: Locale) -> bool {
        if self.locale == locale {
            return false;
        }

        self.locale = locale;
        true
    }

    /// Revalidates a session restored from storage.
    ///
    /// Checks the structural invariants and re-derives permissions so the
    /// registry, not the stored copy, is the source of truth after a role's
    /// permission set changes between runs.
    pub fn revalidate(&mut self, registry: &RoleRegistry) -> AppResult<()> {
        if self.roles.is_empty() {
            return Err(AppError::Validation(
                "stored session holds no roles".to_owned(),
            ));
        }

        if !self.roles.contains(&self.active_role) {
            return Err(AppError::Validation(format!(
                "stored session activates unheld role '{}'",
                self.active_role.as_str()
            )));
        }

        self.permissions = registry.derive_permissions(self.roles.iter());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use campus_core::{UserId, UserIdentity};

    use super::{Locale, Session};
    use crate::{Permission, Role, RoleDefinition, RoleRegistry};

    fn identity() -> UserIdentity {
        UserIdentity::new(
            UserId::new(),
            "Mei Lin",
            "mei.lin@campus.example",
            "https://cdn.campus.example/avatars/mei.png",
        )
    }

    fn roles(values: &[Role]) -> BTreeSet<Role> {
        values.iter().copied().collect()
    }

    #[test]
    fn session_derives_union_of_held_roles() {
        let registry = RoleRegistry::standard();
        let session = Session::new(
            identity(),
            roles(&[Role::Instructor, Role::DepartmentHead]),
            Role::Instructor,
            Locale::En,
            true,
            &registry,
        );

        assert!(session.is_ok());
        let session = match session {
            Ok(session) => session,
            Err(error) => panic!("session construction failed: {error}"),
        };
        assert!(session.permissions().contains(&Permission::AttendanceMark));
        assert!(session.permissions().contains(&Permission::KpiView));
    }

    #[test]
    fn empty_role_set_is_rejected() {
        let registry = RoleRegistry::standard();
        let session = Session::new(
            identity(),
            BTreeSet::new(),
            Role::Learner,
            Locale::En,
            false,
            &registry,
        );
        assert!(session.is_err());
    }

    #[test]
    fn unheld_active_role_is_rejected() {
        let registry = RoleRegistry::standard();
        let session = Session::new(
            identity(),
            roles(&[Role::Learner]),
            Role::SystemAdmin,
            Locale::En,
            false,
            &registry,
        );
        assert!(session.is_err());
    }

    #[test]
    fn switching_to_held_role_keeps_permissions() {
        let registry = RoleRegistry::standard();
        let mut session = match Session::new(
            identity(),
            roles(&[Role::Instructor, Role::DepartmentHead]),
            Role::Instructor,
            Locale::En,
            true,
            &registry,
        ) {
            Ok(session) => session,
            Err(error) => panic!("session construction failed: {error}"),
        };

        let before = session.permissions().clone();
        assert!(session.activate_role(Role::DepartmentHead, &registry));
        assert_eq!(session.active_role(), Role::DepartmentHead);
        assert_eq!(session.permissions(), &before);
    }

    #[test]
    fn switching_to_unheld_role_is_refused() {
        let registry = RoleRegistry::standard();
        let mut session = match Session::new(
            identity(),
            roles(&[Role::Learner]),
            Role::Learner,
            Locale::En,
            false,
            &registry,
        ) {
            Ok(session) => session,
            Err(error) => panic!("session construction failed: {error}"),
        };

        assert!(!session.activate_role(Role::Executive, &registry));
        assert_eq!(session.active_role(), Role::Learner);
    }

    #[test]
    fn revalidate_rederives_permissions_from_registry() {
        let full = RoleRegistry::standard();
        let mut session = match Session::new(
            identity(),
            roles(&[Role::Learner]),
            Role::Learner,
            Locale::En,
            false,
            &full,
        ) {
            Ok(session) => session,
            Err(error) => panic!("session construction failed: {error}"),
        };

        // A later deploy may shrink what a role grants; the stored copy loses.
        let narrowed = RoleRegistry::new(vec![RoleDefinition::new(
            Role::Learner,
            "Learner",
            "Narrowed for test.",
            [Permission::CourseRead],
        )]);
        assert!(session.revalidate(&narrowed).is_ok());
        assert_eq!(
            session.permissions().iter().copied().collect::<Vec<_>>(),
            vec![Permission::CourseRead]
        );
    }

    #[test]
    fn session_serde_roundtrip_preserves_state() {
        let registry = RoleRegistry::standard();
        let session = match Session::new(
            identity(),
            roles(&[Role::Instructor]),
            Role::Instructor,
            Locale::Zh,
            true,
            &registry,
        ) {
            Ok(session) => session,
            Err(error) => panic!("session construction failed: {error}"),
        };

        let encoded = serde_json::to_string(&session);
        assert!(encoded.is_ok());
        let decoded: Result<Session, _> = serde_json::from_str(&encoded.unwrap_or_default());
        assert!(decoded.is_ok());
        assert_eq!(decoded.ok(), Some(session));
    }

    #[test]
    fn locale_roundtrip_storage_value() {
        assert_eq!(Locale::from_str("zh").ok(), Some(Locale::Zh));
        assert_eq!(Locale::default().as_str(), "en");
        assert!(Locale::from_str("fr").is_err());
    }
}
