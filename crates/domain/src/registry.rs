use std::collections::BTreeSet;

use campus_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Static description of one role: label, description, and granted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    role: Role,
    label: String,
    description: String,
    permissions: BTreeSet<Permission>,
}

impl RoleDefinition {
    /// Creates a role definition from its configured parts.
    #[must_use]
    pub fn new(
        role: Role,
        label: impl Into<String>,
        description: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            role,
            label: label.into(),
            description: description.into(),
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Returns the role this definition describes.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the human-readable label shown in role pickers.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the descriptive text shown next to the label.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the closed permission set this role confers.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }
}

/// Single source of truth mapping each role to its definition.
///
/// Built once at startup and read-only for the lifetime of the process.
/// Definitions keep their declaration order so UI role pickers render a
/// stable sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRegistry {
    definitions: Vec<RoleDefinition>,
}

impl RoleRegistry {
    /// Creates a registry from an ordered sequence of definitions.
    #[must_use]
    pub fn new(definitions: Vec<RoleDefinition>) -> Self {
        Self { definitions }
    }

    /// Returns the standard campus portal role table.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            RoleDefinition::new(
                Role::Learner,
                "Learner",
                "Access learner workflows such as courses, attendance, and messages.",
                [
                    Permission::MessagesRead,
                    Permission::AttendanceRead,
                    Permission::LeaveSubmit,
                    Permission::CourseRead,
                    Permission::CourseEnroll,
                ],
            ),
            RoleDefinition::new(
                Role::Instructor,
                "Instructor",
                "Manage classes, mark attendance, and communicate with learners.",
                [
                    Permission::MessagesRead,
                    Permission::MessagesWrite,
                    Permission::AttendanceRead,
                    Permission::AttendanceMark,
                    Permission::LeaveApprove,
                    Permission::CourseRead,
                ],
            ),
            RoleDefinition::new(
                Role::DepartmentHead,
                "Department Head",
                "Monitor department health and handle escalated approvals.",
                [
                    Permission::MessagesRead,
                    Permission::AttendanceRead,
                    Permission::LeaveApprove,
                    Permission::CourseRead,
                    Permission::KpiView,
                ],
            ),
            RoleDefinition::new(
                Role::Executive,
                "Executive",
                "View institution-wide KPI dashboards and governance data.",
                [
                    Permission::MessagesRead,
                    Permission::AttendanceRead,
                    Permission::CourseRead,
                    Permission::KpiView,
                ],
            ),
            RoleDefinition::new(
                Role::SystemAdmin,
                "System Admin",
                "Configure system settings, identity bindings, and audit logs.",
                [
                    Permission::MessagesRead,
                    Permission::CourseRead,
                    Permission::AdminUsers,
                    Permission::AdminAudits,
                    Permission::AdminSettings,
                ],
            ),
        ])
    }

    /// Returns the configured definitions in declaration order.
    #[must_use]
    pub fn definitions(&self) -> &[RoleDefinition] {
        self.definitions.as_slice()
    }

    /// Returns the label for a role.
    ///
    /// Fails only when the role is absent from the registry, which is
    /// unreachable with [`RoleRegistry::standard`].
    pub fn label_of(&self, role: Role) -> AppResult<&str> {
        self.find(role)
            .map(RoleDefinition::label)
            .ok_or_else(|| AppError::UnknownRole(format!("role '{}' is not registered", role.as_str())))
    }

    /// Returns the exact configured permission set for a role.
    ///
    /// A role absent from the registry grants nothing; partial
    /// configuration is not an error.
    #[must_use]
    pub fn permissions_of(&self, role: Role) -> BTreeSet<Permission> {
        self.find(role)
            .map(|definition| definition.permissions.clone())
            .unwrap_or_default()
    }

    /// Returns the union of [`RoleRegistry::permissions_of`] over every held role.
    ///
    /// This is the session derivation rule: a user holding multiple roles
    /// keeps the combined permission surface regardless of which role is
    /// currently active.
    #[must_use]
    pub fn derive_permissions<'a>(
        &self,
        roles: impl IntoIterator<Item = &'a Role>,
    ) -> BTreeSet<Permission> {
        roles
            .into_iter()
            .flat_map(|role| self.permissions_of(*role))
            .collect()
    }

    fn find(&self, role: Role) -> Option<&RoleDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.role == role)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Returns whether every required permission is present in the granted set.
///
/// AND semantics over a flat, unordered vocabulary: no wildcards, no
/// hierarchy. An empty requirement is vacuously satisfied.
#[must_use]
pub fn permits(granted: &BTreeSet<Permission>, required: &[Permission]) -> bool {
    required.iter().all(|permission| granted.contains(permission))
}
