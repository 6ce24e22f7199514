use std::str::FromStr;

use campus_core::AppError;
use serde::{Deserialize, Serialize};

/// Named capacities a portal user can act in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Follows courses, submits leave requests, reads messages.
    Learner,
    /// Teaches courses, marks attendance, approves leave.
    Instructor,
    /// Monitors department health and escalated approvals.
    DepartmentHead,
    /// Views institution-wide KPI dashboards.
    Executive,
    /// Administers users, audits, and system settings.
    SystemAdmin,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learner => "learner",
            Self::Instructor => "instructor",
            Self::DepartmentHead => "department_head",
            Self::Executive => "executive",
            Self::SystemAdmin => "system_admin",
        }
    }

    /// Returns all known roles in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Learner,
            Role::Instructor,
            Role::DepartmentHead,
            Role::Executive,
            Role::SystemAdmin,
        ];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "learner" => Ok(Self::Learner),
            "instructor" => Ok(Self::Instructor),
            "department_head" => Ok(Self::DepartmentHead),
            "executive" => Ok(Self::Executive),
            "system_admin" => Ok(Self::SystemAdmin),
            _ => Err(AppError::UnknownRole(format!(
                "unknown role value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Role;

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(Role::Learner), *role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = Role::from_str("registrar");
        assert!(parsed.is_err());
    }
}
