use std::str::FromStr;

use campus_core::AppError;
use serde::{Deserialize, Serialize};

/// Atomic allowed actions scoped to a portal feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows reading messages.
    MessagesRead,
    /// Allows composing and sending messages.
    MessagesWrite,
    /// Allows reading attendance records.
    AttendanceRead,
    /// Allows marking attendance for a class.
    AttendanceMark,
    /// Allows submitting a leave request.
    LeaveSubmit,
    /// Allows approving leave requests.
    LeaveApprove,
    /// Allows reading course catalogues and enrolments.
    CourseRead,
    /// Allows enrolling into a course.
    CourseEnroll,
    /// Allows creating and editing courses.
    CourseManage,
    /// Allows viewing KPI dashboards.
    KpiView,
    /// Allows administering user accounts.
    AdminUsers,
    /// Allows reading audit logs.
    AdminAudits,
    /// Allows changing system settings.
    AdminSettings,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessagesRead => "messages:read",
            Self::MessagesWrite => "messages:write",
            Self::AttendanceRead => "attendance:read",
            Self::AttendanceMark => "attendance:mark",
            Self::LeaveSubmit => "leave:submit",
            Self::LeaveApprove => "leave:approve",
            Self::CourseRead => "course:read",
            Self::CourseEnroll => "course:enroll",
            Self::CourseManage => "course:manage",
            Self::KpiView => "kpi:view",
            Self::AdminUsers => "admin:users",
            Self::AdminAudits => "admin:audits",
            Self::AdminSettings => "admin:settings",
        }
    }

    /// Returns all known permissions in declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::MessagesRead,
            Permission::MessagesWrite,
            Permission::AttendanceRead,
            Permission::AttendanceMark,
            Permission::LeaveSubmit,
            Permission::LeaveApprove,
            Permission::CourseRead,
            Permission::CourseEnroll,
            Permission::CourseManage,
            Permission::KpiView,
            Permission::AdminUsers,
            Permission::AdminAudits,
            Permission::AdminSettings,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}
