//! Role gate for tracker operations.
//!
//! Every operation belongs to a category, and the acting session's role
//! decides which categories it may run. Denials happen before any state is
//! read for mutation, so a denied call never changes anything.

use crate::error::{TrackerError, TrackerResult};
use crate::model::Role;

/// Permission decision result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Operations the tracker exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Scan,
    ViewLog,
    ViewReport,
    ExportReport,
    ViewSchedule,
    ListUsers,
    AddUser,
    EditUser,
    RenameUser,
    DeleteUser,
    SaveSchedule,
}

impl Operation {
    /// Phrase used in access-denied messages ("only Admins can ...")
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Scan => "scan badges",
            Self::ViewLog => "view the attendance log",
            Self::ViewReport => "view reports",
            Self::ExportReport => "export reports",
            Self::ViewSchedule => "view the configuration",
            Self::ListUsers => "manage users",
            Self::AddUser => "add users",
            Self::EditUser => "edit users",
            Self::RenameUser => "rename users",
            Self::DeleteUser => "delete users",
            Self::SaveSchedule => "configure the system",
        }
    }
}

/// Operation category for role defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    /// Kiosk input: anyone at the scanner
    Scan,
    /// Derived views over the ledger and schedule
    ReadOnly,
    /// Roster and configuration management, including viewing the roster
    Administration,
}

impl OperationCategory {
    pub fn of(op: Operation) -> Self {
        match op {
            Operation::Scan => Self::Scan,
            Operation::ViewLog
            | Operation::ViewReport
            | Operation::ExportReport
            | Operation::ViewSchedule => Self::ReadOnly,
            Operation::ListUsers
            | Operation::AddUser
            | Operation::EditUser
            | Operation::RenameUser
            | Operation::DeleteUser
            | Operation::SaveSchedule => Self::Administration,
        }
    }
}

/// The acting identity, threaded through every gated call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    pub role: Role,
}

impl Session {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    pub fn employee() -> Self {
        Self::new(Role::Employee)
    }
}

pub fn decide(session: &Session, op: Operation) -> Decision {
    match (session.role, OperationCategory::of(op)) {
        (Role::Admin, _) => Decision::Allow,
        (Role::Employee, OperationCategory::Scan | OperationCategory::ReadOnly) => {
            Decision::Allow
        }
        (Role::Employee, OperationCategory::Administration) => Decision::Deny,
    }
}

/// Fail with `AccessDenied` unless `session` may run `op`
pub fn check(session: &Session, op: Operation) -> TrackerResult<()> {
    match decide(session, op) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::info!(role = %session.role, operation = ?op, "access denied");
            Err(TrackerError::AccessDenied {
                operation: op.describe(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Operation; 11] = [
        Operation::Scan,
        Operation::ViewLog,
        Operation::ViewReport,
        Operation::ExportReport,
        Operation::ViewSchedule,
        Operation::ListUsers,
        Operation::AddUser,
        Operation::EditUser,
        Operation::RenameUser,
        Operation::DeleteUser,
        Operation::SaveSchedule,
    ];

    #[test]
    fn test_operation_category() {
        assert_eq!(OperationCategory::of(Operation::Scan), OperationCategory::Scan);
        assert_eq!(
            OperationCategory::of(Operation::ViewReport),
            OperationCategory::ReadOnly
        );
        assert_eq!(
            OperationCategory::of(Operation::SaveSchedule),
            OperationCategory::Administration
        );
    }

    #[test]
    fn test_admin_allowed_everything() {
        let session = Session::admin();
        for op in ALL {
            assert_eq!(decide(&session, op), Decision::Allow, "{:?}", op);
        }
    }

    #[test]
    fn test_employee_denied_administration() {
        let session = Session::employee();
        for op in ALL {
            let expected = match OperationCategory::of(op) {
                OperationCategory::Administration => Decision::Deny,
                _ => Decision::Allow,
            };
            assert_eq!(decide(&session, op), expected, "{:?}", op);
        }
    }

    #[test]
    fn test_check_reports_operation() {
        let err = check(&Session::employee(), Operation::AddUser).unwrap_err();
        assert_eq!(err.to_string(), "Access denied: only Admins can add users");
        assert!(check(&Session::employee(), Operation::Scan).is_ok());
    }

    #[test]
    fn test_default_session_is_admin() {
        assert_eq!(Session::default().role, Role::Admin);
    }
}
