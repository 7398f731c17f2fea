//! Core records: users on the roster and the attendance events they produce.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role of a registered user, also used as the role of the acting session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Role {
    #[default]
    Admin,
    Employee,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "employee" => Some(Self::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Employee => "Employee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person on the roster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// Unique key, also the payload encoded on the user's badge
    pub id: String,
    pub name: String,
    pub department: String,
    pub role: Role,
}

impl User {
    pub fn new(id: &str, name: &str, department: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            role,
        }
    }

    /// Name of the first empty required field, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.id.trim().is_empty() {
            Some("id")
        } else if self.name.trim().is_empty() {
            Some("name")
        } else if self.department.trim().is_empty() {
            Some("department")
        } else {
            None
        }
    }
}

/// Classification of a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Status {
    Present,
    Late,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Late => "Late",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger entry. Written once per accepted scan and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub user_id: String,
    /// Name as it was when the scan happened
    pub name: String,
    /// Display form of the scan instant
    pub timestamp: String,
    /// Calendar day of the scan, used for report filtering
    pub date: NaiveDate,
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("Employee"), Some(Role::Employee));
        assert_eq!(Role::from_str(" EMPLOYEE "), Some(Role::Employee));
        assert!(Role::from_str("manager").is_none());
    }

    #[test]
    fn test_missing_field() {
        let user = User::new("E1", "Bob", "IT", Role::Employee);
        assert!(user.missing_field().is_none());

        let user = User::new("E1", "  ", "IT", Role::Employee);
        assert_eq!(user.missing_field(), Some("name"));

        let user = User::new("", "Bob", "", Role::Employee);
        assert_eq!(user.missing_field(), Some("id"));
    }

    #[test]
    fn test_user_json_shape() {
        let user = User::new("E1", "Bob", "IT", Role::Employee);
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "E1",
                "name": "Bob",
                "department": "IT",
                "role": "Employee"
            })
        );
    }

    #[test]
    fn test_record_json_shape() {
        let record = AttendanceRecord {
            user_id: "U1".to_string(),
            name: "Alice".to_string(),
            timestamp: "2024-03-04 08:10:00".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            status: Status::Late,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "U1");
        assert_eq!(value["date"], "2024-03-04");
        assert_eq!(value["status"], "Late");
    }
}
