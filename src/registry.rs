//! The roster of users, kept in insertion order.
//!
//! Operations here enforce the registry invariants (unique ids, required
//! fields) and nothing else; role checks happen in the tracker.

use crate::error::{TrackerError, TrackerResult};
use crate::model::{Role, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRegistry {
    users: Vec<User>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Users that are expected to scan in (everyone but admins)
    pub fn non_admins(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| u.role != Role::Admin)
    }

    pub fn add(&mut self, user: User) -> TrackerResult<()> {
        if let Some(field) = user.missing_field() {
            return Err(TrackerError::IncompleteInput(field));
        }
        if self.contains(&user.id) {
            return Err(TrackerError::DuplicateIdentifier(user.id));
        }
        self.users.push(user);
        Ok(())
    }

    /// Replace the user `id` with `updated`.
    ///
    /// The old entry is removed and the new one appended, so an edited user
    /// moves to the end of the roster. `updated.id` may differ from `id`.
    pub fn edit(&mut self, id: &str, updated: User) -> TrackerResult<()> {
        let Some(pos) = self.position(id) else {
            return Err(TrackerError::UnknownIdentifier(id.to_string()));
        };
        if let Some(field) = updated.missing_field() {
            return Err(TrackerError::IncompleteInput(field));
        }
        if updated.id != id && self.contains(&updated.id) {
            return Err(TrackerError::DuplicateIdentifier(updated.id));
        }
        self.users.remove(pos);
        self.users.push(updated);
        Ok(())
    }

    /// Change a user's key in place, keeping every other field and the
    /// user's position.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> TrackerResult<()> {
        let Some(pos) = self.position(old_id) else {
            return Err(TrackerError::UnknownIdentifier(old_id.to_string()));
        };
        if new_id.trim().is_empty() {
            return Err(TrackerError::IncompleteInput("id"));
        }
        if old_id == new_id {
            return Ok(());
        }
        if self.contains(new_id) {
            return Err(TrackerError::DuplicateIdentifier(new_id.to_string()));
        }
        self.users[pos].id = new_id.to_string();
        Ok(())
    }

    /// Remove `id` if present. Returns the removed user.
    pub fn delete(&mut self, id: &str) -> Option<User> {
        let pos = self.position(id)?;
        Some(self.users.remove(pos))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> User {
        User::new("E1", "Bob", "IT", Role::Employee)
    }

    fn registry() -> UserRegistry {
        UserRegistry::from_users(vec![
            User::new("A1", "Ann", "Ops", Role::Admin),
            bob(),
            User::new("E2", "Cid", "Sales", Role::Employee),
        ])
    }

    #[test]
    fn test_add_twice_is_duplicate() {
        let mut reg = UserRegistry::new();
        reg.add(bob()).unwrap();
        let err = reg.add(bob()).unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateIdentifier(ref id) if id == "E1"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_add_incomplete() {
        let mut reg = UserRegistry::new();
        let err = reg
            .add(User::new("E1", "Bob", "", Role::Employee))
            .unwrap_err();
        assert!(matches!(err, TrackerError::IncompleteInput("department")));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_edit_moves_user_to_end() {
        let mut reg = registry();
        reg.edit("E1", User::new("E1", "Robert", "IT", Role::Employee))
            .unwrap();
        let ids: Vec<&str> = reg.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "E2", "E1"]);
        assert_eq!(reg.get("E1").unwrap().name, "Robert");
    }

    #[test]
    fn test_edit_can_change_id() {
        let mut reg = registry();
        reg.edit("E1", User::new("E9", "Bob", "IT", Role::Employee))
            .unwrap();
        assert!(!reg.contains("E1"));
        assert!(reg.contains("E9"));
    }

    #[test]
    fn test_edit_duplicate_keeps_original() {
        let mut reg = registry();
        let before = reg.clone();
        let err = reg
            .edit("E1", User::new("E2", "Bob", "IT", Role::Employee))
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateIdentifier(_)));
        assert_eq!(reg, before);
    }

    #[test]
    fn test_edit_incomplete_keeps_original() {
        let mut reg = registry();
        let before = reg.clone();
        let err = reg
            .edit("E1", User::new("E1", "", "IT", Role::Employee))
            .unwrap_err();
        assert!(matches!(err, TrackerError::IncompleteInput("name")));
        assert_eq!(reg, before);
    }

    #[test]
    fn test_edit_unknown() {
        let mut reg = registry();
        let err = reg.edit("nope", bob()).unwrap_err();
        assert!(matches!(err, TrackerError::UnknownIdentifier(_)));
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut reg = registry();
        reg.rename("E1", "E7").unwrap();
        assert_eq!(reg.users()[1].id, "E7");
        assert_eq!(reg.users()[1].name, "Bob");
    }

    #[test]
    fn test_rename_errors() {
        let mut reg = registry();
        assert!(matches!(
            reg.rename("E1", "E2"),
            Err(TrackerError::DuplicateIdentifier(_))
        ));
        assert!(matches!(
            reg.rename("X", "E9"),
            Err(TrackerError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            reg.rename("E1", " "),
            Err(TrackerError::IncompleteInput("id"))
        ));
        assert!(reg.rename("E1", "E1").is_ok());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut reg = registry();
        assert!(reg.delete("E1").is_some());
        assert_eq!(reg.len(), 2);
        assert!(reg.delete("E1").is_none());
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_non_admins() {
        let reg = registry();
        let ids: Vec<&str> = reg.non_admins().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E2"]);
    }
}
