use lms_core::{Permission, RoleType};
use uuid::Uuid;

use crate::jwt::TokenSubject;

/// The authenticated caller of one request.
///
/// Built fresh for every request from the bearer token and the current
/// user and role rows; never cached between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role_id: Uuid,
    pub role_type: RoleType,
    pub permissions: Vec<Permission>,
}

impl Identity {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// Holds the [`Permission::All`] sentinel.
    pub fn is_unrestricted(&self) -> bool {
        self.has_permission(Permission::All)
    }

    pub fn is_admin(&self) -> bool {
        self.role_type == RoleType::Admin
    }

    pub fn token_subject(&self) -> TokenSubject<'_> {
        TokenSubject {
            id: self.id,
            username: &self.username,
            email: &self.email,
            role_id: self.role_id,
            role_type: self.role_type,
            permissions: &self.permissions,
        }
    }

    /// Permissions from `required` that this identity lacks, in order.
    pub fn missing(&self, required: &[Permission]) -> Vec<Permission> {
        required
            .iter()
            .copied()
            .filter(|p| !self.has_permission(*p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(permissions: Vec<Permission>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "annasmith".to_string(),
            email: "anna@example.com".to_string(),
            role_id: Uuid::new_v4(),
            role_type: RoleType::Teacher,
            permissions,
        }
    }

    #[test]
    fn test_permission_helpers() {
        let id = identity(vec![Permission::ManageMyProfile, Permission::CreateMyTests]);

        assert!(id.has_permission(Permission::CreateMyTests));
        assert!(!id.has_permission(Permission::ManageTests));
        assert!(id.has_any_permission(&[Permission::ManageTests, Permission::CreateMyTests]));
        assert!(!id.has_all_permissions(&[Permission::ManageTests, Permission::CreateMyTests]));
        assert!(!id.is_unrestricted());
        assert!(!id.is_admin());
    }

    #[test]
    fn test_missing_keeps_required_order() {
        let id = identity(vec![Permission::ManageUsers]);
        let missing = id.missing(&[
            Permission::ManageSubjects,
            Permission::ManageUsers,
            Permission::CreateTests,
        ]);
        assert_eq!(missing, vec![Permission::ManageSubjects, Permission::CreateTests]);
    }
}
