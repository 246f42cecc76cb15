//! Access control evaluation.
//!
//! Every guarded operation declares a [`Requirement`] as a constant. The
//! requirement is handed to [`evaluate`] together with the caller's
//! [`Identity`] on each request; nothing about a requirement is stored
//! between calls.
//!
//! Evaluation order, stopping at the first failure:
//!
//! 1. A caller holding [`Permission::All`] is allowed.
//! 2. If `roles` is non-empty, the caller's role type must be listed.
//! 3. If the caller is an Admin and `admin_permissions` is non-empty, every
//!    admin permission must be held. Evaluation then continues with the
//!    base list.
//! 4. An empty `permissions` list allows.
//! 5. With `any_match`, holding one listed permission allows; otherwise all
//!    listed permissions must be held.
//!
//! # Example
//!
//! ```ignore
//! const CREATE_TEST: Requirement<'static> = Requirement::permissions(&[Permission::CreateMyTests])
//!     .with_roles(&[RoleType::Admin, RoleType::Teacher])
//!     .with_admin_permissions(&[Permission::CreateTests]);
//!
//! evaluate(&identity, &CREATE_TEST).map_err(AccessDenied::into_app_error)?;
//! ```

use std::fmt;

use lms_core::error_codes;
use lms_core::permissions::join;
use lms_core::{AppError, Permission, RoleType};
use uuid::Uuid;

use crate::identity::Identity;

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement<'a> {
    pub roles: &'a [RoleType],
    pub permissions: &'a [Permission],
    pub admin_permissions: &'a [Permission],
    pub any_match: bool,
}

impl Requirement<'static> {
    /// Any authenticated caller.
    pub const NONE: Self = Self {
        roles: &[],
        permissions: &[],
        admin_permissions: &[],
        any_match: false,
    };
}

impl<'a> Requirement<'a> {
    pub const fn permissions(permissions: &'a [Permission]) -> Self {
        Self {
            roles: &[],
            permissions,
            admin_permissions: &[],
            any_match: false,
        }
    }

    pub const fn with_roles(self, roles: &'a [RoleType]) -> Self {
        Self { roles, ..self }
    }

    pub const fn with_admin_permissions(self, admin_permissions: &'a [Permission]) -> Self {
        Self {
            admin_permissions,
            ..self
        }
    }

    /// One of the listed permissions is enough.
    pub const fn any_match(self) -> Self {
        Self {
            any_match: true,
            ..self
        }
    }
}

/// Why an identity failed a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    RoleNotAllowed { allowed: Vec<RoleType> },
    MissingAdminPermissions { missing: Vec<Permission> },
    MissingPermissions { missing: Vec<Permission> },
    NoneOfPermissions { required: Vec<Permission> },
    NotCurrentUser,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleNotAllowed { allowed } => {
                write!(f, "{}{}", error_codes::NOT_REQUIRED_ROLE, join(allowed))
            }
            Self::MissingAdminPermissions { missing } => write!(
                f,
                "{}{}",
                error_codes::NOT_ENOUGH_ADMIN_PERMISSIONS,
                join(missing)
            ),
            Self::MissingPermissions { missing } => {
                write!(f, "{}{}", error_codes::NOT_ENOUGH_PERMISSIONS, join(missing))
            }
            Self::NoneOfPermissions { required } => write!(
                f,
                "{}at least one of {}",
                error_codes::NOT_ENOUGH_PERMISSIONS,
                join(required)
            ),
            Self::NotCurrentUser => f.write_str(error_codes::NOT_CURRENT_USER),
        }
    }
}

impl AccessDenied {
    /// 403 carrying the rejection code.
    pub fn into_app_error(self) -> AppError {
        AppError::forbidden(self.to_string())
    }
}

/// Decides whether `identity` satisfies `requirement`.
pub fn evaluate(identity: &Identity, requirement: &Requirement<'_>) -> Result<(), AccessDenied> {
    if identity.is_unrestricted() {
        return Ok(());
    }

    if !requirement.roles.is_empty() && !requirement.roles.contains(&identity.role_type) {
        return Err(AccessDenied::RoleNotAllowed {
            allowed: requirement.roles.to_vec(),
        });
    }

    if identity.is_admin() && !requirement.admin_permissions.is_empty() {
        let missing = identity.missing(requirement.admin_permissions);
        if !missing.is_empty() {
            return Err(AccessDenied::MissingAdminPermissions { missing });
        }
    }

    if requirement.permissions.is_empty() {
        return Ok(());
    }

    if requirement.any_match {
        if identity.has_any_permission(requirement.permissions) {
            return Ok(());
        }
        return Err(AccessDenied::NoneOfPermissions {
            required: requirement.permissions.to_vec(),
        });
    }

    let missing = identity.missing(requirement.permissions);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AccessDenied::MissingPermissions { missing })
    }
}

/// Self-service guard: the caller acts on its own record, or is an Admin.
pub fn ensure_current_user(identity: &Identity, target_id: Uuid) -> Result<(), AccessDenied> {
    if identity.id == target_id || identity.is_admin() {
        Ok(())
    } else {
        Err(AccessDenied::NotCurrentUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role_type: RoleType, permissions: &[Permission]) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            role_id: Uuid::new_v4(),
            role_type,
            permissions: permissions.to_vec(),
        }
    }

    const ROLES: [RoleType; 4] = [
        RoleType::Admin,
        RoleType::Teacher,
        RoleType::Student,
        RoleType::Parent,
    ];

    #[test]
    fn test_all_allows_every_requirement() {
        let requirements = [
            Requirement::NONE,
            Requirement::permissions(&[Permission::ManageTests]),
            Requirement::permissions(&[Permission::ManageTests]).with_roles(&[RoleType::Parent]),
            Requirement::NONE.with_admin_permissions(&[Permission::ManageUsers]),
            Requirement::permissions(&[Permission::ConnectToStudents, Permission::ConnectToTeachers])
                .with_roles(&[RoleType::Student])
                .any_match(),
        ];

        for role in ROLES {
            let caller = identity(role, &[Permission::All]);
            for requirement in &requirements {
                assert_eq!(evaluate(&caller, requirement), Ok(()), "{role} {requirement:?}");
            }
        }
    }

    #[test]
    fn test_empty_requirement_allows_any_identity() {
        for role in ROLES {
            assert_eq!(evaluate(&identity(role, &[]), &Requirement::NONE), Ok(()));
        }
    }

    #[test]
    fn test_all_match_requires_subset() {
        let requirement =
            Requirement::permissions(&[Permission::ManageSubjects, Permission::ManageUsers]);

        let both = identity(
            RoleType::Teacher,
            &[Permission::ManageUsers, Permission::ManageSubjects, Permission::CreateMyTests],
        );
        assert_eq!(evaluate(&both, &requirement), Ok(()));

        let one = identity(RoleType::Teacher, &[Permission::ManageUsers]);
        assert_eq!(
            evaluate(&one, &requirement),
            Err(AccessDenied::MissingPermissions {
                missing: vec![Permission::ManageSubjects]
            })
        );
    }

    #[test]
    fn test_any_match_requires_intersection() {
        let requirement =
            Requirement::permissions(&[Permission::ConnectToTeachers, Permission::ConnectToStudents])
                .any_match();

        let student = identity(RoleType::Student, &[Permission::ConnectToTeachers]);
        assert_eq!(evaluate(&student, &requirement), Ok(()));

        let nobody = identity(RoleType::Student, &[Permission::ManageMyProfile]);
        let denied = evaluate(&nobody, &requirement).unwrap_err();
        assert_eq!(
            denied.to_string(),
            "errors.not-enough-permissions: at least one of ConnectToTeachers, ConnectToStudents"
        );
    }

    #[test]
    fn test_role_list_scenario() {
        let requirement =
            Requirement::permissions(&[Permission::CreateMyTests]).with_roles(&[RoleType::Teacher]);

        let teacher = identity(RoleType::Teacher, &[Permission::CreateMyTests]);
        assert_eq!(evaluate(&teacher, &requirement), Ok(()));

        let student = identity(RoleType::Student, &[Permission::CreateMyTests]);
        let denied = evaluate(&student, &requirement).unwrap_err();
        assert_eq!(
            denied,
            AccessDenied::RoleNotAllowed {
                allowed: vec![RoleType::Teacher]
            }
        );
        assert_eq!(denied.to_string(), "errors.not-required-role: Teacher");
    }

    #[test]
    fn test_admin_tier_scenario() {
        let requirement = Requirement::NONE.with_admin_permissions(&[Permission::ManageUsers]);

        let bare_admin = identity(RoleType::Admin, &[]);
        let denied = evaluate(&bare_admin, &requirement).unwrap_err();
        assert_eq!(
            denied.to_string(),
            "errors.not-enough-admin-permissions: ManageUsers"
        );

        let admin = identity(RoleType::Admin, &[Permission::ManageUsers]);
        assert_eq!(evaluate(&admin, &requirement), Ok(()));
    }

    #[test]
    fn test_admin_tier_adds_to_base_permissions_for_admins() {
        let requirement = Requirement::permissions(&[Permission::ManageMyProfile])
            .with_admin_permissions(&[Permission::ManageUsers]);

        let admin = identity(RoleType::Admin, &[Permission::ManageUsers]);
        assert_eq!(
            evaluate(&admin, &requirement),
            Err(AccessDenied::MissingPermissions {
                missing: vec![Permission::ManageMyProfile]
            })
        );

        let full_admin = identity(
            RoleType::Admin,
            &[Permission::ManageUsers, Permission::ManageMyProfile],
        );
        assert_eq!(evaluate(&full_admin, &requirement), Ok(()));

        // non-admins are held to the base list only
        let teacher = identity(RoleType::Teacher, &[Permission::ManageUsers]);
        assert_eq!(
            evaluate(&teacher, &requirement),
            Err(AccessDenied::MissingPermissions {
                missing: vec![Permission::ManageMyProfile]
            })
        );
        let owner = identity(RoleType::Teacher, &[Permission::ManageMyProfile]);
        assert_eq!(evaluate(&owner, &requirement), Ok(()));
    }

    #[test]
    fn test_admin_tier_then_any_match() {
        let requirement =
            Requirement::permissions(&[Permission::ConnectToStudents, Permission::ConnectToTeachers])
                .any_match()
                .with_admin_permissions(&[Permission::ManageUsers]);

        let admin = identity(RoleType::Admin, &[Permission::ManageUsers]);
        assert_eq!(
            evaluate(&admin, &requirement),
            Err(AccessDenied::NoneOfPermissions {
                required: vec![Permission::ConnectToStudents, Permission::ConnectToTeachers]
            })
        );
    }

    #[test]
    fn test_role_check_precedes_permission_check() {
        let requirement = Requirement::permissions(&[Permission::ManageMyProfile])
            .with_roles(&[RoleType::Admin, RoleType::Teacher]);

        let parent = identity(RoleType::Parent, &[]);
        assert!(matches!(
            evaluate(&parent, &requirement),
            Err(AccessDenied::RoleNotAllowed { .. })
        ));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let requirement = Requirement::permissions(&[Permission::ManageSubjects]);
        let allowed = identity(RoleType::Teacher, &[Permission::ManageSubjects]);
        let denied = identity(RoleType::Teacher, &[]);

        for _ in 0..3 {
            assert!(evaluate(&allowed, &requirement).is_ok());
            assert!(evaluate(&denied, &requirement).is_err());
        }
    }

    #[test]
    fn test_ensure_current_user() {
        let student = identity(RoleType::Student, &[Permission::ManageMyProfile]);
        assert_eq!(ensure_current_user(&student, student.id), Ok(()));
        assert_eq!(
            ensure_current_user(&student, Uuid::new_v4()),
            Err(AccessDenied::NotCurrentUser)
        );

        let admin = identity(RoleType::Admin, &[]);
        assert_eq!(ensure_current_user(&admin, Uuid::new_v4()), Ok(()));

        for role in [RoleType::Teacher, RoleType::Student, RoleType::Parent] {
            let caller = identity(role, &[Permission::All]);
            assert!(ensure_current_user(&caller, Uuid::new_v4()).is_err());
        }
    }

    #[test]
    fn test_into_app_error_is_forbidden() {
        let err = AccessDenied::NotCurrentUser.into_app_error();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(err.message(), "errors.not-current-user");
    }
}
