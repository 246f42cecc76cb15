//! Closed sets of permission tokens, role types and record statuses.
//!
//! All of them travel as their variant name (`"ManageUsers"`, `"Teacher"`,
//! `"Archived"`) in JSON, in token claims and in `TEXT` columns.
//!
//! # Example
//!
//! ```ignore
//! use lms_core::permissions::{Permission, RoleType};
//!
//! let perm: Permission = "CreateMyTests".parse()?;
//! assert_eq!(RoleType::Teacher.to_string(), "Teacher");
//! ```

use std::fmt;

/// Returned when a string does not name any variant of a [`text_enum!`] type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Defines a fieldless enum stored as its variant name.
///
/// Generates serde, utoipa, `Display`, `FromStr` and the SQLx
/// `Type`/`Encode`/`Decode`/`PgHasArrayType` impls delegating to `TEXT`.
/// Decoding a string that is not a variant fails the row decode.
#[macro_export]
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::utoipa::ToSchema,
        )]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::permissions::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err($crate::permissions::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> ::sqlx::Encode<'q, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <::sqlx::Postgres as ::sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<'q, ::sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: <::sqlx::Postgres as ::sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let raw = <&str as ::sqlx::Decode<'r, ::sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }

        impl ::sqlx::postgres::PgHasArrayType for $name {
            fn array_type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::postgres::PgHasArrayType>::array_type_info()
            }
        }
    };
}

text_enum! {
    /// A capability granted by a role. [`Permission::All`] satisfies every requirement.
    pub enum Permission {
        All,
        ManageUserRoles,
        ArchiveEverything,
        CreateDefaultUsers,
        CreateSpecialUsers,
        ManageAdmins,
        ManageUsers,
        ManageMyProfile,
        ManageUserProfiles,
        ManageSubjects,
        ConnectToTeachers,
        ConnectToStudents,
        CreateTests,
        CreateMyTests,
        ManageTests,
    }
}

text_enum! {
    /// Category of a role. Decides which side record a user of that role owns.
    pub enum RoleType {
        Admin,
        Teacher,
        Student,
        Parent,
    }
}

text_enum! {
    /// Soft-delete state shared by users, roles, subjects and tests.
    pub enum Status {
        Active,
        Archived,
    }
}

/// Joins values with `", "`, the separator used in rejection messages.
pub fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_parse_roundtrip() {
        for perm in Permission::VARIANTS {
            assert_eq!(perm.as_str().parse::<Permission>().unwrap(), *perm);
        }
    }

    #[test]
    fn test_unknown_role_type_is_rejected() {
        let err = "Janitor".parse::<RoleType>().unwrap_err();
        assert_eq!(err.kind, "RoleType");
        assert_eq!(err.to_string(), "unknown RoleType 'Janitor'");
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&vec![Permission::ManageUsers, Permission::All]).unwrap();
        assert_eq!(json, r#"["ManageUsers","All"]"#);

        let role: RoleType = serde_json::from_str(r#""Teacher""#).unwrap();
        assert_eq!(role, RoleType::Teacher);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&[RoleType::Admin, RoleType::Teacher]), "Admin, Teacher");
        assert_eq!(join::<Permission>(&[]), "");
    }
}
