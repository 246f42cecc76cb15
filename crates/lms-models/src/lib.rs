//! # LMS Models
//!
//! Database rows, request forms and response DTOs for the LMS API.
//!
//! Forms derive [`validator::Validate`]; the shared field rules live in
//! [`validation`]. Responses are serialized in camelCase.
//!
//! # Modules
//!
//! - [`auth`]: Sign-up, sign-in and token refresh forms
//! - [`users`]: Users joined with their role, default and special user forms
//! - [`roles`]: User roles and the ids of the built-in ones
//! - [`students`] / [`teachers`]: Side records and their forms
//! - [`subjects`]: Subjects taught by teachers and attached to tests
//! - [`connections`]: Teacher-to-student connections
//! - [`tests`]: Tests, items, answers, options and the listing visibility rules
//!
//! # Example
//!
//! ```ignore
//! use lms_models::users::{UserDto, UserWithRole};
//! use lms_models::roles::builtin;
//!
//! let dto = UserDto::from(row).with_password(plain);
//! assert_ne!(dto.role_id, builtin::ADMIN);
//! ```

pub mod auth;
pub mod connections;
pub mod roles;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod users;
pub mod validation;

pub use auth::{AccessTokenResponse, RefreshTokenDto, SignInDto, SignUpDto};
pub use connections::{ConfirmationStatus, CreateConnectionDto, TeacherToStudent};
pub use roles::{CreateUserRoleDto, UpdateUserRoleDto, UserRole};
pub use students::{StudentDto, StudentRow, UpdateStudentDto};
pub use subjects::{CreateSubjectDto, Subject, UpdateSubjectDto};
pub use teachers::{TeacherDto, TeacherRow, UpdateTeacherDto};
pub use tests::{CreateTestDto, TestAccess, TestDto};
pub use users::{NewUser, UserDto, UserWithRole};
