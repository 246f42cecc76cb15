use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use lms_auth::TokenPair;
use lms_core::{ErrorResponse, PaginationParams, Permission, RoleType, Status};
use lms_models::auth::{AccessTokenResponse, RefreshTokenDto, SignInDto, SignUpDto};
use lms_models::connections::{
    ConfirmationStatus, ConnectionFilterParams, CreateConnectionDto, TeacherToStudent,
};
use lms_models::roles::{CreateUserRoleDto, UpdateUserRoleDto, UserRole, UserRoleFilterParams};
use lms_models::students::{
    CreateDefaultStudentDto, CreateSpecialStudentDto, StudentDto, StudentFilterParams,
    UpdateStudentDto,
};
use lms_models::subjects::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};
use lms_models::teachers::{
    CreateDefaultTeacherDto, CreateSpecialTeacherDto, TeacherDto, TeacherFilterParams,
    UpdateTeacherDto,
};
use lms_models::tests::{
    CreateTestDto, CreateTestItemDto, CreateTestItemOptionDto, TestAccess, TestDto,
    TestFilterParams, TestItemAnswerDto, TestItemAnswerType, TestItemDto, TestItemMediaType,
    TestItemOptionDto, TestItemOptionType, TestPageFormat, TestResultType, TestStatus,
};
use lms_models::users::{
    AdminFilterParams, ChangeEmailDto, ChangePasswordDto, ChangeUsernameDto,
    CreateDefaultUserDto, CreateSpecialUserDto, DefaultRoleTitle, UserDto, UserFilterParams,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::sign_up,
        crate::modules::auth::controller::sign_in,
        crate::modules::auth::controller::get_access_token,
        crate::modules::users::controller::create_default_user,
        crate::modules::users::controller::create_special_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_admins,
        crate::modules::users::controller::change_username,
        crate::modules::users::controller::change_email,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::change_avatar,
        crate::modules::users::controller::activate_user,
        crate::modules::users::controller::archive_user,
        crate::modules::user_roles::controller::create_role,
        crate::modules::user_roles::controller::get_roles,
        crate::modules::user_roles::controller::get_role,
        crate::modules::user_roles::controller::update_role,
        crate::modules::user_roles::controller::activate_role,
        crate::modules::user_roles::controller::archive_role,
        crate::modules::students::controller::create_default_student,
        crate::modules::students::controller::create_special_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::teachers::controller::create_default_teacher,
        crate::modules::teachers::controller::create_special_teacher,
        crate::modules::teachers::controller::get_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::activate_subject,
        crate::modules::subjects::controller::archive_subject,
        crate::modules::connections::controller::create_connection,
        crate::modules::connections::controller::get_connections,
        crate::modules::connections::controller::get_connection,
        crate::modules::connections::controller::confirm_connection,
        crate::modules::connections::controller::delete_connection,
        crate::modules::tests::controller::create_test,
        crate::modules::tests::controller::get_tests,
        crate::modules::tests::controller::get_test,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationParams,
            Permission,
            RoleType,
            Status,
            TokenPair,
            SignUpDto,
            SignInDto,
            RefreshTokenDto,
            AccessTokenResponse,
            UserDto,
            DefaultRoleTitle,
            CreateDefaultUserDto,
            CreateSpecialUserDto,
            ChangeUsernameDto,
            ChangeEmailDto,
            ChangePasswordDto,
            UserFilterParams,
            AdminFilterParams,
            UserRole,
            CreateUserRoleDto,
            UpdateUserRoleDto,
            UserRoleFilterParams,
            StudentDto,
            CreateDefaultStudentDto,
            CreateSpecialStudentDto,
            UpdateStudentDto,
            StudentFilterParams,
            TeacherDto,
            CreateDefaultTeacherDto,
            CreateSpecialTeacherDto,
            UpdateTeacherDto,
            TeacherFilterParams,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            SubjectFilterParams,
            ConfirmationStatus,
            TeacherToStudent,
            CreateConnectionDto,
            ConnectionFilterParams,
            TestAccess,
            TestPageFormat,
            TestResultType,
            TestStatus,
            TestItemMediaType,
            TestItemAnswerType,
            TestItemOptionType,
            TestDto,
            TestItemDto,
            TestItemAnswerDto,
            TestItemOptionDto,
            CreateTestDto,
            CreateTestItemDto,
            CreateTestItemOptionDto,
            TestFilterParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Sign-up, sign-in and token refresh"),
        (name = "Users", description = "Accounts, credentials and avatars"),
        (name = "User roles", description = "Roles and their permission sets"),
        (name = "Students", description = "Student profiles"),
        (name = "Teachers", description = "Teacher profiles and taught subjects"),
        (name = "Subjects", description = "Subject catalogue"),
        (name = "Connections", description = "Teacher-to-student connections"),
        (name = "Tests", description = "Tests with items, answers and media")
    ),
    info(
        title = "LMS API",
        version = "0.1.0",
        description = "Learning management backend: users and roles, students and teachers, subjects, connections and tests.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/sign-in",
            "/api/users/avatar/{id}",
            "/api/user-roles/{id}",
            "/api/students/default-students",
            "/api/teachers/{id}",
            "/api/subjects",
            "/api/connections/teacher-to-student/{id}",
            "/api/tests",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let schemes = doc.components.map(|c| c.security_schemes).unwrap_or_default();
        assert!(schemes.contains_key("bearer_auth"));
    }
}
