//! Stable machine-readable message codes.
//!
//! Codes ending in `": "` are prefixes: the offending value is appended
//! (see [`AppError::coded`](crate::AppError::coded)).

// Authentication
pub const NOT_AUTHORIZED: &str = "errors.not-authorized";
pub const USER_NOT_EXISTS: &str = "errors.user-not-exists";
pub const USER_NOT_ACTIVE: &str = "errors.user-not-active";
pub const INVALID_REFRESH: &str = "errors.invalid-refresh";
pub const INVALID_PASSWORD: &str = "errors.invalid-password";
pub const TOKEN_EXPIRED: &str = "errors.token-expired";

// Authorization
pub const NOT_REQUIRED_ROLE: &str = "errors.not-required-role: ";
pub const NOT_ENOUGH_PERMISSIONS: &str = "errors.not-enough-permissions: ";
pub const NOT_ENOUGH_ADMIN_PERMISSIONS: &str = "errors.not-enough-admin-permissions: ";
pub const NOT_CURRENT_USER: &str = "errors.not-current-user";

// Forms and lookups
pub const INVALID_FORM: &str = "errors.invalid-form: ";
pub const NOT_ID_PARAMETER: &str = "errors.not-id-parameter: ";
pub const NOT_FOUND: &str = "errors.not-found: ";
pub const FIELD_UNIQUE: &str = "errors.invalid-form.field-must-be-unique: ";
pub const USER_ALREADY_EXISTS: &str = "errors.invalid-form.user-already-exists: ";
pub const INVALID_ROLE: &str = "errors.invalid-role: ";
pub const NOT_ADMIN_ROLE: &str = "errors.not-admin-role: ";
pub const CONNECTION_ALREADY_EXISTS: &str = "errors.connection-already-exists: ";

// Uploads
pub const FILE_IS_NOT_PROVIDED: &str = "errors.file-is-not-provided: ";
pub const INVALID_FILE_SIZE: &str = "errors.invalid-file-size: ";
pub const INVALID_FILE_FORMAT: &str = "errors.invalid-file-format: ";
pub const UNKNOWN_FILE_FORMAT: &str = "errors.unknown-file-format: ";
pub const INVALID_JSON: &str = "errors.invalid-json: ";

// Tests
pub const INVALID_TEST_ITEM_ANSWER: &str = "errors.invalid-test-item-answer: ";
pub const TEST_ITEM_OPTIONS_ARE_NOT_PROVIDED: &str = "errors.test-item-options-are-not-provided: ";
pub const UNKNOWN_TEST_ITEM_OPTION_TYPE: &str = "errors.unknown-test-item-option-type: ";
