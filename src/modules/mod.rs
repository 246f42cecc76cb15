pub mod auth;
pub mod connections;
pub mod files;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod tests;
pub mod user_roles;
pub mod users;
