//! # LMS CLI
//!
//! Administrative tasks that have no HTTP surface: default roles, the first
//! admin account, and fake data for development.
//!
//! ## Usage
//!
//! ```ignore
//! use lms_cli::seeder::{seed_all, SeedConfig};
//!
//! roles::seed_roles(&pool).await?;
//! seed_all(&pool, SeedConfig::default()).await?;
//! ```

pub mod admin;
pub mod roles;
pub mod seeder;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;
