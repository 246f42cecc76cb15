//! # LMS Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`server`]: Bind address (`HOST`, `PORT`, default `0.0.0.0:5000`)
//! - [`database`]: PostgreSQL connection settings
//! - [`jwt`]: Token signing secret, lifetimes and expiry validation
//! - [`cors`]: Allowed origins
//! - [`rate_limit`]: Authentication endpoint rate limiting
//! - [`storage`]: Upload directory and per-kind size limits
//!
//! [`AppConfig`] bundles them; it is built once in `main` and handed to the
//! application state. Nothing reads the environment after startup.
//!
//! # Example
//!
//! ```ignore
//! use lms_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! ```

pub mod app;
pub mod cors;
pub mod database;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod storage;

// Re-export commonly used types at crate root
pub use app::AppConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;
