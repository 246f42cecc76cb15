//! Users module.
//!
//! Creation of default and special users, listings, self-service profile
//! changes and activation. The creation pipeline in [`service::UserService`]
//! is shared with the auth, student and teacher modules.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_users_router;
