//! Authentication module.
//!
//! Sign-up, sign-in and access token refresh. All three routes sit behind the
//! per-client rate limiter when it is enabled.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_auth_router;
