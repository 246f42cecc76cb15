//! User roles module.
//!
//! A role carries a type and a permission array, and every guard reads its
//! holder's permissions from here on each request. Editing a role therefore
//! changes what its holders may do from their next call.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_user_roles_router;
