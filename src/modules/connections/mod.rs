//! Teacher-to-student connections.
//!
//! One side requests, the other confirms. Admins act for either side.
//! Confirmed connections are what `onlyMyTeachers` test listings follow.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_connections_router;
