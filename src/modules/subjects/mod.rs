//! Subjects taught by teachers and attached to tests.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_subjects_router;
