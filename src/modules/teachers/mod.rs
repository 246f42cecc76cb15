//! Teachers module.
//!
//! Teachers are users whose role is of type Teacher. The side record holds
//! institution and post; taught subjects live in `teacher_subjects` and are
//! addressed by title.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_teachers_router;
