//! Students module.
//!
//! Students are users whose role is of type Student, with an optional
//! institution and birth date kept in the `students` side record.

pub mod controller;
pub mod router;
pub mod service;

pub use router::init_students_router;
