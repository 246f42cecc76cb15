//! Tests with their items, built from multipart forms.

pub mod service;

pub use router::init_tests_router;
