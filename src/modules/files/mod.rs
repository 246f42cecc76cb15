//! Upload handling shared by the avatar and test endpoints.
//!
//! Files are checked against the image policy and a per-field size limit,
//! then written to the temp storage as `<field>/<uuid>.<original name>`.

pub mod service;

pub use service::{FileService, MultipartForm, UploadedFile};
