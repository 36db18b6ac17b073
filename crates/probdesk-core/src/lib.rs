//! # probdesk-core
//!
//! Core types, traits, and abstractions for probdesk.
//!
//! This crate provides the record model, the multi-file attachment encoding,
//! and the [`RecordStore`] trait that the database and backup crates build on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod multifile;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{is_safe_component, sanitize_attachment_name};
pub use models::{AttachmentField, CreateRecordRequest, EditorType, Record};
pub use multifile::{decode_file_list, encode_file_list, try_encode_file_list};
pub use traits::RecordStore;
