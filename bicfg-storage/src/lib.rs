//! # bicfg-storage
//!
//! One-shot export and import of configuration documents.
//!
//! A configuration is persisted only as a single JSON document; there is no
//! history, index or versioned schema.

pub mod error;
pub mod export;

pub use error::StorageError;
pub use export::{load_workspace, read_export, read_export_verified, write_export, ExportMeta};
