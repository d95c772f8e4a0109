//! Core library: the tagged file store, its validation rules, search filters,
//! configuration and the single-writer service.

pub mod config;
pub mod error;
pub mod file_storage;
pub mod mime;
pub mod search;
pub mod service;
pub mod validate;

pub use error::{Result, StorageError};
pub use file_storage::{AuditReport, FileStorage, StorePolicy};
pub use search::SearchQuery;
pub use service::{StorageHandle, StorageService};
pub use storage::FileRecord;
