//! Storage layer: the JSON sidecar index and its record model.
//!
//! Holds index load/save and the per-file metadata record.

pub mod index;
pub mod models;

pub use index::{Index, IndexError};
pub use models::FileRecord;
