//! Repository Module
//!
//! Data access layer over the in-memory store.
//! Each repository handles the operations for a specific domain entity.

pub mod file;
pub mod run;

// Re-export for convenience
pub use file as file_repository;
pub use run as run_repository;
