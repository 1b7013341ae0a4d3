//! Service Module
//!
//! Business logic layer of the run service.
//! Services validate requests and enforce run lifecycle rules on top of the repositories.

pub mod file;
pub mod run;

// Re-export for convenience
pub use file as file_service;
pub use run as run_service;
