//! Core domain types
//!
//! These types describe the entities owned by the remote run service. The
//! client only ever holds cached copies of them.

pub mod content;
pub mod file;
pub mod message;
pub mod run;
pub mod tool;
