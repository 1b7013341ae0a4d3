//! Data Transfer Objects
//!
//! Request and response shapes exchanged between the client and the run
//! service that are not domain entities themselves.

pub mod file;
pub mod run;
