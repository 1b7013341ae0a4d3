//! Agentrun Core
//!
//! Core types shared by every agentrun crate.
//!
//! This crate contains:
//! - Domain types: runs, their status lifecycle, tools, messages, content and files
//! - DTOs: request/response shapes exchanged between the client and the run service

pub mod domain;
pub mod dto;
