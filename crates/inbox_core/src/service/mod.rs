//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and classifier calls into use-case level APIs.
//! - Keep transport layers decoupled from storage details.

pub mod bucketing;
pub mod lifecycle;
pub mod recommend;
