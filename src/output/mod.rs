//! Output writers for imported profile data.
//!
//! This module handles writing finished profile groups to disk as
//! versioned JSON documents, and reading them back for validation.

pub mod json;
pub mod schema;

// Re-export main functions and types
pub use json::{read_profile_group, write_profile_group};
pub use schema::{document_for_group, ProfileGroupDocument, SCHEMA_VERSION};
