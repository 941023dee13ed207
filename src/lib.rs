//! Chrometrace Studio
//!
//! A Chrome Trace Event Format importer: turns a flat, arbitrarily-ordered
//! stream of begin/end/complete/metadata events, recorded across multiple
//! processes and threads, into one reconstructed call-stack profile per
//! (process, thread) pair.
//!
//! This crate provides the core implementation for the `chrometrace` CLI
//! tool. Library users start from [`importer::import_chrome_trace`].

pub mod commands;
pub mod importer;
pub mod output;
pub mod parser;
pub mod profile;
pub mod utils;

// Re-export the main entry points
pub use importer::{import_chrome_trace, is_chrome_trace_format};
pub use profile::{Profile, ProfileGroup};
pub use utils::error::ImportError;
