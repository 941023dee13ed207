//! Trace event parsing and data model.
//!
//! This module defines the wire-level shape of Chrome Trace Event Format
//! records. Format detection and timeline reconstruction live in `importer`.

pub mod event;

// Re-export main types
pub use event::{Phase, TraceEvent};
