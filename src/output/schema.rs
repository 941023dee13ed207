//! Output JSON schema definitions for imported profile groups.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::profile::{Profile, ProfileGroup};
use serde::{Deserialize, Serialize};

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Top-level document written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileGroupDocument {
    /// Schema version for compatibility checking
    pub version: String,

    /// Group name ("chrometrace" for this importer)
    pub name: String,

    /// Trace identifier, when the source format carries one
    pub trace_id: String,

    /// Index of the profile a viewer should open first
    pub active_profile_index: usize,

    /// One profile per process/thread bucket, in discovery order
    pub profiles: Vec<ProfileDocument>,

    /// Timestamp when the document was generated
    pub generated_at: String,
}

/// One reconstructed call-stack profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Display label (thread/process name when the trace provided one)
    pub name: String,

    /// Total accumulated weight, in the trace's own time unit
    pub total_weight: f64,

    /// Call-tree nodes; `roots`, `parent`, and `children` index into this
    pub nodes: Vec<CallTreeNodeDocument>,

    /// Indices of top-level nodes, in time order
    pub roots: Vec<usize>,
}

/// One call-tree node, flattened for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTreeNodeDocument {
    /// Frame display name
    pub frame: String,

    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub total_weight: f64,
    pub self_weight: f64,
}

/// Flatten a finished profile group into its output document.
///
/// **Public** - used by commands to create final output
pub fn document_for_group(group: &ProfileGroup) -> ProfileGroupDocument {
    use chrono::Utc;

    ProfileGroupDocument {
        version: SCHEMA_VERSION.to_string(),
        name: group.name.clone(),
        trace_id: group.trace_id.clone(),
        active_profile_index: group.active_profile_index,
        profiles: group.profiles.iter().map(document_for_profile).collect(),
        generated_at: Utc::now().to_rfc3339(),
    }
}

fn document_for_profile(profile: &Profile) -> ProfileDocument {
    ProfileDocument {
        name: profile.name.clone(),
        total_weight: profile.total_weight,
        nodes: profile
            .nodes
            .iter()
            .map(|node| CallTreeNodeDocument {
                frame: node.frame.name.clone(),
                parent: node.parent,
                children: node.children.clone(),
                total_weight: node.total_weight,
                self_weight: node.self_weight,
            })
            .collect(),
        roots: profile.roots.clone(),
    }
}
