//! Trace event data model for the Chrome Trace Event Format.
//!
//! Array-format traces are flat sequences of event records. Each record
//! carries a process id, a thread id, a timestamp, and a one-character
//! phase that determines how the record participates in the timeline.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Event phase, decoded from the one-character `ph` field.
///
/// Only duration begin/end, complete, and metadata phases take part in
/// timeline reconstruction; every other phase (counters, async, flow,
/// samples, ...) is carried as `Other` and filtered out downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Begin phase of a duration event (`B`).
    Begin,

    /// End phase of a duration event (`E`).
    End,

    /// Complete event (`X`): an interval with an inline duration.
    Complete,

    /// Metadata event (`M`): process/thread labels, not part of the timeline.
    Metadata,

    /// Any phase the importer does not reconstruct.
    Other,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Other
    }
}

impl Phase {
    /// Map a phase code to its timeline role.
    pub fn from_code(code: &str) -> Phase {
        match code {
            "B" => Phase::Begin,
            "E" => Phase::End,
            "X" => Phase::Complete,
            "M" => Phase::Metadata,
            _ => Phase::Other,
        }
    }
}

/// Deserialize the `ph` field, folding unknown codes into `Phase::Other`.
fn deserialize_phase<'de, D>(deserializer: D) -> Result<Phase, D::Error>
where
    D: Deserializer<'de>,
{
    let code = String::deserialize(deserializer)?;
    Ok(Phase::from_code(&code))
}

/// A single record from an array-format trace.
///
/// `pid`, `tid`, and `ts` are required: a record that cannot be routed to a
/// process/thread bucket at a point in time fails deserialization, and the
/// partitioner drops it silently. Everything else is optional with the
/// defaults the format specifies.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    /// Process id
    pub pid: i64,

    /// Thread id
    pub tid: i64,

    /// Timestamp, in whatever monotonic unit the trace was recorded in
    pub ts: f64,

    /// Event phase
    #[serde(default, rename = "ph", deserialize_with = "deserialize_phase")]
    pub phase: Phase,

    /// Event name; display-only, never part of frame identity
    #[serde(default)]
    pub name: Option<String>,

    /// Event arguments; the sole source of frame identity
    #[serde(default)]
    pub args: Map<String, Value>,

    /// Wall-clock duration, only meaningful for Complete events
    #[serde(default)]
    pub dur: Option<f64>,

    /// Thread-clock duration, fallback when `dur` is absent
    #[serde(default)]
    pub tdur: Option<f64>,
}

impl TraceEvent {
    /// Display name for labeling, defaulting to `"Unknown"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// Interval length of a Complete event, preferring `dur` over `tdur`.
    ///
    /// Returns `None` when neither duration field is present; such events
    /// cannot be split into an open/close pair and are dropped.
    pub fn duration(&self) -> Option<f64> {
        self.dur.or(self.tdur)
    }
}
