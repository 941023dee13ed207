//! Chrome Trace Event Format import pipeline.
//!
//! This module handles:
//! - Detecting whether raw JSON looks like a Chrome trace
//! - Partitioning the flat event stream into per-thread buckets
//! - Reconstructing one call-stack profile per bucket
//! - Assembling the finished profile group
//!
//! The whole import is a synchronous, pure computation: it either returns
//! a complete `ProfileGroup` or fails. A failure in any bucket aborts the
//! whole import; there is no partial output.

pub mod partition;
pub mod timeline;

use crate::profile::ProfileGroup;
use crate::utils::error::ImportError;
use log::debug;
use serde_json::Value;

pub use partition::{partition_events, Bucket, PartitionedTrace};
pub use timeline::{normalize_bucket, BucketTimeline, TimelineBuilder};

/// Check whether raw JSON is shaped like a Chrome trace.
///
/// **Public** - format sniffing for callers that dispatch between importers
///
/// Array-format traces are arrays of event-like records; object-format
/// traces expose a `traceEvents` field. Recognizing the object format does
/// not mean it can be imported; see [`import_chrome_trace`].
pub fn is_chrome_trace_format(trace: &Value) -> bool {
    match trace {
        Value::Array(events) => events.first().map_or(true, |e| e.is_object()),
        Value::Object(obj) => obj.contains_key("traceEvents"),
        _ => false,
    }
}

/// Import an array-format Chrome trace into a profile group.
///
/// **Public** - main entry point for the import
///
/// # Arguments
/// * `trace` - Parsed trace JSON (the caller owns file reading/parsing)
///
/// # Returns
/// One profile per `(pid, tid)` bucket, in bucket-discovery order,
/// wrapped in the group envelope.
///
/// # Errors
/// * `ImportError::UnsupportedFormat` - object-format trace (recognized,
///   not yet importable)
/// * `ImportError::Format` - input is neither an array nor an object
/// * `ImportError::EmptyProfile` - a bucket has no openable events
/// * `ImportError::UnbalancedStack` - a close never had a matching open
pub fn import_chrome_trace(trace: &Value) -> Result<ProfileGroup, ImportError> {
    match trace {
        Value::Array(events) => import_event_array(events),
        Value::Object(_) => Err(ImportError::UnsupportedFormat(
            "object format not yet supported".to_string(),
        )),
        _ => Err(ImportError::Format(
            "trace must be a JSON array or object".to_string(),
        )),
    }
}

/// Run the per-bucket pipeline and assemble the group.
fn import_event_array(events: &[Value]) -> Result<ProfileGroup, ImportError> {
    let partitioned = partition_events(events);

    let mut profiles = Vec::with_capacity(partitioned.bucket_count());
    for bucket in partitioned.buckets() {
        let timeline = normalize_bucket(bucket.pid, bucket.tid, bucket.events)?;
        let name = timeline
            .label
            .clone()
            .unwrap_or_else(|| format!("pid {}, tid {}", bucket.pid, bucket.tid));

        debug!(
            "Building profile \"{}\" ({} opens, {} closes)",
            name,
            timeline.begins.len(),
            timeline.ends.len()
        );

        let profile = TimelineBuilder::new(timeline, name).run()?;
        profiles.push(profile);
    }

    Ok(ProfileGroup {
        name: "chrometrace".to_string(),
        trace_id: String::new(),
        active_profile_index: 0,
        profiles,
    })
}
