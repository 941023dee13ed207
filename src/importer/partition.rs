//! Partition a flat event stream into per-process, per-thread buckets.
//!
//! Buckets preserve each event's original relative position, and the
//! partition remembers the order in which process and thread ids were
//! first seen so profiles come out in discovery order.

use crate::parser::TraceEvent;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

/// Events grouped by `(pid, tid)`, in discovery order.
///
/// **Public** - produced here, consumed by the importer's bucket loop
#[derive(Debug, Default)]
pub struct PartitionedTrace {
    pid_order: Vec<i64>,
    by_pid: HashMap<i64, ProcessEvents>,
}

#[derive(Debug, Default)]
struct ProcessEvents {
    tid_order: Vec<i64>,
    by_tid: HashMap<i64, Vec<TraceEvent>>,
}

/// One process/thread bucket, borrowed from the partition.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'a> {
    pub pid: i64,
    pub tid: i64,
    pub events: &'a [TraceEvent],
}

impl PartitionedTrace {
    fn push(&mut self, event: TraceEvent) {
        if !self.by_pid.contains_key(&event.pid) {
            self.pid_order.push(event.pid);
        }
        let process = self.by_pid.entry(event.pid).or_default();

        if !process.by_tid.contains_key(&event.tid) {
            process.tid_order.push(event.tid);
        }
        process.by_tid.entry(event.tid).or_default().push(event);
    }

    /// Iterate buckets in discovery order: processes in first-seen order,
    /// threads in first-seen order within each process.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket<'_>> + '_ {
        self.pid_order.iter().flat_map(move |&pid| {
            let process = &self.by_pid[&pid];
            process.tid_order.iter().map(move |&tid| Bucket {
                pid,
                tid,
                events: process.by_tid[&tid].as_slice(),
            })
        })
    }

    /// Number of `(pid, tid)` buckets discovered.
    pub fn bucket_count(&self) -> usize {
        self.by_pid.values().map(|p| p.by_tid.len()).sum()
    }
}

/// Group raw array elements into buckets.
///
/// **Public** - first pipeline stage after format detection
///
/// Elements that fail to deserialize, above all those without a numeric
/// `pid` or `tid`, are dropped silently. That is a data-quality
/// tolerance, not a failure condition.
pub fn partition_events(raw_events: &[Value]) -> PartitionedTrace {
    let mut partitioned = PartitionedTrace::default();
    let mut dropped = 0usize;

    for raw in raw_events {
        match serde_json::from_value::<TraceEvent>(raw.clone()) {
            Ok(event) => partitioned.push(event),
            Err(_) => dropped += 1,
        }
    }

    debug!(
        "Partitioned {} events into {} buckets ({} unroutable elements skipped)",
        raw_events.len() - dropped,
        partitioned.bucket_count(),
        dropped
    );

    partitioned
}
