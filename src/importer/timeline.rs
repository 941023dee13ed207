//! Timeline reconstruction for one process/thread bucket.
//!
//! A bucket arrives as a flat slice of events in recording order. The
//! normalizer filters it down to timeline phases, splits Complete events
//! into synthetic open/close pairs, and leaves two independently
//! time-sorted queues. The timeline builder then merges those queues
//! chronologically into a single well-nested call stack, driving the
//! profile accumulator, and force-closes whatever the trace never closed.

use crate::parser::{Phase, TraceEvent};
use crate::profile::{Frame, FrameKey, Profile, StackProfileBuilder};
use crate::utils::error::ImportError;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Normalized per-bucket event queues, ready for the merge.
#[derive(Debug)]
pub struct BucketTimeline {
    /// Display label captured from metadata events, if any
    pub label: Option<String>,

    /// Pending opens, time-sorted ascending (stable)
    pub begins: VecDeque<TraceEvent>,

    /// Pending closes, time-sorted ascending (stable)
    pub ends: VecDeque<TraceEvent>,
}

/// Filter and expand one bucket's events into begin/end queues.
///
/// **Public** - second pipeline stage, feeds `TimelineBuilder`
///
/// Phases outside {Begin, End, Complete, Metadata} are dropped. Complete
/// events with a numeric duration are split into a synthetic Begin at `ts`
/// and End at `ts + duration`; without one they are dropped. Metadata
/// events named `thread_name`/`process_name` with a string `args.name`
/// (re)assign the bucket label; the last match wins.
///
/// # Errors
/// * `ImportError::EmptyProfile` - no openable event survived filtering
pub fn normalize_bucket(
    pid: i64,
    tid: i64,
    events: &[TraceEvent],
) -> Result<BucketTimeline, ImportError> {
    let mut label = None;
    let mut begins: Vec<TraceEvent> = Vec::new();
    let mut ends: Vec<TraceEvent> = Vec::new();

    for event in events {
        match event.phase {
            Phase::Begin => begins.push(event.clone()),
            Phase::End => ends.push(event.clone()),
            Phase::Complete => {
                // A Complete without a duration cannot be split; no
                // zero-duration default is inferred.
                let Some(duration) = event.duration() else {
                    continue;
                };
                let mut begin = event.clone();
                begin.phase = Phase::Begin;
                begins.push(begin);

                let mut end = event.clone();
                end.phase = Phase::End;
                end.ts = event.ts + duration;
                ends.push(end);
            }
            Phase::Metadata => {
                if let Some(found) = metadata_label(event) {
                    label = Some(found);
                }
            }
            Phase::Other => {}
        }
    }

    // Stable sorts: equal timestamps keep their insertion order.
    begins.sort_by(|a, b| a.ts.total_cmp(&b.ts));
    ends.sort_by(|a, b| a.ts.total_cmp(&b.ts));

    if begins.is_empty() {
        return Err(ImportError::EmptyProfile { pid, tid });
    }

    Ok(BucketTimeline {
        label,
        begins: begins.into(),
        ends: ends.into(),
    })
}

/// Label from a `thread_name`/`process_name` metadata event.
fn metadata_label(event: &TraceEvent) -> Option<String> {
    let value = event.args.get("name")?.as_str()?;
    match event.name.as_deref() {
        Some("thread_name") => Some(format!("{} ({})", value, event.tid)),
        Some("process_name") => Some(format!("{} ({})", value, event.pid)),
        _ => None,
    }
}

/// Which queue the merge consumes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextQueue {
    Begin,
    End,
}

/// Merges a bucket's begin/end queues into one call-stack profile.
///
/// The merge consumes both queues from the front in timestamp order.
/// Opening takes precedence over closing at simultaneous instants, and
/// among timestamp-tied closes the one matching the currently open top
/// frame is preferred. Frames still open once both queues drain are
/// force-closed with zero-length leaves at the accumulator's current
/// clock.
pub struct TimelineBuilder {
    begins: VecDeque<TraceEvent>,
    ends: VecDeque<TraceEvent>,
    stack: Vec<Rc<Frame>>,
    frame_cache: HashMap<FrameKey, Rc<Frame>>,
    first_timestamp: f64,
    profile: StackProfileBuilder,
}

impl TimelineBuilder {
    /// Set up the merge over a normalized bucket.
    ///
    /// The earliest pending open anchors relative time at zero; the
    /// normalizer guarantees at least one exists.
    pub fn new(timeline: BucketTimeline, name: impl Into<String>) -> Self {
        let first_timestamp = timeline.begins.front().map(|e| e.ts).unwrap_or(0.0);
        Self {
            begins: timeline.begins,
            ends: timeline.ends,
            stack: Vec::new(),
            frame_cache: HashMap::new(),
            first_timestamp,
            profile: StackProfileBuilder::new(name),
        }
    }

    /// Drain both queues and finalize the bucket's profile.
    ///
    /// **Public** - third pipeline stage
    ///
    /// # Errors
    /// * `ImportError::UnbalancedStack` - a close resolved to a frame that
    ///   was never opened, or arrived with nothing open
    /// * `ImportError::Internal` - queue bookkeeping violated (unreachable
    ///   under the loop guard)
    pub fn run(mut self) -> Result<Profile, ImportError> {
        while !(self.begins.is_empty() && self.ends.is_empty()) {
            match self.next_queue()? {
                NextQueue::Begin => self.open_next(),
                NextQueue::End => self.close_next()?,
            }
        }

        // Frames the trace never closed: zero-length closes at the current
        // clock, innermost first.
        if !self.stack.is_empty() {
            debug!("Force-closing {} unterminated frames", self.stack.len());
        }
        while let Some(frame) = self.stack.pop() {
            let now = self.profile.total_weight();
            self.profile.leave_frame(&frame, now);
        }

        Ok(self.profile.build())
    }

    /// Pick the queue with the earlier head; opens win exact ties.
    fn next_queue(&self) -> Result<NextQueue, ImportError> {
        match (self.begins.front(), self.ends.front()) {
            (None, None) => Err(ImportError::Internal(
                "event queues drained mid-iteration".to_string(),
            )),
            (Some(_), None) => Ok(NextQueue::Begin),
            (None, Some(_)) => Ok(NextQueue::End),
            (Some(begin), Some(end)) => {
                if begin.ts <= end.ts {
                    Ok(NextQueue::Begin)
                } else {
                    Ok(NextQueue::End)
                }
            }
        }
    }

    /// Open the next pending frame.
    fn open_next(&mut self) {
        let Some(event) = self.begins.pop_front() else {
            return;
        };
        let frame = self.frame_for(&event);
        self.profile
            .enter_frame(&frame, event.ts - self.first_timestamp);
        self.stack.push(frame);
    }

    /// Cached frame for an event's argument payload, created on first use.
    fn frame_for(&mut self, event: &TraceEvent) -> Rc<Frame> {
        let key = FrameKey::of_args(&event.args);
        if let Some(frame) = self.frame_cache.get(&key) {
            return Rc::clone(frame);
        }
        let frame = Rc::new(Frame {
            name: format!("{} {}", event.display_name(), key.as_str()),
            key: key.clone(),
        });
        self.frame_cache.insert(key, Rc::clone(&frame));
        frame
    }

    /// Close the next pending frame.
    fn close_next(&mut self) -> Result<(), ImportError> {
        let Some(event) = self.resolve_close() else {
            return Err(ImportError::Internal(
                "close queue drained mid-iteration".to_string(),
            ));
        };

        let key = FrameKey::of_args(&event.args);
        let Some(frame) = self.frame_cache.get(&key).map(Rc::clone) else {
            return Err(ImportError::UnbalancedStack(format!(
                "cannot leave frame \"{}\" that was never entered",
                event.display_name()
            )));
        };

        if self.stack.pop().is_none() {
            return Err(ImportError::UnbalancedStack(format!(
                "cannot leave frame \"{}\" with no open frames",
                event.display_name()
            )));
        }

        self.profile
            .leave_frame(&frame, event.ts - self.first_timestamp);
        Ok(())
    }

    /// Take the next close, preferring the one matching the open top frame.
    ///
    /// Several closes can collide at one timestamp. Within the contiguous
    /// front run sharing the head's timestamp, a close whose identity
    /// equals the top of the stack models "close the most recently opened
    /// matching frame first" and is removed in place of the head.
    fn resolve_close(&mut self) -> Option<TraceEvent> {
        let head_ts = self.ends.front()?.ts;
        if let Some(top) = self.stack.last() {
            let matched = self
                .ends
                .iter()
                .take_while(|e| e.ts == head_ts)
                .position(|e| FrameKey::of_args(&e.args) == top.key);
            if let Some(index) = matched {
                return self.ends.remove(index);
            }
        }
        self.ends.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> TraceEvent {
        serde_json::from_value(value).unwrap()
    }

    fn events(values: serde_json::Value) -> Vec<TraceEvent> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| event(v.clone()))
            .collect()
    }

    #[test]
    fn test_normalize_splits_complete_events() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 5, "ph": "X", "dur": 10, "name": "f"}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();

        assert_eq!(timeline.begins.len(), 1);
        assert_eq!(timeline.ends.len(), 1);
        assert_eq!(timeline.begins[0].ts, 5.0);
        assert_eq!(timeline.begins[0].phase, Phase::Begin);
        assert_eq!(timeline.ends[0].ts, 15.0);
        assert_eq!(timeline.ends[0].phase, Phase::End);
    }

    #[test]
    fn test_normalize_drops_durationless_complete() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "keep"},
            {"pid": 1, "tid": 1, "ts": 5, "ph": "X", "name": "dropme"}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();

        assert_eq!(timeline.begins.len(), 1);
        assert!(timeline.ends.is_empty());
    }

    #[test]
    fn test_normalize_drops_other_phases() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "C", "name": "counter"},
            {"pid": 1, "tid": 1, "ts": 1, "ph": "s", "name": "flow"}
        ]));

        let result = normalize_bucket(1, 1, &bucket);

        assert!(matches!(
            result,
            Err(ImportError::EmptyProfile { pid: 1, tid: 1 })
        ));
    }

    #[test]
    fn test_normalize_sort_is_stable_for_ties() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 3, "ph": "B", "name": "first"},
            {"pid": 1, "tid": 1, "ts": 3, "ph": "B", "name": "second", "args": {"n": 2}}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();

        assert_eq!(timeline.begins[0].display_name(), "first");
        assert_eq!(timeline.begins[1].display_name(), "second");
    }

    #[test]
    fn test_thread_name_label_last_match_wins() {
        let bucket = events(json!([
            {"pid": 1, "tid": 4, "ts": 0, "ph": "M", "name": "thread_name",
             "args": {"name": "Worker"}},
            {"pid": 1, "tid": 4, "ts": 0, "ph": "B", "name": "f"},
            {"pid": 1, "tid": 4, "ts": 1, "ph": "M", "name": "thread_name",
             "args": {"name": "Main"}}
        ]));

        let timeline = normalize_bucket(1, 4, &bucket).unwrap();

        assert_eq!(timeline.label.as_deref(), Some("Main (4)"));
    }

    #[test]
    fn test_process_name_label_uses_pid() {
        let bucket = events(json!([
            {"pid": 9, "tid": 1, "ts": 0, "ph": "M", "name": "process_name",
             "args": {"name": "renderer"}},
            {"pid": 9, "tid": 1, "ts": 0, "ph": "B", "name": "f"}
        ]));

        let timeline = normalize_bucket(9, 1, &bucket).unwrap();

        assert_eq!(timeline.label.as_deref(), Some("renderer (9)"));
    }

    #[test]
    fn test_metadata_without_string_name_ignored() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "M", "name": "thread_name",
             "args": {"name": 42}},
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "f"}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();

        assert!(timeline.label.is_none());
    }

    #[test]
    fn test_lone_end_fails_unbalanced() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "f", "args": {"id": 1}},
            {"pid": 1, "tid": 1, "ts": 2, "ph": "E", "name": "g", "args": {"id": 2}}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let result = TimelineBuilder::new(timeline, "test").run();

        assert!(matches!(result, Err(ImportError::UnbalancedStack(_))));
    }

    #[test]
    fn test_double_close_fails_unbalanced() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "f"},
            {"pid": 1, "tid": 1, "ts": 1, "ph": "E", "name": "f"},
            {"pid": 1, "tid": 1, "ts": 2, "ph": "E", "name": "f"}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let result = TimelineBuilder::new(timeline, "test").run();

        assert!(matches!(result, Err(ImportError::UnbalancedStack(_))));
    }

    #[test]
    fn test_forced_close_of_unterminated_frame() {
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "f"}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let profile = TimelineBuilder::new(timeline, "test").run().unwrap();

        assert_eq!(profile.roots.len(), 1);
        let root = &profile.nodes[profile.roots[0]];
        assert_eq!(root.total_weight, 0.0);
        assert_eq!(profile.total_weight, 0.0);
    }

    #[test]
    fn test_tied_close_prefers_open_top_frame() {
        // h opens first, g second; both close at ts 2 with End(h) queued
        // ahead of End(g). The top of stack is g, so End(g) must resolve
        // first and the result stays well-nested.
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "h", "args": {"fn": "h"}},
            {"pid": 1, "tid": 1, "ts": 1, "ph": "B", "name": "g", "args": {"fn": "g"}},
            {"pid": 1, "tid": 1, "ts": 2, "ph": "E", "name": "h", "args": {"fn": "h"}},
            {"pid": 1, "tid": 1, "ts": 2, "ph": "E", "name": "g", "args": {"fn": "g"}}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let profile = TimelineBuilder::new(timeline, "test").run().unwrap();

        assert_eq!(profile.roots.len(), 1);
        let outer = &profile.nodes[profile.roots[0]];
        assert!(outer.frame.name.starts_with("h "));
        assert_eq!(outer.total_weight, 2.0);
        assert_eq!(outer.children.len(), 1);

        let inner = &profile.nodes[outer.children[0]];
        assert!(inner.frame.name.starts_with("g "));
        assert_eq!(inner.total_weight, 1.0);
    }

    #[test]
    fn test_begin_wins_timestamp_tie_against_end() {
        // All three events share ts 0: both opens must be dequeued before
        // the close, which then resolves against the innermost frame.
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "f", "args": {"fn": "f"}},
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "g", "args": {"fn": "g"}},
            {"pid": 1, "tid": 1, "ts": 0, "ph": "E", "name": "g", "args": {"fn": "g"}}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let profile = TimelineBuilder::new(timeline, "test").run().unwrap();

        assert_eq!(profile.roots.len(), 1);
        let outer = &profile.nodes[profile.roots[0]];
        assert!(outer.frame.name.starts_with("f "));
        assert_eq!(outer.children.len(), 1);
    }

    #[test]
    fn test_frame_identity_is_args_not_name() {
        // Same args under different names: one frame. The close matches
        // the open despite the name change.
        let bucket = events(json!([
            {"pid": 1, "tid": 1, "ts": 0, "ph": "B", "name": "alpha", "args": {"id": 7}},
            {"pid": 1, "tid": 1, "ts": 3, "ph": "E", "name": "beta", "args": {"id": 7}}
        ]));

        let timeline = normalize_bucket(1, 1, &bucket).unwrap();
        let profile = TimelineBuilder::new(timeline, "test").run().unwrap();

        assert_eq!(profile.nodes.len(), 1);
        assert!(profile.nodes[0].frame.name.starts_with("alpha "));
        assert_eq!(profile.nodes[0].total_weight, 3.0);
    }
}
