//! Profile data structures and the stack-driven profile accumulator.
//!
//! The importer drives a `StackProfileBuilder` with ordered
//! `enter_frame`/`leave_frame` calls and finishes it with `build`. The
//! builder keeps a delta clock: every call advances it to the supplied
//! value, crediting the elapsed delta to the total weight of every open
//! call-tree node and to the self weight of the innermost one.

use serde_json::{Map, Value};
use std::rc::Rc;

/// Stable frame identity, derived from an event's argument payload.
///
/// The key is the canonical serialization of `args` (serde_json maps
/// serialize with sorted keys), so two events with structurally equal
/// arguments always map to the same frame, and two events with differing
/// arguments never collapse even when their names match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey(String);

impl FrameKey {
    /// Derive the identity key for an argument payload.
    pub fn of_args(args: &Map<String, Value>) -> FrameKey {
        FrameKey(Value::Object(args.clone()).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A call-stack node identity with its display label.
///
/// Frames are owned by the per-build frame cache and shared by reference
/// (`Rc`) with stack entries and call-tree nodes. The whole build is
/// single-threaded, so `Rc` rather than `Arc`.
#[derive(Debug)]
pub struct Frame {
    pub key: FrameKey,
    pub name: String,
}

/// One node of a finished call tree.
///
/// Nodes live in the profile's arena vector; `parent` and `children` are
/// indices into it. Weights are in the trace's own time unit, relative to
/// the profile's zero point.
#[derive(Debug, Clone)]
pub struct CallTreeNode {
    pub frame: Rc<Frame>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,

    /// Time spent in this node, children included
    pub total_weight: f64,

    /// Time spent in this node alone
    pub self_weight: f64,
}

/// A finished per-thread profile: a weighted call tree in append order.
#[derive(Debug)]
pub struct Profile {
    pub name: String,
    pub total_weight: f64,
    pub nodes: Vec<CallTreeNode>,
    pub roots: Vec<usize>,
}

impl Profile {
    /// Sum of self weights attributed to the frame with the given key.
    ///
    /// **Public** - convenience for reporting and tests
    pub fn frame_self_weight(&self, key: &FrameKey) -> f64 {
        self.nodes
            .iter()
            .filter(|node| &node.frame.key == key)
            .map(|node| node.self_weight)
            .sum()
    }
}

/// The ordered bundle of all per-bucket profiles from one imported trace.
#[derive(Debug)]
pub struct ProfileGroup {
    pub name: String,
    pub trace_id: String,
    pub active_profile_index: usize,
    pub profiles: Vec<Profile>,
}

/// Accumulates one profile from ordered enter/leave calls.
///
/// Callers must supply values in non-decreasing order, well-nested except
/// that any frames still open may be closed at `total_weight()` to record
/// a zero-length close at the current clock.
pub struct StackProfileBuilder {
    name: String,
    nodes: Vec<CallTreeNode>,
    roots: Vec<usize>,
    stack: Vec<usize>,
    last_value: f64,
}

impl StackProfileBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
            last_value: 0.0,
        }
    }

    /// Advance the clock, crediting the delta to every open node.
    fn advance_to(&mut self, value: f64) {
        let delta = (value - self.last_value).max(0.0);
        if delta > 0.0 {
            for &index in &self.stack {
                self.nodes[index].total_weight += delta;
            }
            if let Some(&top) = self.stack.last() {
                self.nodes[top].self_weight += delta;
            }
        }
        self.last_value = self.last_value.max(value);
    }

    /// Open a frame at the given relative time.
    ///
    /// Appends a fresh call-tree node under the currently innermost open
    /// node (or as a new root) and makes it the innermost.
    pub fn enter_frame(&mut self, frame: &Rc<Frame>, value: f64) {
        self.advance_to(value);

        let parent = self.stack.last().copied();
        let index = self.nodes.len();
        self.nodes.push(CallTreeNode {
            frame: Rc::clone(frame),
            parent,
            children: Vec::new(),
            total_weight: 0.0,
            self_weight: 0.0,
        });

        match parent {
            Some(p) => self.nodes[p].children.push(index),
            None => self.roots.push(index),
        }

        self.stack.push(index);
    }

    /// Close the innermost open frame at the given relative time.
    pub fn leave_frame(&mut self, _frame: &Rc<Frame>, value: f64) {
        self.advance_to(value);
        self.stack.pop();
    }

    /// Current clock value: the total weight accumulated so far.
    pub fn total_weight(&self) -> f64 {
        self.last_value
    }

    /// Finalize the profile.
    pub fn build(mut self) -> Profile {
        self.stack.clear();
        Profile {
            name: self.name,
            total_weight: self.last_value,
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}
