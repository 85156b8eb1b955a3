// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic doubles for driving the engine without a real platform.
//!
//! - [`RecordingHost`] keeps an in-memory node tree and logs every adapter
//!   call as a [`HostCall`]. Individual operations can be made to fail.
//! - [`ManualIdleScheduler`] queues idle callbacks until a test runs them.
//! - [`FixedDeadline`] and [`CountdownDeadline`] are fake clocks.
//!
//! Available under `cfg(test)` and with the `testing` feature.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::element::{Listener, PropValue, TEXT_VALUE_KEY};
use crate::error::{HostError, HostOp, RenderError};
use crate::host::Host;
use crate::scheduler::{Deadline, IdleCallback, IdleScheduler, WorkStatus};
use crate::time::Duration;

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

/// Handle to a node of a [`RecordingHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestNode(pub u32);

/// One logged adapter call.
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// [`Host::create_node`]; `node` is the handle returned.
    CreateNode {
        /// Created node.
        node: TestNode,
        /// Requested tag.
        tag: String,
    },
    /// [`Host::create_text_node`]; `node` is the handle returned.
    CreateTextNode {
        /// Created node.
        node: TestNode,
        /// Initial value.
        value: String,
    },
    /// [`Host::set_attribute`].
    SetAttribute {
        /// Target node.
        node: TestNode,
        /// Attribute name.
        name: String,
        /// Assigned value.
        value: PropValue,
    },
    /// [`Host::clear_attribute`].
    ClearAttribute {
        /// Target node.
        node: TestNode,
        /// Attribute name.
        name: String,
    },
    /// [`Host::add_event_listener`].
    AddEventListener {
        /// Target node.
        node: TestNode,
        /// Host event name.
        event: String,
        /// Registered listener.
        listener: Listener,
    },
    /// [`Host::remove_event_listener`].
    RemoveEventListener {
        /// Target node.
        node: TestNode,
        /// Host event name.
        event: String,
        /// Unregistered listener.
        listener: Listener,
    },
    /// [`Host::append_child`].
    AppendChild {
        /// New parent.
        parent: TestNode,
        /// Appended node.
        child: TestNode,
    },
    /// [`Host::remove_child`].
    RemoveChild {
        /// Former parent.
        parent: TestNode,
        /// Removed node.
        child: TestNode,
    },
}

impl HostCall {
    /// The operation this call performed.
    #[must_use]
    pub fn op(&self) -> HostOp {
        match self {
            Self::CreateNode { .. } => HostOp::CreateNode,
            Self::CreateTextNode { .. } => HostOp::CreateTextNode,
            Self::SetAttribute { .. } => HostOp::SetAttribute,
            Self::ClearAttribute { .. } => HostOp::ClearAttribute,
            Self::AddEventListener { .. } => HostOp::AddEventListener,
            Self::RemoveEventListener { .. } => HostOp::RemoveEventListener,
            Self::AppendChild { .. } => HostOp::AppendChild,
            Self::RemoveChild { .. } => HostOp::RemoveChild,
        }
    }

    /// Adapter method name of the call.
    #[must_use]
    pub fn op_name(&self) -> &'static str {
        self.op().as_str()
    }

    /// Whether the call changed the shape of the tree.
    #[must_use]
    pub fn is_tree_mutation(&self) -> bool {
        matches!(self, Self::AppendChild { .. } | Self::RemoveChild { .. })
    }

    /// Every node the call read or wrote.
    #[must_use]
    pub fn nodes(&self) -> Vec<TestNode> {
        match self {
            Self::CreateNode { node, .. }
            | Self::CreateTextNode { node, .. }
            | Self::SetAttribute { node, .. }
            | Self::ClearAttribute { node, .. }
            | Self::AddEventListener { node, .. }
            | Self::RemoveEventListener { node, .. } => Vec::from([*node]),
            Self::AppendChild { parent, child } | Self::RemoveChild { parent, child } => {
                Vec::from([*parent, *child])
            }
        }
    }
}

#[derive(Clone, Debug)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    attrs: BTreeMap<String, PropValue>,
    listeners: Vec<(String, Listener)>,
    children: Vec<TestNode>,
    parent: Option<TestNode>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// In-memory [`Host`] that records every call.
///
/// Tree mutations follow DOM rules: appending a node that already has a
/// parent moves it, and removing a node from something other than its parent
/// fails.
#[derive(Default)]
pub struct RecordingHost {
    nodes: Vec<NodeData>,
    calls: Vec<HostCall>,
    // (op, successful calls of that op still allowed before failing)
    failure: Option<(HostOp, usize)>,
}

impl fmt::Debug for RecordingHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHost")
            .field("nodes", &self.nodes.len())
            .field("calls", &self.calls.len())
            .field("failure", &self.failure)
            .finish()
    }
}

impl RecordingHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container node to render into. Not logged.
    pub fn create_container(&mut self) -> TestNode {
        self.alloc(NodeKind::Element(String::from("root")))
    }

    /// Makes the `(skip + 1)`-th subsequent call of `op` fail. Calls that fail
    /// are not logged and change nothing.
    pub fn fail_on(&mut self, op: HostOp, skip: usize) {
        self.failure = Some((op, skip));
    }

    /// Logged calls so far.
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        core::mem::take(&mut self.calls)
    }

    /// Total number of nodes ever created, containers included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Children of `node`, in order.
    #[must_use]
    pub fn children(&self, node: TestNode) -> &[TestNode] {
        &self.data(node).children
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: TestNode) -> Option<TestNode> {
        self.data(node).parent
    }

    /// Tag of an element node.
    #[must_use]
    pub fn tag(&self, node: TestNode) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Value of a text node.
    #[must_use]
    pub fn text(&self, node: TestNode) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Text(value) => Some(value),
            NodeKind::Element(_) => None,
        }
    }

    /// Current value of an attribute.
    #[must_use]
    pub fn attribute(&self, node: TestNode, name: &str) -> Option<&PropValue> {
        self.data(node).attrs.get(name)
    }

    /// Listeners currently registered on `node` for `event`.
    #[must_use]
    pub fn listeners(&self, node: TestNode, event: &str) -> Vec<&Listener> {
        self.data(node)
            .listeners
            .iter()
            .filter(|(e, _)| e == event)
            .map(|(_, l)| l)
            .collect()
    }

    /// Invokes every listener registered on `node` for `event`.
    pub fn dispatch(&self, node: TestNode, event: &str, payload: &dyn Any) {
        for listener in self.listeners(node, event) {
            listener.call(payload);
        }
    }

    /// Serializes the subtree below `node` (excluding `node` itself) as
    /// markup with attributes in key order. Listeners are not shown.
    #[must_use]
    pub fn inner_html(&self, node: TestNode) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: TestNode, out: &mut String) {
        let data = self.data(node);
        match &data.kind {
            NodeKind::Text(value) => out.push_str(value),
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &data.attrs {
                    out.push_str(&format!(" {name}=\"{}\"", display_value(value)));
                }
                out.push('>');
                for &child in &data.children {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> TestNode {
        let id = TestNode(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData::new(kind));
        id
    }

    fn data(&self, node: TestNode) -> &NodeData {
        &self.nodes[node.0 as usize]
    }

    fn data_mut(&mut self, node: TestNode) -> &mut NodeData {
        &mut self.nodes[node.0 as usize]
    }

    fn check(&mut self, op: HostOp) -> Result<(), HostError> {
        match self.failure {
            Some((failing, 0)) if failing == op => {
                self.failure = None;
                Err(HostError::new(op, "injected failure"))
            }
            Some((failing, skip)) if failing == op => {
                self.failure = Some((failing, skip - 1));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn detach(&mut self, child: TestNode) {
        if let Some(parent) = self.data_mut(child).parent.take() {
            self.data_mut(parent).children.retain(|&c| c != child);
        }
    }
}

fn display_value(value: &PropValue) -> String {
    match value {
        PropValue::Str(s) => s.to_string(),
        PropValue::Number(n) => format!("{n}"),
        PropValue::Bool(b) => format!("{b}"),
        PropValue::Listener(l) => format!("{l:?}"),
    }
}

impl Host for RecordingHost {
    type Node = TestNode;

    fn create_node(&mut self, tag: &str) -> Result<TestNode, HostError> {
        self.check(HostOp::CreateNode)?;
        let node = self.alloc(NodeKind::Element(tag.to_string()));
        self.calls.push(HostCall::CreateNode {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self, value: &str) -> Result<TestNode, HostError> {
        self.check(HostOp::CreateTextNode)?;
        let node = self.alloc(NodeKind::Text(value.to_string()));
        self.calls.push(HostCall::CreateTextNode {
            node,
            value: value.to_string(),
        });
        Ok(node)
    }

    fn set_attribute(
        &mut self,
        node: &TestNode,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.check(HostOp::SetAttribute)?;
        let data = self.data_mut(*node);
        match &mut data.kind {
            NodeKind::Text(text) if name == TEXT_VALUE_KEY => *text = display_value(value),
            _ => {
                data.attrs.insert(name.to_string(), value.clone());
            }
        }
        self.calls.push(HostCall::SetAttribute {
            node: *node,
            name: name.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn clear_attribute(&mut self, node: &TestNode, name: &str) -> Result<(), HostError> {
        self.check(HostOp::ClearAttribute)?;
        let data = self.data_mut(*node);
        match &mut data.kind {
            NodeKind::Text(text) if name == TEXT_VALUE_KEY => text.clear(),
            _ => {
                data.attrs.remove(name);
            }
        }
        self.calls.push(HostCall::ClearAttribute {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: &TestNode,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.check(HostOp::AddEventListener)?;
        let listeners = &mut self.data_mut(*node).listeners;
        // Same pair registered twice is a no-op, as in the DOM.
        if !listeners.iter().any(|(e, l)| e == event && l == listener) {
            listeners.push((event.to_string(), listener.clone()));
        }
        self.calls.push(HostCall::AddEventListener {
            node: *node,
            event: event.to_string(),
            listener: listener.clone(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: &TestNode,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.check(HostOp::RemoveEventListener)?;
        self.data_mut(*node)
            .listeners
            .retain(|(e, l)| !(e == event && l == listener));
        self.calls.push(HostCall::RemoveEventListener {
            node: *node,
            event: event.to_string(),
            listener: listener.clone(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &TestNode, child: &TestNode) -> Result<(), HostError> {
        self.check(HostOp::AppendChild)?;
        if parent == child {
            return Err(HostError::new(
                HostOp::AppendChild,
                "cannot append a node to itself",
            ));
        }
        self.detach(*child);
        self.data_mut(*parent).children.push(*child);
        self.data_mut(*child).parent = Some(*parent);
        self.calls.push(HostCall::AppendChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &TestNode, child: &TestNode) -> Result<(), HostError> {
        self.check(HostOp::RemoveChild)?;
        if self.data(*child).parent != Some(*parent) {
            return Err(HostError::new(
                HostOp::RemoveChild,
                format!("{child:?} is not a child of {parent:?}"),
            ));
        }
        self.detach(*child);
        self.calls.push(HostCall::RemoveChild {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Idle scheduling
// ---------------------------------------------------------------------------

/// An [`IdleScheduler`] whose callbacks run only when the test says so.
///
/// Clones share one queue.
#[derive(Clone, Default)]
pub struct ManualIdleScheduler {
    queue: Rc<RefCell<VecDeque<IdleCallback>>>,
}

impl fmt::Debug for ManualIdleScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualIdleScheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl ManualIdleScheduler {
    /// Creates a scheduler with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued callbacks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs the oldest queued callback with `deadline`. Returns `None` if the
    /// queue was empty.
    pub fn run_next(&self, deadline: &dyn Deadline) -> Option<Result<WorkStatus, RenderError>> {
        // Released before the call so the callback can reschedule itself.
        let callback = self.queue.borrow_mut().pop_front()?;
        Some(callback(deadline))
    }

    /// Runs callbacks until the queue is empty, giving each a fresh
    /// `deadline`. Returns the status of the last one.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error.
    pub fn run_until_idle(&self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        let mut last = WorkStatus::Idle;
        while let Some(result) = self.run_next(deadline) {
            last = result?;
        }
        Ok(last)
    }
}

impl IdleScheduler for ManualIdleScheduler {
    fn schedule_idle_work(&self, callback: IdleCallback) {
        self.queue.borrow_mut().push_back(callback);
    }
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

/// A deadline that always reports the same remaining time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDeadline(pub Duration);

impl FixedDeadline {
    /// Never runs out.
    pub const UNBOUNDED: Self = Self(Duration::MAX);
    /// Already run out: the loop yields after every unit.
    pub const EXHAUSTED: Self = Self(Duration::ZERO);
}

impl Deadline for FixedDeadline {
    fn time_remaining(&self) -> Duration {
        self.0
    }
}

/// A deadline that permits a fixed number of work units per slice.
///
/// Each query consumes one unit of budget; once the budget reaches zero every
/// query reports no time left.
#[derive(Debug)]
pub struct CountdownDeadline {
    left: Cell<u32>,
}

impl CountdownDeadline {
    /// Allows `units` work units before the loop yields.
    #[must_use]
    pub fn new(units: u32) -> Self {
        Self {
            left: Cell::new(units),
        }
    }

    /// Remaining budget.
    #[must_use]
    pub fn left(&self) -> u32 {
        self.left.get()
    }
}

impl Deadline for CountdownDeadline {
    fn time_remaining(&self) -> Duration {
        let left = self.left.get().saturating_sub(1);
        self.left.set(left);
        if left == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}

/// Convenience: `Box` an idle callback from a closure.
pub fn idle_callback(
    f: impl FnOnce(&dyn Deadline) -> Result<WorkStatus, RenderError> + 'static,
) -> IdleCallback {
    Box::new(f)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn append_moves_an_attached_node() {
        let mut host = RecordingHost::new();
        let a = host.create_container();
        let b = host.create_container();
        let c = host.create_node("p").unwrap();
        host.append_child(&a, &c).unwrap();
        host.append_child(&b, &c).unwrap();
        assert!(host.children(a).is_empty());
        assert_eq!(host.children(b), &[c]);
        assert_eq!(host.parent(c), Some(b));
    }

    #[test]
    fn remove_requires_the_actual_parent() {
        let mut host = RecordingHost::new();
        let a = host.create_container();
        let c = host.create_node("p").unwrap();
        let err = host.remove_child(&a, &c).unwrap_err();
        assert_eq!(err.op, HostOp::RemoveChild);
    }

    #[test]
    fn text_value_is_a_property_of_text_nodes() {
        let mut host = RecordingHost::new();
        let root = host.create_container();
        let t = host.create_text_node("a").unwrap();
        host.append_child(&root, &t).unwrap();
        host.set_attribute(&t, TEXT_VALUE_KEY, &PropValue::from("b"))
            .unwrap();
        assert_eq!(host.text(t), Some("b"));
        assert_eq!(host.inner_html(root), "b");
    }

    #[test]
    fn inner_html_lists_attributes_in_key_order() {
        let mut host = RecordingHost::new();
        let root = host.create_container();
        let div = host.create_node("div").unwrap();
        host.set_attribute(&div, "title", &PropValue::from("t"))
            .unwrap();
        host.set_attribute(&div, "id", &PropValue::from(3)).unwrap();
        host.append_child(&root, &div).unwrap();
        assert_eq!(host.inner_html(root), "<div id=\"3\" title=\"t\"></div>");
    }

    #[test]
    fn injected_failure_hits_the_requested_call() {
        let mut host = RecordingHost::new();
        host.fail_on(HostOp::CreateNode, 1);
        assert!(host.create_node("a").is_ok());
        let err = host.create_node("b").unwrap_err();
        assert_eq!(err.op, HostOp::CreateNode);
        assert!(host.create_node("c").is_ok());
        assert_eq!(host.calls().len(), 2);
    }

    #[test]
    fn dispatch_reaches_registered_listeners_only() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let listener = Listener::new(move |_| h.set(h.get() + 1));

        let mut host = RecordingHost::new();
        let node = host.create_node("button").unwrap();
        host.add_event_listener(&node, "click", &listener).unwrap();
        host.dispatch(node, "click", &());
        host.dispatch(node, "keydown", &());
        host.remove_event_listener(&node, "click", &listener)
            .unwrap();
        host.dispatch(node, "click", &());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn countdown_allows_the_requested_units() {
        let deadline = CountdownDeadline::new(2);
        assert_eq!(deadline.time_remaining(), Duration::MAX);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
    }

    #[test]
    fn manual_scheduler_runs_in_fifo_order() {
        let order = Rc::new(RefCell::new(vec![]));
        let sched = ManualIdleScheduler::new();
        for i in 0..3 {
            let order = Rc::clone(&order);
            sched.schedule_idle_work(idle_callback(move |_| {
                order.borrow_mut().push(i);
                Ok(WorkStatus::Idle)
            }));
        }
        assert_eq!(sched.pending(), 3);
        sched.run_until_idle(&FixedDeadline::UNBOUNDED).unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert!(sched.run_next(&FixedDeadline::UNBOUNDED).is_none());
    }
}
