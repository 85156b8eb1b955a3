// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The incremental reconciler and its work loop.
//!
//! A [`Reconciler`] owns one root: the host adapter, the fiber store, the
//! committed tree and, while a render is in flight, the work-in-progress
//! tree together with the fiber to resume from.
//!
//! A render goes through three steps:
//!
//! 1. [`Reconciler::render`] creates a fresh work-in-progress root whose only
//!    child is the requested element and whose `alternate` is the committed
//!    root.
//! 2. [`Reconciler::work_loop`] performs units of work until the deadline
//!    runs short or the tree is complete. Each unit creates the fiber's host
//!    node if needed, diffs its children against the previous tree by
//!    position, and picks the next fiber in pre-order.
//! 3. When no unit remains, the same call commits (see [`crate::commit`]).
//!
//! A render requested while another is still building replaces it; the
//! unfinished tree is dropped without touching the host tree.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::commit::{self, CommitStats};
use crate::element::{Element, PropValue, Props, TEXT_VALUE_KEY};
use crate::error::{ConfigurationError, RenderError};
use crate::fiber::{EffectTag, FiberId, FiberStore, FiberType};
use crate::host::Host;
use crate::props::{update_dom, validate_props};
use crate::scheduler::{Deadline, Unbounded, WorkLoopConfig, WorkStatus};
use crate::trace::{
    CommitEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RenderAbandonedEvent,
    RenderErrorEvent, RenderStartEvent, Tracer, YieldEvent,
};

/// Incremental renderer for one root container.
pub struct Reconciler<H: Host> {
    host: H,
    store: FiberStore<H::Node>,
    config: WorkLoopConfig,
    current_root: Option<FiberId>,
    wip_root: Option<FiberId>,
    next_unit: Option<FiberId>,
    deletions: Vec<FiberId>,
    render_index: u64,
    slices: u32,
    units: u64,
}

impl<H: Host> core::fmt::Debug for Reconciler<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("current_root", &self.current_root)
            .field("wip_root", &self.wip_root)
            .field("next_unit", &self.next_unit)
            .field("deletions", &self.deletions.len())
            .field("render_index", &self.render_index)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Reconciler<H> {
    /// Creates a reconciler with the default [`WorkLoopConfig`].
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_config(host, WorkLoopConfig::default())
    }

    /// Creates a reconciler with the given configuration.
    #[must_use]
    pub fn with_config(host: H, config: WorkLoopConfig) -> Self {
        Self {
            host,
            store: FiberStore::new(),
            config,
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            render_index: 0,
            slices: 0,
            units: 0,
        }
    }

    // -- Accessors --

    /// The host adapter.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host adapter, mutably. Mutating nodes the engine owns between
    /// renders makes later diffs inaccurate.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The fiber store.
    #[must_use]
    pub fn store(&self) -> &FiberStore<H::Node> {
        &self.store
    }

    /// The work loop configuration.
    #[must_use]
    pub fn config(&self) -> WorkLoopConfig {
        self.config
    }

    /// Replaces the work loop configuration. Takes effect on the next unit.
    pub fn set_config(&mut self, config: WorkLoopConfig) {
        self.config = config;
    }

    /// Root of the last committed tree.
    #[must_use]
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built, if a render is in flight.
    #[must_use]
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// The fiber the next call to the work loop resumes from.
    #[must_use]
    pub fn next_unit(&self) -> Option<FiberId> {
        self.next_unit
    }

    /// Whether a render is waiting to be built or committed.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some()
    }

    /// Counter of the most recent render request.
    #[must_use]
    pub fn render_index(&self) -> u64 {
        self.render_index
    }

    // -- Rendering --

    /// Requests that `container` come to hold exactly `element`.
    ///
    /// No host call is made here; the work happens in
    /// [`work_loop`](Self::work_loop). A build still in flight is dropped.
    ///
    /// If `container` is not the container of the committed tree, nothing is
    /// diffed against that tree: the new tree is built from scratch and the
    /// committed one is removed from its old container when the new tree
    /// commits.
    pub fn render(&mut self, element: Element, container: H::Node) {
        self.render_traced(element, container, &mut Tracer::none());
    }

    /// [`render`](Self::render) with tracing.
    pub fn render_traced(&mut self, element: Element, container: H::Node, tracer: &mut Tracer<'_>) {
        if let Some(abandoned) = self.wip_root {
            let freed_fibers = self.store.pre_order(abandoned).count();
            tracer.render_abandoned(&RenderAbandonedEvent {
                render_index: self.render_index,
                units: self.units,
                freed_fibers,
            });
            self.discard_wip();
        }

        self.render_index += 1;
        self.slices = 0;
        self.units = 0;
        self.deletions.clear();

        let alternate = match self.current_root {
            Some(current) if self.store.dom(current) == Some(&container) => Some(current),
            Some(current) => {
                // Moving to another container: retire the whole committed tree.
                let retired: Vec<FiberId> = self.store.children(current).collect();
                for old in retired {
                    self.store.set_effect(old, EffectTag::Deletion);
                    self.deletions.push(old);
                }
                None
            }
            None => None,
        };

        let mut props = Props::new();
        props.push_child(element);
        let root = self.store.create_fiber(FiberType::Root, Rc::new(props));
        self.store.set_dom(root, container);
        self.store.set_alternate(root, alternate);

        self.wip_root = Some(root);
        self.next_unit = Some(root);

        tracer.render_start(&RenderStartEvent {
            render_index: self.render_index,
            has_current: alternate.is_some(),
        });
    }

    /// Performs units of work until `deadline` runs short, committing once
    /// the build is complete.
    ///
    /// At least one unit is performed per call. The deadline is consulted
    /// after every unit; with less than
    /// [`yield_threshold`](WorkLoopConfig::yield_threshold) remaining the call
    /// returns [`WorkStatus::Yielded`].
    ///
    /// # Errors
    ///
    /// Any error aborts the render: the work-in-progress tree is freed and
    /// the committed tree stays current. An error during commit leaves the
    /// host tree with the mutations applied before it.
    pub fn work_loop(&mut self, deadline: &dyn Deadline) -> Result<WorkStatus, RenderError> {
        self.work_loop_traced(deadline, &mut Tracer::none())
    }

    /// [`work_loop`](Self::work_loop) with tracing.
    ///
    /// # Errors
    ///
    /// See [`work_loop`](Self::work_loop).
    pub fn work_loop_traced(
        &mut self,
        deadline: &dyn Deadline,
        tracer: &mut Tracer<'_>,
    ) -> Result<WorkStatus, RenderError> {
        let Some(wip_root) = self.wip_root else {
            return Ok(WorkStatus::Idle);
        };

        if let Some(first) = self.next_unit {
            self.slices += 1;
            tracer.phase_begin(&PhaseBeginEvent {
                render_index: self.render_index,
                phase: PhaseKind::Build,
            });
            let mut units = 0_u32;
            let mut unit = first;
            loop {
                let next = match self.perform_unit_of_work(unit) {
                    Ok(next) => next,
                    Err(err) => return Err(self.abort(err, PhaseKind::Build, tracer)),
                };
                units += 1;
                self.units += 1;
                self.next_unit = next;
                let Some(next) = next else {
                    break;
                };
                let remaining = deadline.time_remaining();
                if self.config.should_yield(remaining) {
                    self.end_build(units, tracer);
                    tracer.yielded(&YieldEvent {
                        render_index: self.render_index,
                        units,
                        total_units: self.units,
                        remaining,
                    });
                    return Ok(WorkStatus::Yielded);
                }
                unit = next;
            }
            self.end_build(units, tracer);
        }

        tracer.phase_begin(&PhaseBeginEvent {
            render_index: self.render_index,
            phase: PhaseKind::Commit,
        });
        let stats = match commit::commit_root(
            &mut self.host,
            &self.store,
            wip_root,
            &self.deletions,
            self.render_index,
            tracer,
        ) {
            Ok(stats) => stats,
            Err(err) => return Err(self.abort(err, PhaseKind::Commit, tracer)),
        };
        commit::promote(&mut self.store, wip_root, self.current_root);
        self.current_root = Some(wip_root);
        self.wip_root = None;
        self.deletions.clear();

        tracer.phase_end(&PhaseEndEvent {
            render_index: self.render_index,
            phase: PhaseKind::Commit,
            units: 0,
        });
        tracer.commit(&CommitEvent {
            render_index: self.render_index,
            stats,
            slices: self.slices,
            total_units: self.units,
            live_fibers: self.store.live_count(),
        });
        Ok(WorkStatus::Committed(stats))
    }

    /// Runs the work loop with no deadline until the pending render, if any,
    /// is committed.
    ///
    /// # Errors
    ///
    /// See [`work_loop`](Self::work_loop).
    pub fn flush(&mut self) -> Result<Option<CommitStats>, RenderError> {
        loop {
            match self.work_loop(&Unbounded)? {
                WorkStatus::Idle => return Ok(None),
                WorkStatus::Committed(stats) => return Ok(Some(stats)),
                // An unbounded deadline never triggers a yield.
                WorkStatus::Yielded => {}
            }
        }
    }

    // -- Work units --

    /// Builds one fiber and returns the next one in pre-order.
    ///
    /// Creates the host node if the fiber has none (a text node from
    /// `nodeValue`, or a typed node followed by an initial prop pass), then
    /// reconciles the fiber's element children.
    ///
    /// # Errors
    ///
    /// Fails if a prop is malformed (for updated fibers too), the tag is not
    /// a valid node type, or the host fails to create or initialize the node.
    pub fn perform_unit_of_work(&mut self, fiber: FiberId) -> Result<Option<FiberId>, RenderError> {
        // Every fiber, reused or new, is checked here so that commit never
        // meets a malformed prop after it has started mutating the host.
        validate_props(self.store.props(fiber))?;
        if self.store.dom(fiber).is_none() {
            let node = self.create_node(fiber)?;
            self.store.set_dom(fiber, node);
        }

        let props = Rc::clone(self.store.props(fiber));
        self.reconcile_children(fiber, props.children());

        if let Some(child) = self.store.child(fiber) {
            return Ok(Some(child));
        }
        let mut cur = Some(fiber);
        while let Some(f) = cur {
            if let Some(sibling) = self.store.sibling(f) {
                return Ok(Some(sibling));
            }
            cur = self.store.parent(f);
        }
        Ok(None)
    }

    /// Diffs `elements` against the children of the fiber's alternate, by
    /// position, and links the resulting fibers under `wip`.
    ///
    /// Matching types at the same index yield an [`EffectTag::Update`] fiber
    /// sharing the old host node. Otherwise a new element yields an
    /// [`EffectTag::Placement`] fiber and an old fiber is tagged
    /// [`EffectTag::Deletion`] and queued for commit.
    pub fn reconcile_children(&mut self, wip: FiberId, elements: &[Element]) {
        let mut old = self
            .store
            .alternate(wip)
            .and_then(|alt| self.store.child(alt));
        let mut prev: Option<FiberId> = None;
        let mut index = 0;

        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let produced = match (element, old) {
                (Some(element), Some(old_fiber))
                    if self.store.ty(old_fiber).matches(element.ty()) =>
                {
                    Some(self.update_fiber(element, old_fiber))
                }
                (element, old_fiber) => {
                    if let Some(old_fiber) = old_fiber {
                        self.store.set_effect(old_fiber, EffectTag::Deletion);
                        self.deletions.push(old_fiber);
                    }
                    element.map(|element| self.placement_fiber(element))
                }
            };

            if let Some(o) = old {
                old = self.store.sibling(o);
            }
            if let Some(fiber) = produced {
                match prev {
                    None => self.store.set_first_child(wip, fiber),
                    Some(p) => self.store.set_next_sibling(p, fiber),
                }
                prev = Some(fiber);
            }
            index += 1;
        }
    }

    fn update_fiber(&mut self, element: &Element, old: FiberId) -> FiberId {
        let fiber = self
            .store
            .create_fiber(FiberType::from(element.ty()), Rc::clone(element.props()));
        if let Some(node) = self.store.dom(old).cloned() {
            self.store.set_dom(fiber, node);
        }
        self.store.set_alternate(fiber, Some(old));
        self.store.set_effect(fiber, EffectTag::Update);
        fiber
    }

    fn placement_fiber(&mut self, element: &Element) -> FiberId {
        let fiber = self
            .store
            .create_fiber(FiberType::from(element.ty()), Rc::clone(element.props()));
        self.store.set_effect(fiber, EffectTag::Placement);
        fiber
    }

    fn create_node(&mut self, fiber: FiberId) -> Result<H::Node, RenderError> {
        let props = Rc::clone(self.store.props(fiber));
        match self.store.ty(fiber) {
            FiberType::Text => {
                let value = props
                    .get(TEXT_VALUE_KEY)
                    .and_then(PropValue::as_str)
                    .unwrap_or_default();
                Ok(self.host.create_text_node(value)?)
            }
            FiberType::Tag(tag) => {
                validate_tag(tag)?;
                let node = self.host.create_node(tag)?;
                update_dom(&mut self.host, &node, &Props::new(), &props)?;
                Ok(node)
            }
            // Roots get the container at render time.
            FiberType::Root => Err(RenderError::DetachedFiber { fiber }),
        }
    }

    // -- Abort paths --

    fn discard_wip(&mut self) {
        if let Some(wip) = self.wip_root.take() {
            self.store.free_tree(wip);
        }
        self.next_unit = None;
        for old in self.deletions.drain(..) {
            self.store.clear_effect(old);
        }
    }

    fn end_build(&mut self, units: u32, tracer: &mut Tracer<'_>) {
        tracer.phase_end(&PhaseEndEvent {
            render_index: self.render_index,
            phase: PhaseKind::Build,
            units,
        });
    }

    fn abort(&mut self, err: RenderError, phase: PhaseKind, tracer: &mut Tracer<'_>) -> RenderError {
        self.discard_wip();
        tracer.render_error(&RenderErrorEvent {
            render_index: self.render_index,
            phase,
            error: &err,
        });
        err
    }
}

/// Accepts ASCII alphanumerics and `-`, starting with a letter.
fn validate_tag(tag: &str) -> Result<(), ConfigurationError> {
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigurationError::EmptyTag);
    };
    if first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidTag { tag: tag.into() })
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::element::Listener;
    use crate::error::HostOp;
    use crate::testing::{CountdownDeadline, FixedDeadline, HostCall, RecordingHost, TestNode};

    fn setup() -> (Reconciler<RecordingHost>, TestNode) {
        let mut r = Reconciler::new(RecordingHost::new());
        let container = r.host_mut().create_container();
        (r, container)
    }

    fn commit(r: &mut Reconciler<RecordingHost>, element: Element, container: TestNode) -> CommitStats {
        r.render(element, container);
        r.flush().unwrap().expect("render was pending")
    }

    fn created(calls: &[HostCall]) -> Vec<TestNode> {
        calls
            .iter()
            .filter_map(|call| match call {
                HostCall::CreateNode { node, .. } | HostCall::CreateTextNode { node, .. } => {
                    Some(*node)
                }
                _ => None,
            })
            .collect()
    }

    fn list(items: &[&'static str]) -> Element {
        Element::new("ul").children(items.iter().map(|&item| Element::new("li").text_child(item)))
    }

    #[test]
    fn first_render_builds_and_attaches_the_tree() {
        let (mut r, container) = setup();
        let stats = commit(&mut r, list(&["a", "b"]), container);
        assert_eq!(
            stats,
            CommitStats {
                placements: 5,
                updates: 0,
                deletions: 0
            }
        );
        assert_eq!(r.host().inner_html(container), "<ul><li>a</li><li>b</li></ul>");
        assert!(!r.has_pending_work());
    }

    #[test]
    fn rendering_an_equal_tree_issues_no_host_calls() {
        let (mut r, container) = setup();
        let tree = || Element::new("div").attr("id", "app").child(Element::new("p").text_child("x"));
        commit(&mut r, tree(), container);
        r.host_mut().take_calls();

        let stats = commit(&mut r, tree(), container);
        assert!(r.host_mut().take_calls().is_empty());
        assert_eq!(stats.updates, 3);
        assert_eq!(stats.placements + stats.deletions, 0);
    }

    #[test]
    fn changed_text_updates_the_existing_text_node() {
        let (mut r, container) = setup();
        commit(&mut r, Element::new("p").text_child("a"), container);
        let p = r.host().children(container)[0];
        let text = r.host().children(p)[0];
        r.host_mut().take_calls();

        commit(&mut r, Element::new("p").text_child("b"), container);
        assert_eq!(
            r.host_mut().take_calls(),
            vec![HostCall::SetAttribute {
                node: text,
                name: String::from(TEXT_VALUE_KEY),
                value: PropValue::from("b"),
            }]
        );
        assert_eq!(r.host().children(p), &[text]);
        assert_eq!(r.host().text(text), Some("b"));
    }

    #[test]
    fn text_nodes_skip_the_initial_prop_pass() {
        let (mut r, container) = setup();
        r.render(Element::text("hi"), container);
        r.flush().unwrap();
        let calls = r.host_mut().take_calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], HostCall::CreateTextNode { value, .. } if value == "hi"));
        assert!(matches!(calls[1], HostCall::AppendChild { .. }));
    }

    #[test]
    fn same_length_update_keeps_every_node() {
        let (mut r, container) = setup();
        commit(
            &mut r,
            Element::new("ul")
                .child(Element::new("li").attr("class", "x"))
                .child(Element::new("li").attr("class", "y")),
            container,
        );
        let ul = r.host().children(container)[0];
        let before = r.host().children(ul).to_vec();
        r.host_mut().take_calls();

        commit(
            &mut r,
            Element::new("ul")
                .child(Element::new("li").attr("class", "y"))
                .child(Element::new("li").attr("class", "z")),
            container,
        );
        let calls = r.host_mut().take_calls();
        assert!(calls.iter().all(|c| c.op() == HostOp::SetAttribute));
        assert_eq!(calls.len(), 2);
        assert_eq!(r.host().children(ul), before.as_slice());
        assert_eq!(
            r.host().inner_html(container),
            "<ul><li class=\"y\"></li><li class=\"z\"></li></ul>"
        );
    }

    #[test]
    fn type_swap_replaces_the_node() {
        let (mut r, container) = setup();
        commit(&mut r, Element::new("div").child(Element::new("p")), container);
        let div = r.host().children(container)[0];
        let p = r.host().children(div)[0];
        r.host_mut().take_calls();

        let stats = commit(&mut r, Element::new("div").child(Element::new("span")), container);
        let calls = r.host_mut().take_calls();
        let span = created(&calls)[0];
        assert_eq!(
            calls,
            vec![
                HostCall::CreateNode {
                    node: span,
                    tag: String::from("span"),
                },
                HostCall::RemoveChild {
                    parent: div,
                    child: p
                },
                HostCall::AppendChild {
                    parent: div,
                    child: span
                },
            ]
        );
        assert_eq!(
            stats,
            CommitStats {
                placements: 1,
                updates: 1,
                deletions: 1
            }
        );
        assert_eq!(r.host().parent(p), None);
    }

    #[test]
    fn growth_appends_new_children_in_order() {
        let (mut r, container) = setup();
        commit(&mut r, list(&["a"]), container);
        let stats = commit(&mut r, list(&["a", "b", "c"]), container);
        // Two `li` and their text nodes.
        assert_eq!(stats.placements, 4);
        assert_eq!(stats.deletions, 0);
        assert_eq!(
            r.host().inner_html(container),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );
    }

    #[test]
    fn shrink_removes_trailing_children() {
        let (mut r, container) = setup();
        commit(&mut r, list(&["a", "b", "c"]), container);
        let ul = r.host().children(container)[0];
        let gone = r.host().children(ul)[1..].to_vec();
        r.host_mut().take_calls();

        let stats = commit(&mut r, list(&["a"]), container);
        assert_eq!(stats.deletions, 2);
        let removed: Vec<TestNode> = r
            .host_mut()
            .take_calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::RemoveChild { parent, child } if parent == ul => Some(child),
                _ => None,
            })
            .collect();
        assert_eq!(removed, gone);
        assert_eq!(r.host().inner_html(container), "<ul><li>a</li></ul>");
    }

    #[test]
    fn replaced_listener_is_rebound() {
        use core::cell::Cell;

        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let f1 = {
            let first = Rc::clone(&first);
            Listener::new(move |_| first.set(first.get() + 1))
        };
        let f2 = {
            let second = Rc::clone(&second);
            Listener::new(move |_| second.set(second.get() + 1))
        };

        let (mut r, container) = setup();
        commit(&mut r, Element::new("button").on("click", f1.clone()), container);
        let button = r.host().children(container)[0];
        r.host_mut().take_calls();

        commit(&mut r, Element::new("button").on("click", f2.clone()), container);
        assert_eq!(
            r.host_mut().take_calls(),
            vec![
                HostCall::RemoveEventListener {
                    node: button,
                    event: String::from("click"),
                    listener: f1,
                },
                HostCall::AddEventListener {
                    node: button,
                    event: String::from("click"),
                    listener: f2,
                },
            ]
        );
        r.host().dispatch(button, "click", &());
        assert_eq!((first.get(), second.get()), (0, 1));
    }

    #[test]
    fn dropped_attribute_is_cleared() {
        let (mut r, container) = setup();
        commit(&mut r, Element::new("div").attr("title", "x"), container);
        let div = r.host().children(container)[0];
        r.host_mut().take_calls();

        commit(&mut r, Element::new("div"), container);
        assert_eq!(
            r.host_mut().take_calls(),
            vec![HostCall::ClearAttribute {
                node: div,
                name: String::from("title"),
            }]
        );
        assert_eq!(r.host().attribute(div, "title"), None);
    }

    #[test]
    fn build_never_touches_attached_nodes() {
        let (mut r, container) = setup();
        commit(
            &mut r,
            Element::new("div")
                .attr("title", "old")
                .child(Element::new("p").text_child("one")),
            container,
        );
        let mut attached = created(&r.host_mut().take_calls());
        attached.push(container);

        r.render(
            Element::new("div")
                .attr("title", "new")
                .child(Element::new("span").attr("class", "c"))
                .child(Element::new("p").text_child("two")),
            container,
        );
        loop {
            let status = r.work_loop(&CountdownDeadline::new(1)).unwrap();
            if let WorkStatus::Committed(_) = status {
                break;
            }
            for call in r.host_mut().take_calls() {
                assert!(!call.is_tree_mutation(), "mutation during build: {call:?}");
                assert!(
                    call.nodes().iter().all(|n| !attached.contains(n)),
                    "attached node touched during build: {call:?}"
                );
            }
        }
        assert_eq!(
            r.host().inner_html(container),
            "<div title=\"new\"><span class=\"c\"></span><p>two</p></div>"
        );
    }

    #[test]
    fn work_resumes_where_it_yielded() {
        let (mut r, container) = setup();
        r.render(
            Element::new("div")
                .child(Element::new("p"))
                .child(Element::new("p")),
            container,
        );

        let mut seen = Vec::new();
        let stats = loop {
            seen.push(r.next_unit().expect("work pending"));
            match r.work_loop(&FixedDeadline::EXHAUSTED).unwrap() {
                WorkStatus::Yielded => assert!(r.host().children(container).is_empty()),
                WorkStatus::Committed(stats) => break stats,
                WorkStatus::Idle => panic!("render went missing"),
            }
        };
        // root, div, p, p: one unit per slice, all distinct.
        assert_eq!(seen.len(), 4);
        seen.dedup();
        assert_eq!(seen.len(), 4);
        assert_eq!(stats.placements, 3);
        assert_eq!(r.work_loop(&FixedDeadline::EXHAUSTED), Ok(WorkStatus::Idle));
    }

    #[test]
    fn units_run_in_pre_order() {
        let (mut r, container) = setup();
        r.render(
            Element::new("div")
                .child(Element::new("p").child(Element::new("span")))
                .child(Element::new("i")),
            container,
        );

        let mut order = Vec::new();
        let mut unit = r.next_unit();
        while let Some(fiber) = unit {
            unit = r.perform_unit_of_work(fiber).unwrap();
            order.push(match r.store().ty(fiber) {
                FiberType::Root => "root",
                FiberType::Tag(tag) => match tag.as_ref() {
                    "div" => "div",
                    "p" => "p",
                    "span" => "span",
                    "i" => "i",
                    _ => "?",
                },
                FiberType::Text => "text",
            });
        }
        assert_eq!(order, ["root", "div", "p", "span", "i"]);
        // Nodes exist but nothing is attached before commit.
        assert!(r.host().children(container).is_empty());
        assert_eq!(r.host().node_count(), 5);
    }

    #[test]
    fn immediate_config_never_yields() {
        let mut r = Reconciler::with_config(RecordingHost::new(), WorkLoopConfig::immediate());
        let container = r.host_mut().create_container();
        r.render(list(&["a", "b", "c"]), container);
        let status = r.work_loop(&FixedDeadline::EXHAUSTED).unwrap();
        assert!(matches!(status, WorkStatus::Committed(_)));
    }

    #[test]
    fn latest_render_wins() {
        let (mut r, container) = setup();
        r.render(list(&["a", "b"]), container);
        assert_eq!(
            r.work_loop(&CountdownDeadline::new(2)),
            Ok(WorkStatus::Yielded)
        );

        r.render(Element::new("p").text_child("b"), container);
        r.flush().unwrap();

        let calls = r.host_mut().take_calls();
        let mutations: Vec<&HostCall> = calls.iter().filter(|c| c.is_tree_mutation()).collect();
        // Only the second tree's `p` and its text are attached.
        assert_eq!(mutations.len(), 2);
        assert_eq!(r.host().inner_html(container), "<p>b</p>");
        assert_eq!(r.store().live_count(), 3);
    }

    #[test]
    fn build_error_keeps_the_committed_tree() {
        let (mut r, container) = setup();
        commit(&mut r, list(&["a"]), container);
        let current = r.current_root();
        let live = r.store().live_count();

        r.render(
            Element::new("ul").child(Element::new("li").child(Element::new("bad tag"))),
            container,
        );
        let err = r.flush().unwrap_err();
        assert_eq!(
            err,
            RenderError::Configuration(ConfigurationError::InvalidTag {
                tag: String::from("bad tag")
            })
        );
        assert_eq!(r.current_root(), current);
        assert!(!r.has_pending_work());
        assert_eq!(r.store().live_count(), live);
        assert_eq!(r.host().inner_html(container), "<ul><li>a</li></ul>");
    }

    #[test]
    fn empty_tag_is_a_configuration_error() {
        let (mut r, container) = setup();
        r.render(Element::new(""), container);
        assert_eq!(
            r.flush(),
            Err(RenderError::Configuration(ConfigurationError::EmptyTag))
        );
    }

    #[test]
    fn malformed_prop_aborts_the_render() {
        let (mut r, container) = setup();
        r.render(Element::new("a").attr("onClick", "nope"), container);
        assert!(matches!(r.flush(), Err(RenderError::InvalidProp { .. })));
        assert!(r.host().children(container).is_empty());
    }

    #[test]
    fn commit_failure_leaves_the_previous_tree_current() {
        let (mut r, container) = setup();
        commit(&mut r, Element::new("div"), container);
        let current = r.current_root();

        r.host_mut().fail_on(HostOp::AppendChild, 0);
        r.render(Element::new("div").child(Element::new("span")), container);
        let err = r.flush().unwrap_err();
        assert!(matches!(err, RenderError::Host(ref e) if e.op == HostOp::AppendChild));
        assert_eq!(r.current_root(), current);
        assert_eq!(r.store().live_count(), 2);

        commit(&mut r, Element::new("div").child(Element::new("span")), container);
        assert_eq!(r.host().inner_html(container), "<div><span></span></div>");
    }

    #[test]
    fn commit_failing_partway_keeps_the_store_on_the_previous_tree() {
        let (mut r, container) = setup();
        commit(&mut r, list(&["a", "b", "c", "d"]), container);
        let current = r.current_root().expect("committed");
        let old: Vec<FiberId> = r.store().pre_order(current).collect();
        // root, ul, four li, four text
        assert_eq!(old.len(), 10);

        // The first of three removals succeeds, the second fails.
        r.host_mut().fail_on(HostOp::RemoveChild, 1);
        r.render(list(&["a"]), container);
        let err = r.flush().unwrap_err();
        assert!(matches!(err, RenderError::Host(ref e) if e.op == HostOp::RemoveChild));

        assert_eq!(r.current_root(), Some(current));
        assert!(!r.has_pending_work());
        assert_eq!(r.store().live_count(), old.len());
        assert!(old.iter().all(|&f| r.store().is_alive(f)));
        assert!(old.iter().all(|&f| r.store().effect(f).is_none()));
        assert_eq!(r.store().pre_order(current).collect::<Vec<_>>(), old);

        // Removals applied before the failure stay applied.
        assert_eq!(
            r.host().inner_html(container),
            "<ul><li>a</li><li>c</li><li>d</li></ul>"
        );
    }

    #[test]
    fn malformed_prop_on_an_updated_parent_leaves_the_host_untouched() {
        let (mut r, container) = setup();
        commit(&mut r, list(&["a", "b", "c"]), container);
        let current = r.current_root();
        let live = r.store().live_count();
        r.host_mut().take_calls();

        r.render(
            Element::new("ul")
                .attr("onClick", "nope")
                .child(Element::new("li").text_child("a")),
            container,
        );
        assert!(matches!(r.flush(), Err(RenderError::InvalidProp { .. })));
        assert!(r.host_mut().take_calls().is_empty());
        assert_eq!(
            r.host().inner_html(container),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );
        assert_eq!(r.current_root(), current);
        assert_eq!(r.store().live_count(), live);

        let stats = commit(&mut r, list(&["a"]), container);
        assert_eq!(stats.deletions, 2);
        assert_eq!(r.host().inner_html(container), "<ul><li>a</li></ul>");
    }

    #[test]
    fn rendering_into_another_container_moves_the_tree() {
        let (mut r, first) = setup();
        let second = r.host_mut().create_container();
        commit(&mut r, Element::new("div"), first);

        let stats = commit(&mut r, Element::new("div").attr("id", "b"), second);
        assert_eq!(stats.placements, 1);
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.updates, 0);
        assert_eq!(r.host().inner_html(first), "");
        assert_eq!(r.host().inner_html(second), "<div id=\"b\"></div>");
        // root and div
        assert_eq!(r.store().live_count(), 2);

        // Back again, now diffed against the tree in `second`.
        commit(&mut r, Element::new("p"), first);
        commit(&mut r, Element::new("p").attr("id", "c"), first);
        assert_eq!(r.host().inner_html(second), "");
        assert_eq!(r.host().inner_html(first), "<p id=\"c\"></p>");
    }

    #[test]
    fn failed_move_keeps_the_tree_in_its_container() {
        let (mut r, first) = setup();
        let second = r.host_mut().create_container();
        commit(&mut r, list(&["a"]), first);
        let current = r.current_root().expect("committed");

        r.render(Element::new("bad tag"), second);
        assert!(r.flush().is_err());
        assert_eq!(r.current_root(), Some(current));
        assert!(r.store().pre_order(current).all(|f| r.store().effect(f).is_none()));

        commit(&mut r, list(&["b"]), first);
        assert_eq!(r.host().inner_html(first), "<ul><li>b</li></ul>");
    }

    #[test]
    fn arena_holds_only_the_current_tree_between_renders() {
        let (mut r, container) = setup();
        for i in 0..6 {
            if i % 2 == 0 {
                commit(&mut r, list(&["a", "b"]), container);
                // root, ul, two li, two text
                assert_eq!(r.store().live_count(), 6);
            } else {
                commit(&mut r, list(&["a"]), container);
                assert_eq!(r.store().live_count(), 4);
            }
        }
        let root = r.current_root().expect("committed");
        assert!(r.store().pre_order(root).all(|f| r.store().alternate(f).is_none()));
    }

    #[test]
    fn container_children_outside_the_tree_are_left_alone() {
        let (mut r, container) = setup();
        let foreign = r.host_mut().create_node("aside").unwrap();
        r.host_mut().append_child(&container, &foreign).unwrap();

        commit(&mut r, Element::new("main"), container);
        commit(&mut r, Element::new("footer"), container);
        assert_eq!(
            r.host().inner_html(container),
            "<aside></aside><footer></footer>"
        );
    }

    #[test]
    fn tag_validation() {
        assert!(validate_tag("div").is_ok());
        assert!(validate_tag("my-widget").is_ok());
        assert!(validate_tag("h1").is_ok());
        assert_eq!(validate_tag(""), Err(ConfigurationError::EmptyTag));
        assert!(validate_tag("1div").is_err());
        assert!(validate_tag("a b").is_err());
        assert!(validate_tag("<script>").is_err());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn trace_events_follow_the_render() {
        use crate::trace::{
            CommitEvent, PhaseBeginEvent, RenderAbandonedEvent, RenderStartEvent, TraceSink,
            YieldEvent,
        };

        #[derive(Default)]
        struct Log(Vec<&'static str>);
        impl TraceSink for Log {
            fn on_render_start(&mut self, _: &RenderStartEvent) {
                self.0.push("start");
            }
            fn on_render_abandoned(&mut self, _: &RenderAbandonedEvent) {
                self.0.push("abandoned");
            }
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                self.0.push(e.phase.as_str());
            }
            fn on_yield(&mut self, _: &YieldEvent) {
                self.0.push("yield");
            }
            fn on_commit(&mut self, _: &CommitEvent) {
                self.0.push("committed");
            }
        }

        let (mut r, container) = setup();
        let mut log = Log::default();
        let mut tracer = Tracer::new(&mut log);
        r.render_traced(list(&["a"]), container, &mut tracer);
        r.work_loop_traced(&FixedDeadline::EXHAUSTED, &mut tracer)
            .unwrap();
        r.render_traced(list(&["b"]), container, &mut tracer);
        r.work_loop_traced(&FixedDeadline::UNBOUNDED, &mut tracer)
            .unwrap();
        drop(tracer);
        assert_eq!(
            log.0,
            [
                "start",
                "build",
                "yield",
                "abandoned",
                "start",
                "build",
                "commit",
                "committed"
            ]
        );
    }
}
