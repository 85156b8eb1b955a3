// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atomic application of a finished build to the host tree.
//!
//! Commit runs in one uninterrupted pass: first every fiber on the deletions
//! list is detached, then the work-in-progress tree is walked in pre-order
//! and each fiber's effect applied. Only after both passes succeed does the
//! work-in-progress tree become current and the previous tree get released.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::Props;
use crate::error::RenderError;
use crate::fiber::{EffectTag, FiberId, FiberStore};
use crate::host::Host;
use crate::props::update_dom;
use crate::trace::Tracer;

/// Effects applied by one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommitStats {
    /// Host nodes appended.
    pub placements: usize,
    /// Host nodes patched in place.
    pub updates: usize,
    /// Host nodes detached.
    pub deletions: usize,
}

/// Applies all effects of the tree under `wip_root`.
///
/// On error the host tree keeps whatever mutations were applied before the
/// failure, and the store is left as it was.
pub(crate) fn commit_root<H: Host>(
    host: &mut H,
    store: &FiberStore<H::Node>,
    wip_root: FiberId,
    deletions: &[FiberId],
    render_index: u64,
    tracer: &mut Tracer<'_>,
) -> Result<CommitStats, RenderError> {
    let mut stats = CommitStats::default();

    for &fiber in deletions {
        commit_deletion(host, store, fiber)?;
        stats.deletions += 1;
        trace_effect(tracer, render_index, fiber, EffectTag::Deletion);
    }

    for fiber in store.pre_order(wip_root) {
        let Some(effect) = store.effect(fiber) else {
            continue;
        };
        if store.dom(fiber).is_none() {
            continue;
        }
        match effect {
            EffectTag::Placement => {
                commit_placement(host, store, fiber)?;
                stats.placements += 1;
            }
            EffectTag::Update => {
                commit_update(host, store, fiber)?;
                stats.updates += 1;
            }
            EffectTag::Deletion => {
                commit_deletion(host, store, fiber)?;
                stats.deletions += 1;
            }
        }
        trace_effect(tracer, render_index, fiber, effect);
    }

    Ok(stats)
}

/// Makes `new_root` the only tree in the store: the previous tree is freed
/// and the new tree's effects and alternates are cleared.
pub(crate) fn promote<N>(store: &mut FiberStore<N>, new_root: FiberId, old_root: Option<FiberId>) {
    if let Some(old) = old_root {
        store.free_tree(old);
    }
    let fibers: Vec<FiberId> = store.pre_order(new_root).collect();
    for fiber in fibers {
        store.set_alternate(fiber, None);
        store.clear_effect(fiber);
    }
}

fn commit_placement<H: Host>(
    host: &mut H,
    store: &FiberStore<H::Node>,
    fiber: FiberId,
) -> Result<(), RenderError> {
    let (_, parent) = store
        .host_ancestor(fiber)
        .ok_or(RenderError::DetachedFiber { fiber })?;
    if let Some(node) = store.dom(fiber) {
        host.append_child(parent, node)?;
    }
    Ok(())
}

fn commit_update<H: Host>(
    host: &mut H,
    store: &FiberStore<H::Node>,
    fiber: FiberId,
) -> Result<(), RenderError> {
    let Some(node) = store.dom(fiber) else {
        return Ok(());
    };
    let next = store.props(fiber);
    match store.alternate(fiber) {
        Some(alt) => {
            let prev = store.props(alt);
            if Rc::ptr_eq(prev, next) {
                return Ok(());
            }
            update_dom(host, node, prev, next)
        }
        None => update_dom(host, node, &Props::new(), next),
    }
}

/// Detaches the host node of `fiber`, or, if it has none, the nearest host
/// nodes below it.
fn commit_deletion<H: Host>(
    host: &mut H,
    store: &FiberStore<H::Node>,
    fiber: FiberId,
) -> Result<(), RenderError> {
    let (_, parent) = store
        .host_ancestor(fiber)
        .ok_or(RenderError::DetachedFiber { fiber })?;

    let mut stack = Vec::from([fiber]);
    while let Some(cur) = stack.pop() {
        match store.dom(cur) {
            Some(node) => host.remove_child(parent, node)?,
            None => {
                // Reversed so children come off the stack in order.
                let mut children: Vec<FiberId> = store.children(cur).collect();
                children.reverse();
                stack.extend(children);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "trace-rich")]
fn trace_effect(tracer: &mut Tracer<'_>, render_index: u64, fiber: FiberId, effect: EffectTag) {
    tracer.fiber_effect(&crate::trace::FiberEffectEvent {
        render_index,
        fiber,
        effect,
    });
}

#[cfg(not(feature = "trace-rich"))]
fn trace_effect(tracer: &mut Tracer<'_>, render_index: u64, fiber: FiberId, effect: EffectTag) {
    _ = (tracer, render_index, fiber, effect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::fiber::FiberType;
    use crate::testing::{HostCall, RecordingHost, TestNode};

    fn fiber_with_node(
        store: &mut FiberStore<TestNode>,
        host: &mut RecordingHost,
        tag: &'static str,
    ) -> FiberId {
        let id = store.create_fiber(FiberType::Tag(tag.into()), Rc::new(Props::new()));
        let node = host.create_node(tag).unwrap();
        store.set_dom(id, node);
        id
    }

    #[test]
    fn deletion_without_node_removes_its_host_children() {
        let mut host = RecordingHost::new();
        let mut store = FiberStore::new();
        let container = host.create_container();

        let root = store.create_fiber(FiberType::Root, Rc::new(Props::new()));
        store.set_dom(root, container);
        let hollow = store.create_fiber(FiberType::Tag("group".into()), Rc::new(Props::new()));
        store.set_first_child(root, hollow);
        let a = fiber_with_node(&mut store, &mut host, "a");
        let b = fiber_with_node(&mut store, &mut host, "b");
        store.set_first_child(hollow, a);
        store.set_next_sibling(a, b);
        let (na, nb) = (*store.dom(a).unwrap(), *store.dom(b).unwrap());
        host.append_child(&container, &na).unwrap();
        host.append_child(&container, &nb).unwrap();
        host.take_calls();

        commit_deletion(&mut host, &store, hollow).unwrap();
        assert_eq!(
            host.take_calls(),
            [
                HostCall::RemoveChild {
                    parent: container,
                    child: na
                },
                HostCall::RemoveChild {
                    parent: container,
                    child: nb
                },
            ]
        );
        assert!(host.children(container).is_empty());
    }

    #[test]
    fn placement_without_host_ancestor_is_reported() {
        let mut host = RecordingHost::new();
        let mut store = FiberStore::new();
        let orphan = fiber_with_node(&mut store, &mut host, "p");
        store.set_effect(orphan, EffectTag::Placement);

        let err = commit_root(&mut host, &store, orphan, &[], 0, &mut Tracer::none());
        // The root itself has no ancestor at all.
        assert_eq!(err, Err(RenderError::DetachedFiber { fiber: orphan }));
    }

    #[test]
    fn update_with_shared_props_is_skipped() {
        let mut host = RecordingHost::new();
        let mut store = FiberStore::new();
        let el = Element::new("div").attr("id", "x");
        let old = store.create_fiber(FiberType::Tag("div".into()), Rc::clone(el.props()));
        let new = store.create_fiber(FiberType::Tag("div".into()), Rc::clone(el.props()));
        let node = host.create_node("div").unwrap();
        store.set_dom(old, node);
        store.set_dom(new, node);
        store.set_alternate(new, Some(old));
        host.take_calls();

        commit_update(&mut host, &store, new).unwrap();
        assert!(host.take_calls().is_empty());
    }

    #[test]
    fn promote_frees_the_old_tree_and_clears_links() {
        let mut host = RecordingHost::new();
        let mut store = FiberStore::new();
        let old = fiber_with_node(&mut store, &mut host, "div");
        let new = fiber_with_node(&mut store, &mut host, "div");
        store.set_alternate(new, Some(old));
        store.set_effect(new, EffectTag::Update);

        promote(&mut store, new, Some(old));
        assert!(!store.is_alive(old));
        assert_eq!(store.alternate(new), None);
        assert_eq!(store.effect(new), None);
        assert_eq!(store.live_count(), 1);
    }
}
