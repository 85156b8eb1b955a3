// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, linking and reclamation.

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::id::{FiberId, INVALID};
use super::traverse::{Children, PreOrder};
use super::{EffectTag, FiberType};
use crate::element::Props;

/// Struct-of-arrays storage for the fibers of every tree of one root.
///
/// Fibers are addressed by [`FiberId`] handles. Each fiber occupies a slot in
/// parallel arrays; freed fibers are recycled via a free list and generation
/// counters make stale handles fail loudly.
///
/// `N` is the host node handle type.
#[derive(Debug)]
pub struct FiberStore<N> {
    // -- Identity and payload --
    pub(crate) ty: Vec<FiberType>,
    pub(crate) props: Vec<Rc<Props>>,
    pub(crate) dom: Vec<Option<N>>,
    pub(crate) effect: Vec<Option<EffectTag>>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) child: Vec<u32>,
    pub(crate) sibling: Vec<u32>,

    // -- Cross-tree lookup (never owning) --
    pub(crate) alternate: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    empty_props: Rc<Props>,
}

impl<N> Default for FiberStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FiberStore<N> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ty: Vec::new(),
            props: Vec::new(),
            dom: Vec::new(),
            effect: Vec::new(),
            parent: Vec::new(),
            child: Vec::new(),
            sibling: Vec::new(),
            alternate: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            empty_props: Rc::new(Props::new()),
        }
    }

    // -- Allocation API --

    /// Creates a detached fiber with no host node, links or effect.
    pub fn create_fiber(&mut self, ty: FiberType, props: Rc<Props>) -> FiberId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.ty[i] = ty;
            self.props[i] = props;
            self.dom[i] = None;
            self.effect[i] = None;
            self.parent[i] = INVALID;
            self.child[i] = INVALID;
            self.sibling[i] = INVALID;
            self.alternate[i] = INVALID;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.ty.push(ty);
            self.props.push(props);
            self.dom.push(None);
            self.effect.push(None);
            self.parent.push(INVALID);
            self.child.push(INVALID);
            self.sibling.push(INVALID);
            self.alternate.push(INVALID);
            self.generation.push(0);
            idx
        };

        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees `root` and every fiber below it, dropping their host node
    /// handles and props.
    ///
    /// Only the subtree's own slots are released; fibers in another tree
    /// whose `alternate` points here are left dangling and are detected as
    /// stale by generation checks. If `root` has a parent, the parent's child
    /// chain is not patched.
    pub fn free_tree(&mut self, root: FiberId) {
        self.validate(root);
        let doomed: Vec<u32> = self.pre_order(root).map(|id| id.idx).collect();
        for idx in doomed {
            let i = idx as usize;
            self.generation[i] += 1;
            self.props[i] = Rc::clone(&self.empty_props);
            self.dom[i] = None;
            self.effect[i] = None;
            self.parent[i] = INVALID;
            self.child[i] = INVALID;
            self.sibling[i] = INVALID;
            self.alternate[i] = INVALID;
            self.free_list.push(idx);
        }
    }

    /// Returns whether the given handle refers to a live fiber.
    #[must_use]
    pub fn is_alive(&self, id: FiberId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live fibers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Makes `child` the first child of `parent` and points `child` back at
    /// it.
    pub fn set_first_child(&mut self, parent: FiberId, child: FiberId) {
        self.validate(parent);
        self.validate(child);
        self.child[parent.idx as usize] = child.idx;
        self.parent[child.idx as usize] = parent.idx;
    }

    /// Links `next` as the sibling following `prev`, sharing `prev`'s parent.
    pub fn set_next_sibling(&mut self, prev: FiberId, next: FiberId) {
        self.validate(prev);
        self.validate(next);
        self.sibling[prev.idx as usize] = next.idx;
        self.parent[next.idx as usize] = self.parent[prev.idx as usize];
    }

    /// Sets the parent back-reference without touching the parent's child
    /// chain.
    pub fn set_parent(&mut self, id: FiberId, parent: FiberId) {
        self.validate(id);
        self.validate(parent);
        self.parent[id.idx as usize] = parent.idx;
    }

    /// Returns the parent of a fiber, if any.
    #[must_use]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns the first child of a fiber, if any.
    #[must_use]
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.child[id.idx as usize])
    }

    /// Returns the next sibling of a fiber, if any.
    #[must_use]
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.sibling[id.idx as usize])
    }

    /// Returns the previous-commit counterpart of a fiber, if any.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.alternate[id.idx as usize])
    }

    /// Sets or clears the previous-commit counterpart.
    pub fn set_alternate(&mut self, id: FiberId, alternate: Option<FiberId>) {
        self.validate(id);
        self.alternate[id.idx as usize] = match alternate {
            Some(alt) => {
                self.validate(alt);
                alt.idx
            }
            None => INVALID,
        };
    }

    /// Returns an iterator over the direct children of a fiber.
    #[must_use]
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        self.validate(id);
        Children::new(self, self.child[id.idx as usize])
    }

    /// Returns a pre-order walk over the subtree rooted at `id`.
    #[must_use]
    pub fn pre_order(&self, id: FiberId) -> PreOrder<'_, N> {
        self.validate(id);
        PreOrder::new(self, id.idx)
    }

    // -- Payload API --

    /// Returns the fiber type.
    #[must_use]
    pub fn ty(&self, id: FiberId) -> &FiberType {
        self.validate(id);
        &self.ty[id.idx as usize]
    }

    /// Returns the props the fiber was built from.
    #[must_use]
    pub fn props(&self, id: FiberId) -> &Rc<Props> {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    /// Returns the host node owned by the fiber, if created yet.
    #[must_use]
    pub fn dom(&self, id: FiberId) -> Option<&N> {
        self.validate(id);
        self.dom[id.idx as usize].as_ref()
    }

    /// Stores the host node handle for a fiber.
    pub fn set_dom(&mut self, id: FiberId, node: N) {
        self.validate(id);
        self.dom[id.idx as usize] = Some(node);
    }

    /// Returns the effect assigned during reconciliation, if any.
    #[must_use]
    pub fn effect(&self, id: FiberId) -> Option<EffectTag> {
        self.validate(id);
        self.effect[id.idx as usize]
    }

    /// Assigns the effect commit should apply.
    pub fn set_effect(&mut self, id: FiberId, effect: EffectTag) {
        self.validate(id);
        self.effect[id.idx as usize] = Some(effect);
    }

    /// Removes the effect, if any.
    pub fn clear_effect(&mut self, id: FiberId) {
        self.validate(id);
        self.effect[id.idx as usize] = None;
    }

    /// Returns the closest strict ancestor of `id` that owns a host node,
    /// together with that node.
    #[must_use]
    pub fn host_ancestor(&self, id: FiberId) -> Option<(FiberId, &N)> {
        self.validate(id);
        let mut cur = self.parent[id.idx as usize];
        while cur != INVALID {
            if let Some(node) = self.dom[cur as usize].as_ref() {
                return Some((self.id_at(cur), node));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn link(&self, idx: u32) -> Option<FiberId> {
        if idx == INVALID {
            None
        } else {
            Some(self.id_at(idx))
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: FiberId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale FiberId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}
