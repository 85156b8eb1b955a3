// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{FiberId, INVALID};
use super::store::FiberStore;

/// An iterator over the direct children of a fiber, following `sibling`
/// links.
///
/// Created by [`FiberStore::children`].
#[derive(Debug)]
pub struct Children<'a, N> {
    store: &'a FiberStore<N>,
    current: u32,
}

impl<'a, N> Children<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.sibling[idx as usize];
        Some(self.store.id_at(idx))
    }
}

/// A pre-order (child before sibling) walk over a subtree, root included.
///
/// Uses the parent links to climb back up, so the walk needs no stack no
/// matter how deep the tree is. This is the same order the work loop builds
/// fibers in and the order commit applies them.
///
/// Created by [`FiberStore::pre_order`].
#[derive(Debug)]
pub struct PreOrder<'a, N> {
    store: &'a FiberStore<N>,
    root: u32,
    next: u32,
}

impl<'a, N> PreOrder<'a, N> {
    pub(crate) fn new(store: &'a FiberStore<N>, root: u32) -> Self {
        Self {
            store,
            root,
            next: root,
        }
    }

    fn advance(&self, idx: u32) -> u32 {
        let child = self.store.child[idx as usize];
        if child != INVALID {
            return child;
        }
        let mut cur = idx;
        while cur != self.root && cur != INVALID {
            let sibling = self.store.sibling[cur as usize];
            if sibling != INVALID {
                return sibling;
            }
            cur = self.store.parent[cur as usize];
        }
        INVALID
    }
}

impl<N> Iterator for PreOrder<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.next == INVALID {
            return None;
        }
        let idx = self.next;
        self.next = self.advance(idx);
        Some(self.store.id_at(idx))
    }
}
