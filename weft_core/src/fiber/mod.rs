// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree data model.
//!
//! A *fiber* is both a unit of work and a node of a persistent tree. Each
//! fiber has:
//!
//! - An identity ([`FiberId`]), a generational handle that becomes stale when
//!   the fiber's tree is freed.
//! - A [`FiberType`] and the [`Props`](crate::element::Props) of the element
//!   it was built from. Props are shared with the element and never mutated.
//! - At most one host node handle, created once and then reused for as long
//!   as the slot it describes keeps its type.
//! - Topology: `parent`, first `child` and next `sibling` links. Children of
//!   one parent form a singly linked list.
//! - An `alternate`: the fiber occupying the same position in the previously
//!   committed tree. It is a lookup, never ownership.
//! - An [`EffectTag`], written during reconciliation and read during commit.
//!
//! At most two trees live in a [`FiberStore`] at once: the *current* tree
//! (last committed) and the *work-in-progress* tree. Work-in-progress fibers
//! may point at current fibers through `alternate`, never the reverse.

mod id;
mod store;
mod traverse;

use alloc::borrow::Cow;

use crate::element::ElementType;

pub use id::FiberId;
pub use store::FiberStore;
pub use traverse::{Children, PreOrder};

/// What a fiber stands for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FiberType {
    /// The synthetic root of a tree. Its host node is the render container.
    Root,
    /// A typed host node.
    Tag(Cow<'static, str>),
    /// A text host node.
    Text,
}

impl FiberType {
    /// Whether a fiber of this type can be updated in place from `element`.
    #[must_use]
    pub fn matches(&self, element: &ElementType) -> bool {
        match (self, element) {
            (Self::Tag(a), ElementType::Tag(b)) => a == b,
            (Self::Text, ElementType::Text) => true,
            _ => false,
        }
    }
}

impl From<&ElementType> for FiberType {
    fn from(ty: &ElementType) -> Self {
        match ty {
            ElementType::Tag(tag) => Self::Tag(tag.clone()),
            ElementType::Text => Self::Text,
        }
    }
}

/// What commit must do with a fiber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Attach the fiber's new host node under its nearest host ancestor.
    Placement,
    /// Keep the host node and patch its attributes and listeners.
    Update,
    /// Detach the fiber's host node. Only fibers of the current tree carry
    /// this tag, via the deletions list.
    Deletion,
}
