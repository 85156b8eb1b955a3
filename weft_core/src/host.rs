// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! The engine never touches a rendering tree directly. Everything it needs is
//! expressed by the [`Host`] trait, which backends implement over their native
//! node type (DOM nodes in `weft_backend_web`, an in-memory tree in
//! [`testing::RecordingHost`](crate::testing::RecordingHost)).
//!
//! # Call discipline
//!
//! During the build phase the engine only calls [`Host::create_node`],
//! [`Host::create_text_node`] and the attribute/listener methods on nodes it
//! has just created and not yet attached. Tree mutations
//! ([`Host::append_child`], [`Host::remove_child`]) and every call touching an
//! already attached node happen inside commit, in one uninterrupted pass.
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! reconciler.render(app(), container);
//! loop {
//!     let deadline = host_idle_deadline();
//!     match reconciler.work_loop(&deadline)? {
//!         WorkStatus::Yielded => wait_for_idle(),
//!         WorkStatus::Committed(_) | WorkStatus::Idle => break,
//!     }
//! }
//! ```

use crate::element::{Listener, PropValue};
use crate::error::HostError;

/// Creates and mutates nodes of a platform-native rendering tree.
///
/// All methods may fail; a failure aborts the current render (see
/// [`RenderError::Host`](crate::error::RenderError::Host)).
pub trait Host {
    /// Handle to one native node. Cloning must yield a handle to the same
    /// node, not a copy of it, and two handles compare equal exactly when
    /// they refer to the same node.
    type Node: Clone + PartialEq;

    /// Creates a detached typed node (e.g. `div`).
    fn create_node(&mut self, tag: &str) -> Result<Self::Node, HostError>;

    /// Creates a detached text node holding `value`.
    fn create_text_node(&mut self, value: &str) -> Result<Self::Node, HostError>;

    /// Assigns an attribute or node property. `value` is never a
    /// [`PropValue::Listener`].
    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    /// Resets an attribute or node property to its empty value.
    fn clear_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Registers `listener` for `event` (e.g. `"click"`).
    fn add_event_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    /// Unregisters a listener previously added with the same `event` and the
    /// same listener identity.
    fn remove_event_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Removes `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
}
