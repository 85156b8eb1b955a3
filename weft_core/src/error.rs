// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for builds and commits.
//!
//! Every failure aborts the render it occurred in: the work-in-progress tree is
//! discarded and the last committed tree stays current. Errors are returned to
//! whoever drives the work loop; nothing is retried.
//!
//! A [`HostError`] raised during commit leaves the host tree with the
//! mutations applied so far. The engine does not attempt to roll them back.

use alloc::string::String;
use core::fmt;

use crate::fiber::FiberId;

/// Which [`Host`](crate::host::Host) operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// [`Host::create_node`](crate::host::Host::create_node).
    CreateNode,
    /// [`Host::create_text_node`](crate::host::Host::create_text_node).
    CreateTextNode,
    /// [`Host::set_attribute`](crate::host::Host::set_attribute).
    SetAttribute,
    /// [`Host::clear_attribute`](crate::host::Host::clear_attribute).
    ClearAttribute,
    /// [`Host::add_event_listener`](crate::host::Host::add_event_listener).
    AddEventListener,
    /// [`Host::remove_event_listener`](crate::host::Host::remove_event_listener).
    RemoveEventListener,
    /// [`Host::append_child`](crate::host::Host::append_child).
    AppendChild,
    /// [`Host::remove_child`](crate::host::Host::remove_child).
    RemoveChild,
}

impl HostOp {
    /// Returns the adapter method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateNode => "create_node",
            Self::CreateTextNode => "create_text_node",
            Self::SetAttribute => "set_attribute",
            Self::ClearAttribute => "clear_attribute",
            Self::AddEventListener => "add_event_listener",
            Self::RemoveEventListener => "remove_event_listener",
            Self::AppendChild => "append_child",
            Self::RemoveChild => "remove_child",
        }
    }
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host adapter call failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("host adapter call `{op}` failed: {message}")]
pub struct HostError {
    /// The failing operation.
    pub op: HostOp,
    /// Adapter-provided description.
    pub message: String,
}

impl HostError {
    /// Creates a new host error.
    #[must_use]
    pub fn new(op: HostOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

/// An element reached node creation with a type the host cannot build.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The tag name was empty.
    #[error("element has an empty tag name")]
    EmptyTag,
    /// The tag name contains characters no host accepts in a tag.
    #[error("element tag `{tag}` is not a valid node type")]
    InvalidTag {
        /// The offending tag.
        tag: String,
    },
}

/// Why a build or commit was aborted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The element tree described a node the host cannot create.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The host adapter reported a failure.
    #[error(transparent)]
    Host(#[from] HostError),
    /// A prop value does not fit its key: a listener under a plain attribute
    /// key, or a non-listener under an event key.
    #[error("prop `{key}` {reason}")]
    InvalidProp {
        /// The offending key.
        key: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// No ancestor of the fiber owns a host node to attach to or detach from.
    #[error("fiber {fiber:?} has no ancestor with a host node")]
    DetachedFiber {
        /// The fiber being placed or deleted.
        fiber: FiberId,
    },
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn host_error_names_the_operation() {
        let err = HostError::new(HostOp::RemoveChild, "not a child");
        assert_eq!(
            err.to_string(),
            "host adapter call `remove_child` failed: not a child"
        );
    }

    #[test]
    fn configuration_errors_convert_transparently() {
        let err: RenderError = ConfigurationError::EmptyTag.into();
        assert_eq!(err.to_string(), "element has an empty tag name");
    }
}
