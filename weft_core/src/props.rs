// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute and listener diffing for a single host node.
//!
//! [`update_dom`] compares the props a node was last rendered with against the
//! props it should have now and issues the minimal set of [`Host`] calls.
//! Keys fall into three classes:
//!
//! - **event** keys start with [`EVENT_PREFIX`] (`onClick` binds `click`);
//! - the **children** key is structural and never reaches the host;
//! - everything else is a **plain attribute**.
//!
//! Change detection is per key: values compare with `==`, which for listeners
//! means identity. The passes run in a fixed order so that a replaced listener
//! is always removed before its successor is added.

use alloc::string::{String, ToString};

use crate::element::{CHILDREN_KEY, EVENT_PREFIX, Props};
use crate::error::RenderError;
use crate::host::Host;

/// Whether `key` names an event listener.
#[must_use]
pub fn is_event(key: &str) -> bool {
    key.len() > EVENT_PREFIX.len() && key.starts_with(EVENT_PREFIX)
}

/// Whether `key` names a plain attribute.
#[must_use]
pub fn is_attribute(key: &str) -> bool {
    key != CHILDREN_KEY && !is_event(key)
}

/// Host event name for an event key: the prefix is dropped and the rest
/// lower-cased (`onMouseDown` → `mousedown`).
#[must_use]
pub fn event_name(key: &str) -> String {
    key[EVENT_PREFIX.len()..].to_lowercase()
}

/// Checks that every key of `props` holds a value of its kind: listeners
/// under event keys, scalars under plain attribute keys.
///
/// Runs without touching the host, so a malformed element is rejected before
/// any mutation is issued for it.
///
/// # Errors
///
/// Returns [`RenderError::InvalidProp`] naming the first offending key.
pub fn validate_props(props: &Props) -> Result<(), RenderError> {
    for (key, value) in props.iter() {
        if key == CHILDREN_KEY {
            continue;
        }
        let reason = match (is_event(key), value.as_listener().is_some()) {
            (true, false) => "is an event key but holds no listener",
            (false, true) => "holds a listener but is not an event key",
            _ => continue,
        };
        return Err(RenderError::InvalidProp {
            key: key.to_string(),
            reason,
        });
    }
    Ok(())
}

/// Brings `node` from `prev` props to `next` props.
///
/// Runs four passes:
///
/// 1. clear plain attributes present in `prev` but absent from `next`;
/// 2. remove listeners absent from `next` or whose listener changed;
/// 3. add listeners that are new or changed;
/// 4. set plain attributes that are new or changed.
///
/// Node creation passes empty props as `prev`.
///
/// # Errors
///
/// Returns [`RenderError::InvalidProp`] if `next` fails [`validate_props`],
/// before any host call is made, and [`RenderError::Host`] if an adapter call
/// fails. Calls issued before a host failure are not undone.
pub fn update_dom<H: Host>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> Result<(), RenderError> {
    validate_props(next)?;

    // 1. Stale attributes.
    for (key, _) in prev.iter().filter(|(k, _)| is_attribute(k)) {
        if next.get(key).is_none() {
            host.clear_attribute(node, key)?;
        }
    }

    // 2. Stale or replaced listeners.
    for (key, value) in prev.iter().filter(|(k, _)| is_event(k)) {
        let Some(listener) = value.as_listener() else {
            continue;
        };
        if next.get(key) != Some(value) {
            host.remove_event_listener(node, &event_name(key), listener)?;
        }
    }

    // 3. New or replaced listeners.
    for (key, value) in next.iter().filter(|(k, _)| is_event(k)) {
        let Some(listener) = value.as_listener() else {
            continue;
        };
        if prev.get(key) != Some(value) {
            host.add_event_listener(node, &event_name(key), listener)?;
        }
    }

    // 4. New or changed attributes.
    for (key, value) in next.iter().filter(|(k, _)| is_attribute(k)) {
        if prev.get(key) != Some(value) {
            host.set_attribute(node, key, value)?;
        }
    }

    Ok(())
}
