// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM host.
//!
//! [`DomHost`] creates nodes through a [`Document`] and assigns props as plain
//! JavaScript properties (`node[name] = value`), so `className`, `value` and
//! `nodeValue` behave the way they do when set from script.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, Node};

use weft_core::element::{Listener, PropValue};
use weft_core::error::{HostError, HostOp};
use weft_core::host::Host;

type EventClosure = Closure<dyn FnMut(Event)>;

/// A listener installed on a DOM node.
struct Registration {
    node: Node,
    event: String,
    listener: usize,
    closure: EventClosure,
}

/// [`Host`] implementation over live DOM nodes.
///
/// Each registered [`Listener`] is wrapped in a JavaScript closure owned by
/// the host. Closures are released when the listener is removed or when the
/// node carrying it leaves the document through
/// [`remove_child`](Host::remove_child).
pub struct DomHost {
    document: Document,
    registrations: Vec<Registration>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

impl DomHost {
    /// Creates a host that builds nodes with `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            registrations: Vec::new(),
        }
    }

    /// Creates a host for the global `window.document`.
    ///
    /// # Errors
    ///
    /// Fails outside a browser window context.
    pub fn from_window() -> Result<Self, HostError> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(Self::new)
            .ok_or_else(|| HostError::new(HostOp::CreateNode, "no global document"))
    }

    /// Returns the document nodes are created with.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of listener closures currently held.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registrations.len()
    }

    fn position(&self, node: &Node, event: &str, listener: &Listener) -> Option<usize> {
        self.registrations.iter().position(|r| {
            r.listener == listener.addr() && r.event == event && r.node == *node
        })
    }

    /// Drops the closures of every listener inside the detached `subtree`.
    fn release_subtree(&mut self, subtree: &Node) {
        self.registrations.retain(|r| {
            if !subtree.contains(Some(&r.node)) {
                return true;
            }
            let callback = r.closure.as_ref().unchecked_ref();
            if let Err(e) = r.node.remove_event_listener_with_callback(&r.event, callback) {
                let err = js_error(HostOp::RemoveEventListener, &e);
                web_sys::console::warn_1(&JsValue::from_str(&release_warning(&r.event, &err)));
            }
            false
        });
    }
}

/// Console line for a listener that could not be unhooked from a node that
/// has already been detached. The closure is dropped either way.
fn release_warning(event: &str, err: &HostError) -> String {
    format!("[weft] `{event}` listener left on a detached node: {err}")
}

fn js_error(op: HostOp, err: &JsValue) -> HostError {
    let message = if let Some(s) = err.as_string() {
        s
    } else if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        String::from(e.message())
    } else {
        format!("{err:?}")
    };
    HostError::new(op, message)
}

fn to_js(op: HostOp, value: &PropValue) -> Result<JsValue, HostError> {
    match value {
        PropValue::Str(s) => Ok(JsValue::from_str(s)),
        PropValue::Number(n) => Ok(JsValue::from_f64(*n)),
        PropValue::Bool(b) => Ok(JsValue::from_bool(*b)),
        PropValue::Listener(_) => Err(HostError::new(op, "listener assigned as a property")),
    }
}

fn assign(op: HostOp, node: &Node, name: &str, value: &JsValue) -> Result<(), HostError> {
    let written = js_sys::Reflect::set(node, &JsValue::from_str(name), value)
        .map_err(|e| js_error(op, &e))?;
    if written {
        Ok(())
    } else {
        Err(HostError::new(op, format!("property `{name}` is read-only")))
    }
}

impl Host for DomHost {
    type Node = Node;

    fn create_node(&mut self, tag: &str) -> Result<Node, HostError> {
        self.document
            .create_element(tag)
            .map(Node::from)
            .map_err(|e| js_error(HostOp::CreateNode, &e))
    }

    fn create_text_node(&mut self, value: &str) -> Result<Node, HostError> {
        Ok(self.document.create_text_node(value).into())
    }

    fn set_attribute(
        &mut self,
        node: &Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let value = to_js(HostOp::SetAttribute, value)?;
        assign(HostOp::SetAttribute, node, name, &value)
    }

    fn clear_attribute(&mut self, node: &Node, name: &str) -> Result<(), HostError> {
        assign(HostOp::ClearAttribute, node, name, &JsValue::from_str(""))
    }

    fn add_event_listener(
        &mut self,
        node: &Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let handler = listener.clone();
        let closure = EventClosure::new(move |e: Event| handler.call(&e));
        node.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(|e| js_error(HostOp::AddEventListener, &e))?;
        self.registrations.push(Registration {
            node: node.clone(),
            event: event.into(),
            listener: listener.addr(),
            closure,
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: &Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        // Unknown listeners are ignored, as `removeEventListener` does.
        let Some(idx) = self.position(node, event, listener) else {
            return Ok(());
        };
        let reg = self.registrations.swap_remove(idx);
        node.remove_event_listener_with_callback(event, reg.closure.as_ref().unchecked_ref())
            .map_err(|e| js_error(HostOp::RemoveEventListener, &e))
    }

    fn append_child(&mut self, parent: &Node, child: &Node) -> Result<(), HostError> {
        parent
            .append_child(child)
            .map(drop)
            .map_err(|e| js_error(HostOp::AppendChild, &e))
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), HostError> {
        parent
            .remove_child(child)
            .map_err(|e| js_error(HostOp::RemoveChild, &e))?;
        self.release_subtree(child);
        Ok(())
    }
}
