// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative element descriptions.
//!
//! An [`Element`] is an immutable description of one host node: a type (a tag
//! name or the text marker) plus [`Props`] holding attributes, event listeners
//! and ordered children. Elements are rebuilt for every render and never
//! mutated by the engine; cloning one only bumps a reference count.
//!
//! Two ways to build them:
//!
//! - the builder, `Element::new("div").attr("title", "x").text_child("hi")`;
//! - [`create_element`], the literal-style factory which takes a prop list and
//!   a child list, normalizing scalar children into text elements.
//!
//! ```
//! use weft_core::element::{Element, create_element};
//!
//! let a = Element::new("h1").attr("class", "big").text_child("Hello");
//! let b = create_element("h1", [("class", "big".into())], ["Hello".into()]);
//! assert_eq!(a, b);
//! ```

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// Prop key carrying a text element's value.
pub const TEXT_VALUE_KEY: &str = "nodeValue";

/// Reserved key for children in the literal prop form. Never applied to a
/// host node.
pub const CHILDREN_KEY: &str = "children";

/// Prefix marking a prop key as an event listener (`onClick`).
pub const EVENT_PREFIX: &str = "on";

/// What kind of host node an element describes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// A typed node, e.g. `div`.
    Tag(Cow<'static, str>),
    /// A text node whose value lives under [`TEXT_VALUE_KEY`].
    Text,
}

/// A shared event callback.
///
/// Listeners compare by identity: two listeners wrapping equal closures are
/// still different, so swapping one for another re-binds the host listener.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&dyn Any)>);

impl Listener {
    /// Wraps a callback receiving the host's event value type-erased.
    pub fn new(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wraps a callback for a concrete host event type. Events of any other
    /// type are ignored.
    pub fn for_event<E: 'static>(f: impl Fn(&E) + 'static) -> Self {
        Self::new(move |event| {
            if let Some(event) = event.downcast_ref::<E>() {
                f(event);
            }
        })
    }

    /// Invokes the callback.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }

    /// Returns whether both handles refer to the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the callback, stable while any clone is alive. Hosts use it
    /// to find the native wrapper registered for this listener.
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:#x})", self.addr())
    }
}

/// A single prop value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// String attribute.
    Str(Cow<'static, str>),
    /// Numeric attribute.
    Number(f64),
    /// Boolean attribute (`disabled`, `checked`, ...).
    Bool(bool),
    /// Event listener. Only valid under keys starting with [`EVENT_PREFIX`].
    Listener(Listener),
}

impl PropValue {
    /// Returns the listener, if this is one.
    #[must_use]
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&'static str> for PropValue {
    fn from(s: &'static str) -> Self {
        Self::Str(Cow::Borrowed(s))
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        Self::Str(Cow::Owned(s))
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for PropValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Listener> for PropValue {
    fn from(l: Listener) -> Self {
        Self::Listener(l)
    }
}

/// Attributes, listeners and children of one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attrs: BTreeMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    /// Creates empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attrs.get(key)
    }

    /// Iterates attributes and listeners in key order. Children are not
    /// included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attribute and listener entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether there are no attribute or listener entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Ordered child elements.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Inserts a prop. The [`CHILDREN_KEY`] is reserved and ignored here; use
    /// [`push_child`](Self::push_child).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        let key = key.into();
        if key != CHILDREN_KEY {
            self.attrs.insert(key, value.into());
        }
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }
}

/// An immutable description of one host node and its subtree.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Starts a typed element with no props and no children.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ty: ElementType::Tag(tag.into()),
            props: Rc::new(Props::new()),
        }
    }

    /// Creates a text element: `props = { nodeValue: value, children: [] }`.
    pub fn text(value: impl Into<Cow<'static, str>>) -> Self {
        let mut props = Props::new();
        props.insert(TEXT_VALUE_KEY, PropValue::Str(value.into()));
        Self {
            ty: ElementType::Text,
            props: Rc::new(props),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.props).insert(key, value);
        self
    }

    /// Binds a listener for `event` (e.g. `"click"`), stored under the
    /// `onClick` key.
    #[must_use]
    pub fn on(mut self, event: &str, listener: Listener) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("{EVENT_PREFIX}{}{}", first.to_uppercase(), chars.as_str()),
            None => String::from(EVENT_PREFIX),
        };
        Rc::make_mut(&mut self.props).insert(key, listener);
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child.into().into_element());
        self
    }

    /// Appends a text child.
    #[must_use]
    pub fn text_child(self, value: impl Into<Cow<'static, str>>) -> Self {
        self.child(Self::text(value))
    }

    /// Appends several children.
    #[must_use]
    pub fn children<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        let props = Rc::make_mut(&mut self.props);
        for child in children {
            props.push_child(child.into().into_element());
        }
        self
    }

    /// The element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// The element's props.
    #[must_use]
    pub fn props(&self) -> &Rc<Props> {
        &self.props
    }

    /// Tag name, or `None` for text elements.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.ty {
            ElementType::Tag(tag) => Some(tag),
            ElementType::Text => None,
        }
    }

    /// Text value, or `None` for typed elements.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match self.ty {
            ElementType::Text => self.props.get(TEXT_VALUE_KEY).and_then(PropValue::as_str),
            ElementType::Tag(_) => None,
        }
    }
}

/// A child in the literal factory form: an element or a scalar to be wrapped
/// into a text element.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    /// Already an element.
    Element(Element),
    /// Scalar text.
    Text(Cow<'static, str>),
}

impl Child {
    /// Normalizes into an element.
    #[must_use]
    pub fn into_element(self) -> Element {
        match self {
            Self::Element(e) => e,
            Self::Text(t) => Element::text(t),
        }
    }
}

impl From<Element> for Child {
    fn from(e: Element) -> Self {
        Self::Element(e)
    }
}

impl From<&'static str> for Child {
    fn from(s: &'static str) -> Self {
        Self::Text(Cow::Borrowed(s))
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Self::Text(Cow::Owned(s))
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Self::Text(Cow::Owned(format!("{n}")))
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Self::Text(Cow::Owned(format!("{n}")))
    }
}

/// Literal-style element factory.
///
/// Scalar children are wrapped into text elements. A `children` entry in
/// `props` is ignored; children come only from `children`.
pub fn create_element<K: Into<String>>(
    tag: impl Into<Cow<'static, str>>,
    props: impl IntoIterator<Item = (K, PropValue)>,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut out = Props::new();
    for (key, value) in props {
        out.insert(key, value);
    }
    for child in children {
        out.push_child(child.into_element());
    }
    Element {
        ty: ElementType::Tag(tag.into()),
        props: Rc::new(out),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn scalar_children_become_text_elements() {
        let el = create_element("p", Vec::<(&str, PropValue)>::new(), ["hi".into(), 3_i64.into()]);
        let kids = el.props().children();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].ty(), &ElementType::Text);
        assert_eq!(kids[0].text_value(), Some("hi"));
        assert_eq!(kids[1].text_value(), Some("3"));
        assert!(kids[0].props().children().is_empty());
    }

    #[test]
    fn children_key_is_never_stored_as_a_prop() {
        let el = create_element("div", vec![("children", PropValue::from("oops"))], Vec::<Child>::new());
        assert!(el.props().get(CHILDREN_KEY).is_none());
        assert!(el.props().is_empty());
    }

    #[test]
    fn on_builds_prefixed_key() {
        let l = Listener::new(|_| {});
        let el = Element::new("button").on("click", l.clone());
        assert_eq!(el.props().get("onClick"), Some(&PropValue::Listener(l)));
    }

    #[test]
    fn listeners_compare_by_identity() {
        let a = Listener::new(|_| {});
        let b = Listener::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn typed_listener_ignores_other_event_types() {
        use core::cell::Cell;

        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let l = Listener::for_event::<u32>(move |n| h.set(h.get() + *n));
        l.call(&5_u32);
        l.call(&"not a u32");
        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn builder_does_not_disturb_shared_clones() {
        let base = Element::new("div").attr("id", "a");
        let copy = base.clone().attr("id", "b");
        assert_eq!(base.props().get("id"), Some(&PropValue::from("a")));
        assert_eq!(copy.props().get("id"), Some(&PropValue::from("b")));
    }
}
