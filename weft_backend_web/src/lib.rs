// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for weft.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: the [`Host`] implementation over live DOM nodes
//! - [`IdleLoop`]: `requestIdleCallback` idle scheduling
//! - [`ConsoleSink`]: trace output to the browser console
//! - [`now`] and [`timebase`]: `performance.now()` time in microsecond ticks
//!
//! [`render`] wires the host and the idle loop into a [`Root`] for the common
//! case of one application mounted into one container.

#![no_std]

extern crate alloc;

mod console;
mod host;
mod idle;

pub use console::ConsoleSink;
pub use host::DomHost;
pub use idle::{BrowserDeadline, IdleLoop};
pub use weft_core::host::Host;

use weft_core::element::Element;
use weft_core::error::HostError;
use weft_core::root::Root;
use weft_core::time::{Duration, Timebase};

/// Returns the time since the page's time origin, from `performance.now()`.
///
/// The returned [`Duration`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> Duration {
    Duration::from_millis_f64(idle::performance_now(), Timebase::MICROS)
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
///
/// [`BrowserDeadline`] reports the millisecond budget of `IdleDeadline` in
/// these ticks.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

/// Mounts `element` into `container`, building it during browser idle time.
///
/// The returned root can be rendered into again; each call replaces the
/// previous request. Build and commit errors are reported to the console.
///
/// # Errors
///
/// Fails if there is no global `window.document` to create nodes with.
pub fn render(
    element: Element,
    container: web_sys::Node,
) -> Result<Root<DomHost, IdleLoop>, HostError> {
    let root = Root::new(DomHost::from_window()?, IdleLoop::new());
    root.render(element, container);
    Ok(root)
}
