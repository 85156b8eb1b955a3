// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestIdleCallback` scheduling.
//!
//! [`IdleLoop`] hands each [`IdleCallback`] to the browser's
//! [`requestIdleCallback`][mdn]. The callback receives the browser's
//! `IdleDeadline`, wrapped as a [`BrowserDeadline`] that reports the remaining
//! milliseconds as microsecond ticks.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/Window/requestIdleCallback
//! [`IdleCallback`]: weft_core::scheduler::IdleCallback

use alloc::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::IdleDeadline;

use weft_core::error::RenderError;
use weft_core::scheduler::{Deadline, IdleCallback, IdleScheduler};
use weft_core::time::{Duration, Timebase};

// Direct global binding instead of `web_sys::Window` methods, so scheduling
// does not need to fetch the window first.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestIdleCallback")]
    fn request_idle_callback(callback: &JsValue) -> u32;
}

/// Budget of one browser idle period.
#[derive(Debug)]
pub struct BrowserDeadline(pub IdleDeadline);

impl Deadline for BrowserDeadline {
    fn time_remaining(&self) -> Duration {
        Duration::from_millis_f64(self.0.time_remaining(), Timebase::MICROS)
    }
}

/// An [`IdleScheduler`] backed by `requestIdleCallback`.
///
/// Errors returned by a callback have no caller to propagate to; they are
/// passed to the error handler instead (by default `console.error`).
#[derive(Clone)]
pub struct IdleLoop {
    on_error: Rc<dyn Fn(&RenderError)>,
}

impl core::fmt::Debug for IdleLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdleLoop").finish_non_exhaustive()
    }
}

impl Default for IdleLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleLoop {
    /// Creates a loop that reports errors with `console.error`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_error_handler(|err| {
            web_sys::console::error_1(&JsValue::from_str(&alloc::format!("[weft] {err}")));
        })
    }

    /// Creates a loop that reports errors to `handler`.
    #[must_use]
    pub fn with_error_handler(handler: impl Fn(&RenderError) + 'static) -> Self {
        Self {
            on_error: Rc::new(handler),
        }
    }
}

impl IdleScheduler for IdleLoop {
    fn schedule_idle_work(&self, callback: IdleCallback) {
        let on_error = Rc::clone(&self.on_error);
        // `once_into_js` frees the closure after its single invocation.
        let closure = Closure::once_into_js(move |deadline: IdleDeadline| {
            if let Err(err) = callback(&BrowserDeadline(deadline)) {
                on_error(&err);
            }
        });
        request_idle_callback(&closure);
    }
}
