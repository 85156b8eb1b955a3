// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace output to the browser console.

use alloc::format;
use alloc::string::String;

use wasm_bindgen::JsValue;
use weft_core::time::Timebase;
use weft_core::trace::{CommitEvent, RenderAbandonedEvent, RenderErrorEvent, TraceSink, YieldEvent};

/// A [`TraceSink`] that logs commits, abandoned renders and errors with
/// `console.log` / `console.error`.
///
/// Yields are only logged when [`verbose`](Self::verbose) is set. Events are
/// only delivered when `weft_core` is built with its `trace` feature.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    /// Creates a sink that logs commits, abandoned renders and errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs every yield.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

fn commit_line(e: &CommitEvent) -> String {
    format!(
        "[weft] commit #{}: {} placed, {} updated, {} deleted in {} slice(s), {} units, {} live fibers",
        e.render_index,
        e.stats.placements,
        e.stats.updates,
        e.stats.deletions,
        e.slices,
        e.total_units,
        e.live_fibers,
    )
}

fn yield_line(e: &YieldEvent) -> String {
    format!(
        "[weft] yield #{}: {} units this slice ({} total), {:.3}ms left",
        e.render_index,
        e.units,
        e.total_units,
        e.remaining.as_millis_f64(Timebase::MICROS),
    )
}

fn abandoned_line(e: &RenderAbandonedEvent) -> String {
    format!(
        "[weft] render #{} abandoned after {} units, {} fibers freed",
        e.render_index, e.units, e.freed_fibers,
    )
}

fn error_line(e: &RenderErrorEvent<'_>) -> String {
    format!(
        "[weft] render #{} failed during {}: {}",
        e.render_index,
        e.phase.as_str(),
        e.error,
    )
}

fn log(line: &str) {
    web_sys::console::log_1(&JsValue::from_str(line));
}

impl TraceSink for ConsoleSink {
    fn on_render_abandoned(&mut self, e: &RenderAbandonedEvent) {
        log(&abandoned_line(e));
    }

    fn on_yield(&mut self, e: &YieldEvent) {
        if self.verbose {
            log(&yield_line(e));
        }
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        log(&commit_line(e));
    }

    fn on_render_error(&mut self, e: &RenderErrorEvent<'_>) {
        web_sys::console::error_1(&JsValue::from_str(&error_line(e)));
    }
}
