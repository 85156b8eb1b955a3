// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//! Build and commit phases become duration slices; everything else becomes an
//! instant event.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use weft_core::time::Timebase;
use weft_core::trace::PhaseKind;

use crate::recorder::{RecordedEvent, decode};

fn phase_label(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Build => "Build",
        PhaseKind::Commit => "Commit",
    }
}

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`],
/// which must match the clock the recording was made with.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = ticks_to_us(record.timestamp, timebase);
        let render = record.render_index;
        let event = match &record.event {
            RecordedEvent::PhaseBegin(phase) => json!({
                "ph": "B",
                "name": phase_label(*phase),
                "cat": "Render",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": { "render_index": render }
            }),
            RecordedEvent::PhaseEnd { phase, units } => json!({
                "ph": "E",
                "name": phase_label(*phase),
                "cat": "Render",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": { "render_index": render, "units": units }
            }),
            RecordedEvent::RenderStart { has_current } => json!({
                "ph": "i",
                "name": "RenderStart",
                "cat": "Scheduler",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": { "render_index": render, "has_current": has_current }
            }),
            RecordedEvent::RenderAbandoned {
                units,
                freed_fibers,
            } => json!({
                "ph": "i",
                "name": "RenderAbandoned",
                "cat": "Scheduler",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "render_index": render,
                    "units": units,
                    "freed_fibers": freed_fibers,
                }
            }),
            RecordedEvent::Yield {
                units,
                total_units,
                remaining,
            } => json!({
                "ph": "i",
                "name": "Yield",
                "cat": "Scheduler",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "render_index": render,
                    "units": units,
                    "total_units": total_units,
                    "remaining_us": ticks_to_us(remaining.ticks(), timebase),
                }
            }),
            RecordedEvent::Commit {
                stats,
                slices,
                total_units,
                live_fibers,
            } => json!({
                "ph": "i",
                "name": "Commit",
                "cat": "Summary",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "render_index": render,
                    "placements": stats.placements,
                    "updates": stats.updates,
                    "deletions": stats.deletions,
                    "slices": slices,
                    "total_units": total_units,
                    "live_fibers": live_fibers,
                }
            }),
            RecordedEvent::RenderError { phase, message } => json!({
                "ph": "i",
                "name": "RenderError",
                "cat": "Summary",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "render_index": render,
                    "phase": phase.as_str(),
                    "message": message,
                }
            }),
            RecordedEvent::FiberEffect {
                fiber_index,
                fiber_generation,
                effect,
            } => json!({
                "ph": "i",
                "name": format!("{effect:?}"),
                "cat": "Rich",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "render_index": render,
                    "fiber": format!("{fiber_index}@gen{fiber_generation}"),
                }
            }),
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}
