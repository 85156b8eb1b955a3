// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Deadline
//! budgets are converted to microseconds using a [`Timebase`].

use std::io::Write;

use weft_core::time::Timebase;
use weft_core::trace::{
    CommitEvent, FiberEffectEvent, PhaseBeginEvent, PhaseEndEvent, RenderAbandonedEvent,
    RenderErrorEvent, RenderStartEvent, TraceSink, YieldEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
    effects: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), timebase)
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self::with_writer(writer, timebase)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self {
            writer,
            timebase,
            effects: false,
        }
    }

    /// Also prints one line per effect applied during commit.
    #[must_use]
    pub fn with_effects(mut self) -> Self {
        self.effects = true;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_render_start(&mut self, e: &RenderStartEvent) {
        let base = if e.has_current { "diff" } else { "fresh" };
        let _ = writeln!(self.writer, "[render] #{} {base}", e.render_index);
    }

    fn on_render_abandoned(&mut self, e: &RenderAbandonedEvent) {
        let _ = writeln!(
            self.writer,
            "[abandon] #{} after {} units, freed {} fibers",
            e.render_index, e.units, e.freed_fibers,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] #{} {}",
            e.render_index,
            e.phase.as_str(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] #{} {} units={}",
            e.render_index,
            e.phase.as_str(),
            e.units,
        );
    }

    fn on_yield(&mut self, e: &YieldEvent) {
        let remaining = if e.remaining.ticks() == u64::MAX {
            "unbounded".to_string()
        } else {
            format!("{:.1}µs", self.ticks_to_us(e.remaining.ticks()))
        };
        let _ = writeln!(
            self.writer,
            "[yield] #{} units={} total={} remaining={remaining}",
            e.render_index, e.units, e.total_units,
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] #{} placed={} updated={} deleted={} slices={} units={} live={}",
            e.render_index,
            e.stats.placements,
            e.stats.updates,
            e.stats.deletions,
            e.slices,
            e.total_units,
            e.live_fibers,
        );
    }

    fn on_render_error(&mut self, e: &RenderErrorEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[error] #{} during {}: {}",
            e.render_index,
            e.phase.as_str(),
            e.error,
        );
    }

    fn on_fiber_effect(&mut self, e: &FiberEffectEvent) {
        if self.effects {
            let _ = writeln!(
                self.writer,
                "[effect] #{} {:?} {:?}",
                e.render_index, e.fiber, e.effect,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::element::Element;
    use weft_core::reconciler::Reconciler;
    use weft_core::testing::RecordingHost;
    use weft_core::time::Duration;
    use weft_core::trace::Tracer;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn pretty_print_yield() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::MICROS);
        sink.on_yield(&YieldEvent {
            render_index: 2,
            units: 5,
            total_units: 12,
            remaining: Duration(750),
        });
        let output = output(sink);
        assert_eq!(output, "[yield] #2 units=5 total=12 remaining=750.0µs\n");
    }

    #[test]
    fn pretty_print_full_render() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS);
        let mut reconciler = Reconciler::new(RecordingHost::new());
        let container = reconciler.host_mut().create_container();
        {
            let mut tracer = Tracer::new(&mut sink);
            reconciler.render_traced(Element::new("p").text_child("hi"), container, &mut tracer);
            reconciler
                .work_loop_traced(&weft_core::scheduler::Unbounded, &mut tracer)
                .unwrap();
        }
        let output = output(sink);
        assert!(output.starts_with("[render] #"), "got: {output}");
        assert!(output.contains("[phase:begin]"), "got: {output}");
        assert!(
            output.contains("placed=2 updated=0 deleted=0 slices=1"),
            "got: {output}"
        );
        assert!(!output.contains("[effect]"), "got: {output}");
    }

    #[test]
    fn effects_are_opt_in() {
        let mut sink =
            PrettyPrintSink::with_writer(Vec::<u8>::new(), Timebase::NANOS).with_effects();
        let mut reconciler = Reconciler::new(RecordingHost::new());
        let container = reconciler.host_mut().create_container();
        {
            let mut tracer = Tracer::new(&mut sink);
            reconciler.render_traced(Element::new("p"), container, &mut tracer);
            reconciler
                .work_loop_traced(&weft_core::scheduler::Unbounded, &mut tracer)
                .unwrap();
        }
        let output = output(sink);
        assert_eq!(output.matches("[effect]").count(), 1, "got: {output}");
        assert!(output.contains("Placement"), "got: {output}");
    }
}
