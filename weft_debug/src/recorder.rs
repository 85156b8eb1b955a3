// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each stamped with the time it was
//! received. [`decode`] reads them back as an iterator of [`Record`].
//!
//! Core events carry no timestamps of their own. The default clock measures
//! nanoseconds since the recorder was created; pass [`Timebase::NANOS`] when
//! exporting such a recording.
//!
//! [`Timebase::NANOS`]: weft_core::time::Timebase::NANOS

use std::time::Instant;

use weft_core::commit::CommitStats;
use weft_core::fiber::EffectTag;
use weft_core::time::Duration;
use weft_core::trace::{
    CommitEvent, FiberEffectEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RenderAbandonedEvent, RenderErrorEvent, RenderStartEvent, TraceSink, YieldEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_RENDER_START: u8 = 1;
const TAG_RENDER_ABANDONED: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_YIELD: u8 = 5;
const TAG_COMMIT: u8 = 6;
const TAG_RENDER_ERROR: u8 = 7;
const TAG_FIBER_EFFECT: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
pub struct RecorderSink {
    buf: Vec<u8>,
    clock: Box<dyn FnMut() -> u64>,
}

impl std::fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSink")
            .field("bytes", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder timestamping events in nanoseconds since
    /// creation.
    #[must_use]
    pub fn new() -> Self {
        let start = Instant::now();
        Self::with_clock(move || u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    /// Creates an empty recorder that reads timestamps from `clock`.
    #[must_use]
    pub fn with_clock(clock: impl FnMut() -> u64 + 'static) -> Self {
        Self {
            buf: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn header(&mut self, tag: u8, render_index: u64) {
        let now = (self.clock)();
        self.write_u8(tag);
        self.write_u64(now);
        self.write_u64(render_index);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_str(&mut self, s: &str) {
        let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
        self.write_u32(len);
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Build => 0,
            PhaseKind::Commit => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_render_start(&mut self, e: &RenderStartEvent) {
        self.header(TAG_RENDER_START, e.render_index);
        self.write_u8(u8::from(e.has_current));
    }

    fn on_render_abandoned(&mut self, e: &RenderAbandonedEvent) {
        self.header(TAG_RENDER_ABANDONED, e.render_index);
        self.write_u64(e.units);
        self.write_usize(e.freed_fibers);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.header(TAG_PHASE_BEGIN, e.render_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.header(TAG_PHASE_END, e.render_index);
        self.write_phase(e.phase);
        self.write_u32(e.units);
    }

    fn on_yield(&mut self, e: &YieldEvent) {
        self.header(TAG_YIELD, e.render_index);
        self.write_u32(e.units);
        self.write_u64(e.total_units);
        self.write_u64(e.remaining.ticks());
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.header(TAG_COMMIT, e.render_index);
        self.write_usize(e.stats.placements);
        self.write_usize(e.stats.updates);
        self.write_usize(e.stats.deletions);
        self.write_u32(e.slices);
        self.write_u64(e.total_units);
        self.write_usize(e.live_fibers);
    }

    fn on_render_error(&mut self, e: &RenderErrorEvent<'_>) {
        self.header(TAG_RENDER_ERROR, e.render_index);
        self.write_phase(e.phase);
        self.write_str(&e.error.to_string());
    }

    fn on_fiber_effect(&mut self, e: &FiberEffectEvent) {
        self.header(TAG_FIBER_EFFECT, e.render_index);
        self.write_u32(e.fiber.index());
        self.write_u32(e.fiber.generation());
        self.write_u8(match e.effect {
            EffectTag::Placement => 0,
            EffectTag::Update => 1,
            EffectTag::Deletion => 2,
        });
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// One decoded record: when it was received, which render it belongs to,
/// and the event itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Clock reading when the event was recorded.
    pub timestamp: u64,
    /// Render counter.
    pub render_index: u64,
    /// The event payload.
    pub event: RecordedEvent,
}

/// A decoded event payload from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`RenderStartEvent`].
    RenderStart {
        /// Whether a committed tree was diffed against.
        has_current: bool,
    },
    /// A [`RenderAbandonedEvent`].
    RenderAbandoned {
        /// Work units the abandoned build completed.
        units: u64,
        /// Fibers released with it.
        freed_fibers: u64,
    },
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseKind),
    /// A [`PhaseEndEvent`].
    PhaseEnd {
        /// Which phase ended.
        phase: PhaseKind,
        /// Work units performed during the phase.
        units: u32,
    },
    /// A [`YieldEvent`].
    Yield {
        /// Units performed in the slice.
        units: u32,
        /// Units performed since the render started.
        total_units: u64,
        /// Deadline budget that triggered the yield.
        remaining: Duration,
    },
    /// A [`CommitEvent`].
    Commit {
        /// Effects applied.
        stats: CommitStats,
        /// Time slices the build took.
        slices: u32,
        /// Work units the build took.
        total_units: u64,
        /// Fibers alive after the commit.
        live_fibers: u64,
    },
    /// A [`RenderErrorEvent`], with the error rendered to text.
    RenderError {
        /// Phase the error surfaced in.
        phase: PhaseKind,
        /// The error's display text.
        message: String,
    },
    /// A [`FiberEffectEvent`].
    FiberEffect {
        /// Slot index of the fiber.
        fiber_index: u32,
        /// Generation of the fiber.
        fiber_generation: u32,
        /// What was applied.
        effect: EffectTag,
    },
}

impl RecordedEvent {
    /// Short event name, as used in exports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RenderStart { .. } => "RenderStart",
            Self::RenderAbandoned { .. } => "RenderAbandoned",
            Self::PhaseBegin(_) => "PhaseBegin",
            Self::PhaseEnd { .. } => "PhaseEnd",
            Self::Yield { .. } => "Yield",
            Self::Commit { .. } => "Commit",
            Self::RenderError { .. } => "RenderError",
            Self::FiberEffect { .. } => "FiberEffect",
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
///
/// Iteration stops at the first truncated or unknown record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        Some(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Build,
            _ => PhaseKind::Commit,
        })
    }

    fn read_effect(&mut self) -> Option<EffectTag> {
        Some(match self.read_u8()? {
            0 => EffectTag::Placement,
            1 => EffectTag::Update,
            _ => EffectTag::Deletion,
        })
    }

    fn decode_event(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_RENDER_START => RecordedEvent::RenderStart {
                has_current: self.read_u8()? != 0,
            },
            TAG_RENDER_ABANDONED => RecordedEvent::RenderAbandoned {
                units: self.read_u64()?,
                freed_fibers: self.read_u64()?,
            },
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin(self.read_phase()?),
            TAG_PHASE_END => RecordedEvent::PhaseEnd {
                phase: self.read_phase()?,
                units: self.read_u32()?,
            },
            TAG_YIELD => RecordedEvent::Yield {
                units: self.read_u32()?,
                total_units: self.read_u64()?,
                remaining: Duration(self.read_u64()?),
            },
            TAG_COMMIT => RecordedEvent::Commit {
                stats: CommitStats {
                    placements: self.read_usize()?,
                    updates: self.read_usize()?,
                    deletions: self.read_usize()?,
                },
                slices: self.read_u32()?,
                total_units: self.read_u64()?,
                live_fibers: self.read_u64()?,
            },
            TAG_RENDER_ERROR => RecordedEvent::RenderError {
                phase: self.read_phase()?,
                message: self.read_string()?,
            },
            TAG_FIBER_EFFECT => RecordedEvent::FiberEffect {
                fiber_index: self.read_u32()?,
                fiber_generation: self.read_u32()?,
                effect: self.read_effect()?,
            },
            _ => return None,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let tag = self.read_u8()?;
        let timestamp = self.read_u64()?;
        let render_index = self.read_u64()?;
        let event = self.decode_event(tag)?;
        Some(Record {
            timestamp,
            render_index,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use weft_core::element::Element;
    use weft_core::error::{ConfigurationError, RenderError};
    use weft_core::reconciler::Reconciler;
    use weft_core::scheduler::Unbounded;
    use weft_core::testing::{CountdownDeadline, RecordingHost};
    use weft_core::trace::Tracer;

    use super::*;

    fn stepping_clock() -> impl FnMut() -> u64 {
        let t = Rc::new(Cell::new(0_u64));
        move || {
            let now = t.get();
            t.set(now + 10);
            now
        }
    }

    #[test]
    fn records_decode_in_order_with_timestamps() {
        let mut rec = RecorderSink::with_clock(stepping_clock());
        rec.on_render_start(&RenderStartEvent {
            render_index: 1,
            has_current: false,
        });
        rec.on_yield(&YieldEvent {
            render_index: 1,
            units: 3,
            total_units: 3,
            remaining: Duration(200),
        });
        rec.on_render_error(&RenderErrorEvent {
            render_index: 1,
            phase: PhaseKind::Build,
            error: &RenderError::from(ConfigurationError::EmptyTag),
        });

        let records: Vec<Record> = decode(rec.as_bytes()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].timestamp, 0);
        assert_eq!(records[1].timestamp, 10);
        assert_eq!(records[2].timestamp, 20);
        assert!(records.iter().all(|r| r.render_index == 1));
        assert_eq!(
            records[1].event,
            RecordedEvent::Yield {
                units: 3,
                total_units: 3,
                remaining: Duration(200),
            }
        );
        assert_eq!(
            records[2].event,
            RecordedEvent::RenderError {
                phase: PhaseKind::Build,
                message: "element has an empty tag name".to_string(),
            }
        );
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::with_clock(stepping_clock());
        rec.on_phase_begin(&PhaseBeginEvent {
            render_index: 0,
            phase: PhaseKind::Commit,
        });
        rec.on_phase_end(&PhaseEndEvent {
            render_index: 0,
            phase: PhaseKind::Commit,
            units: 0,
        });
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 2];
        let records: Vec<Record> = decode(cut).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, RecordedEvent::PhaseBegin(PhaseKind::Commit));
    }

    #[test]
    fn records_a_live_render() {
        let mut rec = RecorderSink::with_clock(stepping_clock());
        let mut reconciler = Reconciler::new(RecordingHost::new());
        let container = reconciler.host_mut().create_container();

        let app = Element::new("ul")
            .child(Element::new("li").text_child("a"))
            .child(Element::new("li").text_child("b"));
        {
            let mut tracer = Tracer::new(&mut rec);
            reconciler.render_traced(app, container, &mut tracer);
            let deadline = CountdownDeadline::new(3);
            reconciler.work_loop_traced(&deadline, &mut tracer).unwrap();
            reconciler.work_loop_traced(&Unbounded, &mut tracer).unwrap();
        }

        let records: Vec<Record> = decode(rec.as_bytes()).collect();
        let names: Vec<&str> = records.iter().map(|r| r.event.name()).collect();
        assert_eq!(names.first(), Some(&"RenderStart"));
        assert!(names.contains(&"Yield"), "got: {names:?}");
        let effects = names.iter().filter(|n| **n == "FiberEffect").count();
        // ul, two li and two text nodes.
        assert_eq!(effects, 5);
        let Some(RecordedEvent::Commit { stats, slices, .. }) = records
            .iter()
            .map(|r| &r.event)
            .find(|e| matches!(e, RecordedEvent::Commit { .. }))
        else {
            panic!("no commit recorded: {names:?}");
        };
        assert_eq!(stats.placements, 5);
        assert_eq!(*slices, 2);
    }
}
