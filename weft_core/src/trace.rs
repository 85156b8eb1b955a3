// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for renders.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! reconciler calls as a render moves through its phases. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) adds [`FiberEffectEvent`], one per effect
//!   applied during commit.

use crate::commit::CommitStats;
use crate::error::RenderError;
#[cfg(feature = "trace-rich")]
use crate::fiber::{EffectTag, FiberId};
use crate::time::Duration;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Building the work-in-progress tree, one unit at a time. A render has
    /// one build phase per time slice.
    Build,
    /// Applying effects to the host tree.
    Commit,
}

impl PhaseKind {
    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Commit => "commit",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStartEvent {
    /// Monotonic render counter.
    pub render_index: u64,
    /// Whether a previous committed tree is diffed against.
    pub has_current: bool,
}

/// Emitted when a render request replaces a build that never committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderAbandonedEvent {
    /// Counter of the abandoned render.
    pub render_index: u64,
    /// Work units it had completed.
    pub units: u64,
    /// Fibers released with it.
    pub freed_fibers: usize,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBeginEvent {
    /// Render counter.
    pub render_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseEndEvent {
    /// Render counter.
    pub render_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Work units performed during the phase (0 for commit).
    pub units: u32,
}

/// Emitted when the work loop hands control back before finishing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YieldEvent {
    /// Render counter.
    pub render_index: u64,
    /// Units performed in this slice.
    pub units: u32,
    /// Units performed since the render started.
    pub total_units: u64,
    /// Deadline budget that triggered the yield.
    pub remaining: Duration,
}

/// Emitted after a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitEvent {
    /// Render counter.
    pub render_index: u64,
    /// Effects applied.
    pub stats: CommitStats,
    /// Time slices the build took.
    pub slices: u32,
    /// Work units the build took.
    pub total_units: u64,
    /// Fibers alive after the previous tree was released.
    pub live_fibers: usize,
}

/// Emitted when a render is aborted by an error.
#[derive(Clone, Copy, Debug)]
pub struct RenderErrorEvent<'a> {
    /// Render counter.
    pub render_index: u64,
    /// Phase the error surfaced in.
    pub phase: PhaseKind,
    /// The error returned to the caller.
    pub error: &'a RenderError,
}

/// One effect applied during commit.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiberEffectEvent {
    /// Render counter.
    pub render_index: u64,
    /// Fiber the effect belongs to.
    pub fiber: FiberId,
    /// What was applied.
    pub effect: EffectTag,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the reconciler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a render is requested.
    fn on_render_start(&mut self, e: &RenderStartEvent) {
        _ = e;
    }

    /// Called when a pending build is dropped in favor of a newer render.
    fn on_render_abandoned(&mut self, e: &RenderAbandonedEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when the work loop yields.
    fn on_yield(&mut self, e: &YieldEvent) {
        _ = e;
    }

    /// Called after a commit.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called when a render fails.
    fn on_render_error(&mut self, e: &RenderErrorEvent<'_>) {
        _ = e;
    }

    /// Called per applied effect (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_fiber_effect(&mut self, e: &FiberEffectEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RenderStartEvent`].
    #[inline]
    pub fn render_start(&mut self, e: &RenderStartEvent) {
        dispatch!(self, on_render_start, e);
    }

    /// Emits a [`RenderAbandonedEvent`].
    #[inline]
    pub fn render_abandoned(&mut self, e: &RenderAbandonedEvent) {
        dispatch!(self, on_render_abandoned, e);
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        dispatch!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        dispatch!(self, on_phase_end, e);
    }

    /// Emits a [`YieldEvent`].
    #[inline]
    pub fn yielded(&mut self, e: &YieldEvent) {
        dispatch!(self, on_yield, e);
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        dispatch!(self, on_commit, e);
    }

    /// Emits a [`RenderErrorEvent`].
    #[inline]
    pub fn render_error(&mut self, e: &RenderErrorEvent<'_>) {
        dispatch!(self, on_render_error, e);
    }

    /// Emits a [`FiberEffectEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn fiber_effect(&mut self, e: &FiberEffectEvent) {
        if let Some(s) = &mut self.sink {
            s.on_fiber_effect(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
