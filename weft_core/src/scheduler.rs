// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative scheduling contract.
//!
//! The engine never decides on its own when to run. A host environment hands
//! it idle time through an [`IdleScheduler`]; each idle period comes with a
//! [`Deadline`] the work loop polls between units of work. When the deadline
//! reports less than [`WorkLoopConfig::yield_threshold`] remaining, the loop
//! returns [`WorkStatus::Yielded`] and expects to be called again later.

use alloc::boxed::Box;

use crate::commit::CommitStats;
use crate::error::RenderError;
use crate::time::Duration;

/// Remaining budget of the current idle period.
pub trait Deadline {
    /// Time left before the host wants control back, in host ticks.
    fn time_remaining(&self) -> Duration;
}

/// A deadline that never runs out.
///
/// Used by [`Reconciler::flush`](crate::reconciler::Reconciler::flush) to
/// drain pending work in one go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Callback run once the host has idle time.
///
/// Its result is handed back to whatever invoked it; errors are not retried.
pub type IdleCallback = Box<dyn FnOnce(&dyn Deadline) -> Result<WorkStatus, RenderError>>;

/// Schedules callbacks for the host's next idle period.
///
/// Implementations must not invoke `callback` from inside
/// `schedule_idle_work`; it runs later, from the host's event loop.
pub trait IdleScheduler {
    /// Requests that `callback` run during a future idle period.
    fn schedule_idle_work(&self, callback: IdleCallback);
}

/// Outcome of one call to the work loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// There was nothing to do.
    Idle,
    /// The deadline ran short; work remains and resumes on the next call.
    Yielded,
    /// The build finished and the new tree was committed.
    Committed(CommitStats),
}

impl WorkStatus {
    /// Whether the loop must be called again to finish the current render.
    #[must_use]
    pub const fn has_more_work(self) -> bool {
        matches!(self, Self::Yielded)
    }
}

/// Work loop tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkLoopConfig {
    /// The loop yields once the deadline reports strictly less than this.
    pub yield_threshold: Duration,
}

impl WorkLoopConfig {
    /// Browser preset: yield with under 1 ms left, in microsecond ticks.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            yield_threshold: Duration(1_000),
        }
    }

    /// Never yields early; each call runs until the build is done.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            yield_threshold: Duration::ZERO,
        }
    }

    /// Whether a deadline with `remaining` left should end the slice.
    #[must_use]
    pub fn should_yield(&self, remaining: Duration) -> bool {
        remaining < self.yield_threshold
    }
}

impl Default for WorkLoopConfig {
    fn default() -> Self {
        Self::web()
    }
}
