// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reconciler wired to an idle scheduler.
//!
//! [`Root`] is the fire-and-forget entry point: [`Root::render`] records the
//! request and makes sure an idle callback is queued. Each callback runs one
//! slice of the work loop and queues another while the build is unfinished.
//! At most one callback is queued per root at any time.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use crate::element::Element;
use crate::error::RenderError;
use crate::host::Host;
use crate::reconciler::Reconciler;
use crate::scheduler::{Deadline, IdleScheduler, WorkLoopConfig, WorkStatus};
use crate::trace::{TraceSink, Tracer};

struct Shared<H: Host> {
    reconciler: Reconciler<H>,
    scheduled: bool,
    sink: Option<Box<dyn TraceSink>>,
}

impl<H: Host> Shared<H> {
    fn tracer(&mut self) -> (&mut Reconciler<H>, Tracer<'_>) {
        let tracer = match &mut self.sink {
            Some(sink) => Tracer::new(sink.as_mut()),
            None => Tracer::none(),
        };
        (&mut self.reconciler, tracer)
    }
}

/// Shared handle to a [`Reconciler`] driven by an [`IdleScheduler`].
///
/// Clones refer to the same root.
pub struct Root<H: Host, S> {
    shared: Rc<RefCell<Shared<H>>>,
    scheduler: S,
}

impl<H: Host, S: Clone> Clone for Root<H, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<H: Host, S> core::fmt::Debug for Root<H, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Root").finish_non_exhaustive()
    }
}

impl<H, S> Root<H, S>
where
    H: Host + 'static,
    S: IdleScheduler + Clone + 'static,
{
    /// Creates a root with the default [`WorkLoopConfig`].
    #[must_use]
    pub fn new(host: H, scheduler: S) -> Self {
        Self::with_config(host, scheduler, WorkLoopConfig::default())
    }

    /// Creates a root with the given configuration.
    #[must_use]
    pub fn with_config(host: H, scheduler: S, config: WorkLoopConfig) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                reconciler: Reconciler::with_config(host, config),
                scheduled: false,
                sink: None,
            })),
            scheduler,
        }
    }

    /// Routes trace events of this root to `sink`.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        self.shared.borrow_mut().sink = Some(sink);
    }

    /// Requests that `container` come to hold exactly `element`, building it
    /// during upcoming idle periods. Replaces any build still in flight.
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`with_reconciler`](Self::with_reconciler).
    pub fn render(&self, element: Element, container: H::Node) {
        let needs_callback = {
            let mut shared = self.shared.borrow_mut();
            let (reconciler, mut tracer) = shared.tracer();
            reconciler.render_traced(element, container, &mut tracer);
            !core::mem::replace(&mut shared.scheduled, true)
        };
        if needs_callback {
            schedule(Rc::clone(&self.shared), self.scheduler.clone());
        }
    }

    /// Runs `f` with the reconciler, e.g. to inspect the host.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly.
    pub fn with_reconciler<R>(&self, f: impl FnOnce(&mut Reconciler<H>) -> R) -> R {
        f(&mut self.shared.borrow_mut().reconciler)
    }

    /// Whether an idle callback is queued for this root.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.shared.borrow().scheduled
    }
}

fn schedule<H, S>(shared: Rc<RefCell<Shared<H>>>, scheduler: S)
where
    H: Host + 'static,
    S: IdleScheduler + Clone + 'static,
{
    let next = scheduler.clone();
    scheduler.schedule_idle_work(Box::new(
        move |deadline: &dyn Deadline| -> Result<WorkStatus, RenderError> {
            let status = {
                let mut guard = shared.borrow_mut();
                guard.scheduled = false;
                let (reconciler, mut tracer) = guard.tracer();
                reconciler.work_loop_traced(deadline, &mut tracer)?
            };
            if status.has_more_work() {
                shared.borrow_mut().scheduled = true;
                schedule(shared, next);
            }
            Ok(status)
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountdownDeadline, FixedDeadline, ManualIdleScheduler, RecordingHost};

    fn root() -> (Root<RecordingHost, ManualIdleScheduler>, ManualIdleScheduler) {
        let sched = ManualIdleScheduler::new();
        (Root::new(RecordingHost::new(), sched.clone()), sched)
    }

    fn app() -> Element {
        Element::new("ul")
            .child(Element::new("li").text_child("a"))
            .child(Element::new("li").text_child("b"))
    }

    #[test]
    fn render_queues_a_single_callback() {
        let (root, sched) = root();
        let container = root.with_reconciler(|r| r.host_mut().create_container());
        root.render(app(), container);
        root.render(app(), container);
        assert_eq!(sched.pending(), 1);
        assert!(root.is_scheduled());
    }

    #[test]
    fn callback_reschedules_until_committed() {
        let (root, sched) = root();
        let container = root.with_reconciler(|r| r.host_mut().create_container());
        root.render(app(), container);

        let mut slices = 0;
        loop {
            let status = sched
                .run_next(&CountdownDeadline::new(2))
                .expect("a callback is queued")
                .unwrap();
            slices += 1;
            if let WorkStatus::Committed(stats) = status {
                assert_eq!(stats.placements, 5);
                break;
            }
            assert_eq!(sched.pending(), 1);
        }
        // root, ul, li, "a", li, "b": six units, two per slice.
        assert_eq!(slices, 3);
        assert_eq!(sched.pending(), 0);
        assert!(!root.is_scheduled());
        root.with_reconciler(|r| {
            assert_eq!(
                r.host().inner_html(container),
                "<ul><li>a</li><li>b</li></ul>"
            );
        });
    }

    #[test]
    fn errors_reach_the_caller_and_stop_rescheduling() {
        let (root, sched) = root();
        let container = root.with_reconciler(|r| r.host_mut().create_container());
        root.render(Element::new("not a tag"), container);

        let result = sched.run_next(&FixedDeadline::UNBOUNDED).unwrap();
        assert!(matches!(result, Err(RenderError::Configuration(_))));
        assert_eq!(sched.pending(), 0);
        assert!(root.with_reconciler(|r| r.current_root().is_none()));
    }

    #[test]
    fn render_after_commit_schedules_again() {
        let (root, sched) = root();
        let container = root.with_reconciler(|r| r.host_mut().create_container());
        root.render(app(), container);
        sched.run_until_idle(&FixedDeadline::UNBOUNDED).unwrap();
        root.render(Element::new("p"), container);
        assert_eq!(sched.pending(), 1);
        sched.run_until_idle(&FixedDeadline::UNBOUNDED).unwrap();
        root.with_reconciler(|r| assert_eq!(r.host().inner_html(container), "<p></p>"));
    }
}
