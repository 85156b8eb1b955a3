// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental fiber reconciler with cooperative scheduling.
//!
//! `weft_core` turns declarative descriptions of a UI tree into the minimal
//! set of mutations against a host rendering tree. Build work is split into
//! small units that run in idle time and can be interrupted between any two
//! units; the resulting mutations are applied in one uninterrupted commit.
//! It is `no_std` compatible (with `alloc`) and stores fibers in a
//! struct-of-arrays arena addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Element tree ──► Reconciler::render() ──► work-in-progress root
//!                                                   │
//!                 ┌─────────────────────────────────┘
//!                 ▼
//!   Reconciler::work_loop(deadline) ──► perform_unit_of_work()
//!        │        ▲                        └─► reconcile_children()
//!        │        └── Yielded: resume at next_unit
//!        ▼
//!   commit_root() ──► update_dom() / Host::append_child / remove_child
//!        │
//!        ▼
//!   work-in-progress tree becomes current
//! ```
//!
//! **[`element`]**: immutable element descriptions and their builders.
//!
//! **[`fiber`]**: struct-of-arrays fiber arena with generational handles.
//!
//! **[`reconciler`]**: render requests, the work loop and the positional
//! child diff.
//!
//! **[`commit`]**: deletions first, then a pre-order walk applying
//! placements and updates.
//!
//! **[`props`]**: attribute and listener diffing for one node.
//!
//! **[`host`]**: the [`Host`](host::Host) trait platform backends implement.
//!
//! **[`scheduler`]**: [`Deadline`](scheduler::Deadline),
//! [`IdleScheduler`](scheduler::IdleScheduler) and work loop configuration.
//!
//! **[`root`]**: a reconciler wired to an idle scheduler.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render instrumentation, with the zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **[`time`]**: tick-based durations and timebases.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "testing")] {
//! use weft_core::element::Element;
//! use weft_core::reconciler::Reconciler;
//! use weft_core::testing::RecordingHost;
//!
//! let mut reconciler = Reconciler::new(RecordingHost::new());
//! let container = reconciler.host_mut().create_container();
//!
//! reconciler.render(Element::new("h1").text_child("Hello"), container);
//! reconciler.flush().unwrap();
//! assert_eq!(reconciler.host().inner_html(container), "<h1>Hello</h1>");
//! # }
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-fiber
//!   effect events.
//! - `testing` (disabled by default): Exposes the `testing` doubles.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod commit;
pub mod element;
pub mod error;
pub mod fiber;
pub mod host;
pub mod props;
pub mod reconciler;
pub mod root;
pub mod scheduler;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod time;
pub mod trace;
