// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types, layout engine, and node tree for asynchronous layout.
//!
//! `weft_core` is `no_std` + `alloc`. It contains everything that does not
//! need threads: the dimension model, the layout elements and their compute
//! functions, the node tree with its generation counters, the transaction
//! committer, and the bookkeeping half of the scheduler. The `weft_runtime`
//! crate adds the worker pool and the owning-thread driver on top.
//!
//! # Architecture
//!
//! ```text
//!  owning thread                                  worker threads
//!  ─────────────                                  ──────────────
//!  NodeTree ── mutate ──▶ generation++ (node + ancestors)
//!     │                   LAYOUT dirty (eager, child → parent)
//!     │
//!     ├── snapshot(root) ──▶ TreeSnapshot ─────▶ compute_pass()
//!     │                                             │ element_for(range)
//!     │                                             │ Measure::measure()
//!     │                                             ▼
//!     │                   PassOutput { records stamped with generation }
//!     │                                             │
//!  LayoutScheduler ◀── complete(ticket) ◀───────────┘   (bounded queue)
//!     │ Accept / Superseded
//!     ▼
//!  Transaction ── commit() ──▶ ViewHierarchy
//!                     removals ▸ moves ▸ inserts ▸ frames ▸ did_commit_layout
//! ```
//!
//! # Modules
//!
//! - [`dimension`]: points, percentages, auto, and [`SizeRange`](dimension::SizeRange).
//! - [`style`]: per-element sizing and flex properties.
//! - [`element`]: the [`Element`](element::Element) sum type and the
//!   [`Measure`](element::Measure) / [`ElementProvider`](element::ElementProvider) seams.
//! - [`engine`]: [`compute_layout`](engine::compute_layout) and
//!   [`compute_pass`](engine::compute_pass).
//! - [`layout`]: the immutable [`Layout`](layout::Layout) result tree.
//! - [`diagnostics`]: non-fatal conditions reported alongside a layout.
//! - [`node`]: the [`NodeTree`](node::NodeTree) store, snapshots, and commit.
//! - [`transaction`]: transactions and the child-list diff.
//! - [`hierarchy`]: the [`ViewHierarchy`](hierarchy::ViewHierarchy) commit target.
//! - [`scheduler`]: request queue, coalescing, and single-flight tracking.
//! - [`dirty`]: dirty-tracking channel constants.
//! - [`error`]: structural errors.
//! - [`time`]: host time and durations for trace timestamps.
//! - [`trace`]: tracing sink trait and zero-cost tracer wrapper.

#![no_std]

extern crate alloc;

pub mod diagnostics;
pub mod dimension;
pub mod dirty;
pub mod element;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod node;
pub mod scheduler;
pub mod style;
pub mod time;
pub mod trace;
pub mod transaction;
