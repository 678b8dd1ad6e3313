// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Worker pool and owning-thread driver for weft layouts.
//!
//! [`LayoutRuntime`] owns a [`NodeTree`](weft_core::node::NodeTree), a
//! [`LayoutScheduler`](weft_core::scheduler::LayoutScheduler), a rayon worker
//! pool, and the [`ViewHierarchy`](weft_core::hierarchy::ViewHierarchy) it
//! commits to. Mutate the tree, request layouts, and call
//! [`pump`](LayoutRuntime::pump) from the thread that owns the views:
//!
//! ```rust,ignore
//! let mut runtime = LayoutRuntime::new(views, RuntimeConfig::default())?;
//! let root = runtime.tree_mut().create_node();
//! runtime.tree_mut().set_provider(root, |range: SizeRange, children: &[NodeId]| {
//!     Stack::vertical().children(children.iter().map(|&c| Element::node(c))).into()
//! })?;
//! runtime.request_layout(root, SizeRange::exact(window), Priority::High)?;
//! runtime.run_until_idle(Duration::from_millis(100))?;
//! ```
//!
//! A pass that panics on a worker is caught, reported as a
//! [`Diagnostic::PassFailed`](weft_core::diagnostics::Diagnostic::PassFailed),
//! and retried up to [`RuntimeConfig::max_retries`] times.

mod config;
mod error;
mod runtime;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use runtime::{LayoutRuntime, PumpReport};
