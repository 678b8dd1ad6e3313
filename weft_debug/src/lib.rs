// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, Chrome trace export, and layout dumps for
//! weft diagnostics.
//!
//! The sinks implement [`TraceSink`](weft_core::trace::TraceSink) and plug
//! into [`LayoutRuntime::with_sink`]:
//!
//! - [`pretty::PrettyPrintSink`] writes one human-readable line per event.
//! - [`recorder::RecorderSink`] records compactly; [`recorder::decode`]
//!   plays a recording back.
//! - [`chrome::export`] turns recorded bytes into Chrome Trace Event Format
//!   JSON.
//!
//! [`describe::describe`] dumps a [`Layout`](weft_core::layout::Layout) tree
//! as indented text, and [`mirror::MirrorHierarchy`] is an in-memory
//! [`ViewHierarchy`](weft_core::hierarchy::ViewHierarchy) for tests.
//!
//! [`LayoutRuntime::with_sink`]: https://docs.rs/weft_runtime

pub mod chrome;
pub mod describe;
pub mod mirror;
pub mod pretty;
pub mod recorder;
