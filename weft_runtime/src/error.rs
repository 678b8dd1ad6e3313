// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime errors.

use weft_core::error::StructuralError;

/// Errors returned by [`LayoutRuntime`](crate::LayoutRuntime).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The worker pool could not be started.
    #[error("failed to build layout worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    /// A tree operation was rejected.
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// The result queue closed while passes were outstanding.
    #[error("layout result queue disconnected")]
    Disconnected,
}
