// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conditions reported alongside a layout.
//!
//! None of these stop a pass. The engine always produces a layout, records
//! what went wrong, and lets the commit deliver the record to the node that
//! owns the offending element through
//! [`ViewHierarchy::did_commit_layout`](crate::hierarchy::ViewHierarchy::did_commit_layout).

use alloc::string::String;

use crate::dimension::Axis;
use crate::element::{ElementRef, MeasureError};
use crate::node::NodeId;

/// A non-fatal layout condition.
///
/// `owner` is the nearest node whose element tree contains the offending
/// element, or `None` for a bare [`compute_layout`](crate::engine::compute_layout).
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// Stack children exceed the container and none of them can shrink.
    Overflow {
        /// Owning node.
        owner: Option<NodeId>,
        /// The overflowing stack.
        element: ElementRef,
        /// Main axis of the stack.
        axis: Axis,
        /// How far the children extend past the container.
        amount: f64,
    },
    /// A leaf's measure failed; a zero size was substituted.
    MeasurementFailed {
        /// Owning node.
        owner: Option<NodeId>,
        /// The leaf.
        element: ElementRef,
        /// What the measure reported.
        error: MeasureError,
    },
    /// An element produced an infinite size with no finite bound to clamp to.
    UnboundedSize {
        /// Owning node.
        owner: Option<NodeId>,
        /// The element.
        element: ElementRef,
        /// The unbounded axis.
        axis: Axis,
    },
    /// A ratio element with a ratio that is not positive.
    InvalidRatio {
        /// Owning node.
        owner: Option<NodeId>,
        /// The ratio element.
        element: ElementRef,
        /// The rejected ratio.
        ratio: f64,
    },
    /// An element tree referenced a node that is not a child of its owner.
    UnknownNode {
        /// Owning node.
        owner: Option<NodeId>,
        /// The node that was referenced.
        referenced: NodeId,
    },
    /// A pass panicked on a worker and produced no layout.
    PassFailed {
        /// Root of the failed pass.
        owner: Option<NodeId>,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl Diagnostic {
    /// Returns the node this diagnostic is delivered to.
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        match self {
            Self::Overflow { owner, .. }
            | Self::MeasurementFailed { owner, .. }
            | Self::UnboundedSize { owner, .. }
            | Self::InvalidRatio { owner, .. }
            | Self::UnknownNode { owner, .. }
            | Self::PassFailed { owner, .. } => *owner,
        }
    }

    /// Returns the fieldless kind, for traces and filtering.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Overflow { .. } => DiagnosticKind::Overflow,
            Self::MeasurementFailed { .. } => DiagnosticKind::MeasurementFailed,
            Self::UnboundedSize { .. } => DiagnosticKind::UnboundedSize,
            Self::InvalidRatio { .. } => DiagnosticKind::InvalidRatio,
            Self::UnknownNode { .. } => DiagnosticKind::UnknownNode,
            Self::PassFailed { .. } => DiagnosticKind::PassFailed,
        }
    }
}

/// The variant of a [`Diagnostic`] without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// [`Diagnostic::Overflow`].
    Overflow,
    /// [`Diagnostic::MeasurementFailed`].
    MeasurementFailed,
    /// [`Diagnostic::UnboundedSize`].
    UnboundedSize,
    /// [`Diagnostic::InvalidRatio`].
    InvalidRatio,
    /// [`Diagnostic::UnknownNode`].
    UnknownNode,
    /// [`Diagnostic::PassFailed`].
    PassFailed,
}

impl DiagnosticKind {
    /// A short name for logs and traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overflow => "overflow",
            Self::MeasurementFailed => "measurement-failed",
            Self::UnboundedSize => "unbounded-size",
            Self::InvalidRatio => "invalid-ratio",
            Self::UnknownNode => "unknown-node",
            Self::PassFailed => "pass-failed",
        }
    }
}
