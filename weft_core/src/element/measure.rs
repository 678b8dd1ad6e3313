// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two capabilities the engine borrows from outside: measuring leaf
//! content, and building a node's element tree.
//!
//! Both are called on worker threads, so both are `Send + Sync`, and both must
//! be free of side effects that the owning thread could observe.

use alloc::string::String;

use kurbo::Size;

use crate::dimension::SizeRange;
use crate::node::NodeId;

use super::Element;

/// Intrinsic measurement of leaf content (text, images, custom drawing).
pub trait Measure: Send + Sync {
    /// Returns the content's size for the given range.
    ///
    /// The engine clamps the result into `range`, so an implementation may
    /// return its natural size unconditionally.
    ///
    /// # Errors
    ///
    /// A failure is reported as a diagnostic and the leaf is laid out with a
    /// zero size. It never aborts the rest of the pass.
    fn measure(&self, range: SizeRange) -> Result<Size, MeasureError>;
}

impl<F> Measure for F
where
    F: Fn(SizeRange) -> Result<Size, MeasureError> + Send + Sync,
{
    fn measure(&self, range: SizeRange) -> Result<Size, MeasureError> {
        self(range)
    }
}

/// Content with a fixed natural size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntrinsicSize(pub Size);

impl Measure for IntrinsicSize {
    fn measure(&self, _range: SizeRange) -> Result<Size, MeasureError> {
        Ok(self.0)
    }
}

/// Error returned by a [`Measure`] implementation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("measurement failed: {message}")]
pub struct MeasureError {
    message: String,
}

impl MeasureError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builds the element tree for a node.
///
/// `children` are the node's child nodes at snapshot time, in order. The
/// returned tree embeds them with [`Element::node`]; referencing any other
/// node is reported as [`Diagnostic::UnknownNode`](crate::diagnostics::Diagnostic::UnknownNode).
pub trait ElementProvider: Send + Sync {
    /// Returns the element tree to lay out within `range`.
    fn element_for(&self, range: SizeRange, children: &[NodeId]) -> Element;
}

impl<F> ElementProvider for F
where
    F: Fn(SizeRange, &[NodeId]) -> Element + Send + Sync,
{
    fn element_for(&self, range: SizeRange, children: &[NodeId]) -> Element {
        self(range, children)
    }
}
