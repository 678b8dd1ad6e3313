// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract for the view hierarchy that mirrors the node tree.
//!
//! Weft never owns views. A platform integration implements
//! [`ViewHierarchy`] over its native tree (UIKit views, DOM elements, a test
//! double) and receives every structural change and frame from
//! [`NodeTree::commit`](crate::node::NodeTree::commit), always on the thread
//! that owns the tree.
//!
//! # Commit loop pseudocode
//!
//! ```rust,ignore
//! fn on_idle(runtime: &mut LayoutRuntime<MyViews>) {
//!     // Mutate: edit the tree; nothing reaches the views yet.
//!     runtime.tree_mut().insert_child(list, row, 0)?;
//!
//!     // Request: schedule a pass for the root at the window size.
//!     runtime.request_layout(window_root, SizeRange::exact(window), Priority::High)?;
//!
//!     // Pump: dispatch passes to workers and commit finished ones.
//!     // The hierarchy sees inserts, removes and moves first, then frames.
//!     runtime.pump();
//! }
//! ```

use kurbo::Rect;

use crate::diagnostics::Diagnostic;
use crate::layout::Layout;
use crate::node::NodeId;

/// Receives committed structure and geometry.
///
/// Indices refer to the parent's child list as it stands when the call is
/// made, so a hierarchy that applies each call to a plain list ends up with
/// exactly the tree's child order.
pub trait ViewHierarchy {
    /// `child` was inserted into `parent` at `index`.
    fn insert(&mut self, parent: NodeId, child: NodeId, index: usize);

    /// `child` was removed from `parent` at `index`.
    fn remove(&mut self, parent: NodeId, child: NodeId, index: usize);

    /// `child` moved within `parent` from `from` to `to`.
    fn move_child(&mut self, parent: NodeId, child: NodeId, from: usize, to: usize);

    /// `node` has a new frame in its parent's coordinates.
    fn apply_frame(&mut self, node: NodeId, frame: Rect);

    /// Called once per node after all frames of the commit were applied,
    /// with the diagnostics its element tree produced.
    fn did_commit_layout(&mut self, node: NodeId, layout: &Layout, diagnostics: &[Diagnostic]) {
        _ = (node, layout, diagnostics);
    }
}
