// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The node tree tracks "needs layout" with [`understory_dirty`]. A layout is
//! a function of the whole subtree, so invalidation runs upward: every node
//! has a [`LAYOUT`] dependency edge to each of its children, and marking a
//! node with [`EagerPolicy`](understory_dirty::EagerPolicy) marks every
//! ancestor up to the root in the same call.
//!
//! # Consumption
//!
//! [`NodeTree::take_needs_layout`](crate::node::NodeTree::take_needs_layout)
//! drains the channel. The runtime uses the drained set to re-request layout
//! for dirty roots; nothing else reads dirty state.

use understory_dirty::Channel;

/// Style, content or children changed; the node and its ancestors need
/// layout.
pub const LAYOUT: Channel = Channel::new(0);
