// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is the unit that owns a view and a layout. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: a parent and an ordered child list.
//! - **Content** set by the caller: [`style`](NodeTree::set_style), an
//!   [`ElementProvider`](crate::element::ElementProvider) that builds the
//!   node's element tree, or a [`Measure`](crate::element::Measure) for leaf
//!   nodes.
//! - **Layout state**: a [`Generation`], a [`NodeState`], the
//!   [`CommittedLayout`], and a small cache of recent results.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Passes
//!
//! Workers never see the tree. [`NodeTree::begin_pass`] copies the subtree
//! under a root into an immutable [`TreeSnapshot`], which
//! [`compute_pass`](crate::engine::compute_pass) lays out anywhere. The
//! result only reaches the tree through [`NodeTree::commit`], which rejects
//! every record whose generation is no longer current.

mod cache;
mod commit;
mod id;
mod snapshot;
mod store;
mod traverse;

pub use cache::CachedLayout;
pub use commit::CommitReport;
pub use id::{Generation, INVALID, NodeId};
pub use snapshot::{NodeSnapshot, TreeSnapshot};
pub use store::{CommittedLayout, NodeState, NodeTree};
pub use traverse::{Ancestors, Children};
