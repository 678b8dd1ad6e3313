// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing for the request → dispatch → commit pipeline.
//!
//! A [`TraceSink`] has one method per pipeline event and each one defaults
//! to doing nothing. The runtime emits through a [`Tracer`], which is empty
//! unless the `trace` feature is enabled; with the feature, an untraced
//! runtime pays one `Option` check per event.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::dimension::SizeRange;
use crate::node::{CommitReport, NodeId};
use crate::scheduler::{Completion, PassId, Priority, RequestOutcome};
use crate::time::HostTime;
use crate::transaction::TransactionId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a finished pass, or part of one, was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// A newer pass for the same root was dispatched.
    Superseded,
    /// The tree changed after the snapshot; the root is requeued.
    Stale,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when layout is requested for a node.
#[derive(Clone, Copy, Debug)]
pub struct RequestEvent {
    /// The requested root.
    pub node: NodeId,
    /// Range the root will be laid out in.
    pub range: SizeRange,
    /// Requested priority.
    pub priority: Priority,
    /// Whether the request was queued or merged into a queued one.
    pub outcome: RequestOutcome,
    /// Host time of the request.
    pub timestamp: HostTime,
}

/// Emitted when a pass is handed to a worker.
#[derive(Clone, Copy, Debug)]
pub struct DispatchEvent {
    /// The new pass.
    pub pass: PassId,
    /// Root of the pass.
    pub node: NodeId,
    /// Priority it was dispatched at.
    pub priority: Priority,
    /// Passes in flight, including this one.
    pub in_flight: u32,
    /// Concurrency window at dispatch.
    pub window: u32,
    /// Host time of dispatch.
    pub timestamp: HostTime,
}

/// Emitted when a worker's result reaches the owning thread.
#[derive(Clone, Copy, Debug)]
pub struct PassCompleteEvent {
    /// The pass.
    pub pass: PassId,
    /// Root of the pass.
    pub node: NodeId,
    /// Host time the worker started computing.
    pub started: HostTime,
    /// Host time the worker finished.
    pub finished: HostTime,
    /// Number of node records the pass produced.
    pub records: u32,
    /// What the scheduler decided.
    pub completion: Completion,
}

/// Emitted when a pass result is dropped.
#[derive(Clone, Copy, Debug)]
pub struct DiscardEvent {
    /// The pass.
    pub pass: PassId,
    /// Root of the pass.
    pub node: NodeId,
    /// Why it was dropped.
    pub reason: DiscardReason,
    /// Host time of the decision.
    pub timestamp: HostTime,
}

/// Emitted after a transaction commits.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// The transaction.
    pub transaction: TransactionId,
    /// Structural operations sent to the hierarchy.
    pub structural: u32,
    /// Layouts applied.
    pub applied: u32,
    /// Records rejected as stale.
    pub stale: u32,
    /// Records already committed.
    pub duplicates: u32,
    /// Records for destroyed nodes.
    pub dropped: u32,
    /// Host time of the commit.
    pub timestamp: HostTime,
}

impl CommitEvent {
    /// Creates a `CommitEvent` from a [`CommitReport`].
    #[must_use]
    pub fn new(report: &CommitReport, timestamp: HostTime) -> Self {
        Self {
            transaction: report.transaction,
            structural: saturate(report.structural),
            applied: saturate(report.applied.len()),
            stale: saturate(report.stale),
            duplicates: saturate(report.duplicates),
            dropped: saturate(report.dropped),
            timestamp,
        }
    }
}

/// Emitted for each diagnostic delivered by a commit.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticEvent {
    /// The pass that produced it.
    pub pass: PassId,
    /// The receiving node, if any.
    pub owner: Option<NodeId>,
    /// What kind of diagnostic.
    pub kind: DiagnosticKind,
    /// Host time of delivery.
    pub timestamp: HostTime,
}

impl DiagnosticEvent {
    /// Creates a `DiagnosticEvent` for `diagnostic`.
    #[must_use]
    pub fn new(pass: PassId, diagnostic: &Diagnostic, timestamp: HostTime) -> Self {
        Self {
            pass,
            owner: diagnostic.owner(),
            kind: diagnostic.kind(),
            timestamp,
        }
    }
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the layout pipeline.
///
/// Implement the events you want; the rest are ignored.
pub trait TraceSink {
    /// Called when layout is requested.
    fn on_request(&mut self, e: &RequestEvent) {
        _ = e;
    }

    /// Called when a pass is dispatched.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called when a pass result arrives.
    fn on_pass_complete(&mut self, e: &PassCompleteEvent) {
        _ = e;
    }

    /// Called when a pass result is dropped.
    fn on_discard(&mut self, e: &DiscardEvent) {
        _ = e;
    }

    /// Called after a commit.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called for each delivered diagnostic.
    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// Ignores every event. The runtime's default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Emission point for trace events.
///
/// Holds nothing and does nothing without the `trace` feature.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Forwards events to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self::from_option(Some(sink))
    }

    /// Drops every event.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::from_option(None)
    }

    /// Creates a tracer for a sink that may be absent.
    #[inline]
    #[must_use]
    pub fn from_option(sink: Option<&'a mut dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RequestEvent`].
    #[inline]
    pub fn request(&mut self, e: &RequestEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_request(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassCompleteEvent`].
    #[inline]
    pub fn pass_complete(&mut self, e: &PassCompleteEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_complete(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiscardEvent`].
    #[inline]
    pub fn discard(&mut self, e: &DiscardEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_discard(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DiagnosticEvent`].
    #[inline]
    pub fn diagnostic(&mut self, e: &DiagnosticEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::node::NodeTree;

    fn node() -> NodeId {
        NodeTree::new().create_node()
    }

    fn sample_request(node: NodeId) -> RequestEvent {
        RequestEvent {
            node,
            range: SizeRange::UNBOUNDED,
            priority: Priority::High,
            outcome: RequestOutcome::Queued,
            timestamp: HostTime(1_000),
        }
    }

    #[test]
    fn commit_event_from_report() {
        let n = node();
        let report = CommitReport {
            transaction: TransactionId(3),
            structural: 2,
            applied: alloc::vec![n, n],
            stale: 1,
            ..CommitReport::default()
        };
        let evt = CommitEvent::new(&report, HostTime(50));
        assert_eq!(evt.transaction, TransactionId(3));
        assert_eq!(evt.applied, 2);
        assert_eq!(evt.structural, 2);
        assert_eq!(evt.stale, 1);
        assert_eq!(evt.dropped, 0);
    }

    #[test]
    fn diagnostic_event_carries_kind_and_owner() {
        let n = node();
        let diagnostic = Diagnostic::PassFailed {
            owner: Some(n),
            message: String::from("boom"),
        };
        let evt = DiagnosticEvent::new(PassId(9), &diagnostic, HostTime(0));
        assert_eq!(evt.owner, Some(n));
        assert_eq!(evt.kind, DiagnosticKind::PassFailed);
        assert_eq!(evt.kind.name(), "pass-failed");
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_request(&sample_request(node()));
        sink.on_discard(&DiscardEvent {
            pass: PassId(1),
            node: node(),
            reason: DiscardReason::Stale,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.request(&sample_request(node()));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            requests: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_request(&mut self, e: &RequestEvent) {
                self.requests.push(e.timestamp.ticks());
            }
        }

        let mut sink = RecordingSink {
            requests: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.request(&sample_request(node()));
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.requests, &[1_000]);
    }
}
