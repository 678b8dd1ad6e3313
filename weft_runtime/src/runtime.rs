// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The owning-thread driver.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration as StdDuration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use weft_core::diagnostics::Diagnostic;
use weft_core::dimension::SizeRange;
use weft_core::engine::{PassOutput, compute_pass};
use weft_core::error::StructuralError;
use weft_core::hierarchy::ViewHierarchy;
use weft_core::node::{CommitReport, NodeId, NodeTree};
use weft_core::scheduler::{Completion, LayoutScheduler, PassTicket, Priority, RequestOutcome};
use weft_core::time::HostTime;
use weft_core::trace::{
    CommitEvent, DiagnosticEvent, DiscardEvent, DiscardReason, DispatchEvent, NoopSink,
    PassCompleteEvent, RequestEvent, TraceSink, Tracer,
};
use weft_core::transaction::Transaction;

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

enum PassOutcome {
    Done(PassOutput),
    /// Superseded before the worker started.
    Cancelled,
    Panicked(String),
}

/// What a worker sends back.
struct PassResult {
    ticket: PassTicket,
    started: HostTime,
    finished: HostTime,
    outcome: PassOutcome,
}

/// What one [`LayoutRuntime::pump`] did.
#[derive(Clone, Debug, Default)]
pub struct PumpReport {
    /// Passes handed to workers.
    pub dispatched: usize,
    /// Worker results received.
    pub completed: usize,
    /// The commit, if anything was committed.
    pub commit: Option<CommitReport>,
}

/// Drives a [`NodeTree`] on the owning thread and computes its layouts on a
/// worker pool.
///
/// Workers only ever see immutable [`TreeSnapshot`](weft_core::node::TreeSnapshot)s
/// and hand their results back over a bounded queue. Everything else,
/// including every call into the hierarchy `H`, happens inside
/// [`pump`](Self::pump) on the thread that owns the runtime.
///
/// Trace events go to the sink `S`; the default [`NoopSink`] discards them.
pub struct LayoutRuntime<H, S = NoopSink> {
    tree: NodeTree,
    scheduler: LayoutScheduler,
    pool: rayon::ThreadPool,
    results_tx: Sender<PassResult>,
    results_rx: Receiver<PassResult>,
    inbox: Vec<PassResult>,
    hierarchy: H,
    sink: S,
    epoch: Instant,
    max_retries: u32,
    retries: BTreeMap<NodeId, u32>,
    failures: Vec<Diagnostic>,
}

impl<H, S> fmt::Debug for LayoutRuntime<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRuntime")
            .field("tree", &self.tree)
            .field("scheduler", &self.scheduler)
            .field("workers", &self.pool.current_num_threads())
            .field("inbox", &self.inbox.len())
            .finish_non_exhaustive()
    }
}

impl<H: ViewHierarchy> LayoutRuntime<H> {
    /// Creates a runtime with an empty tree that discards trace events.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Pool`] if the worker pool cannot be started.
    pub fn new(hierarchy: H, config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::with_sink(hierarchy, config, NoopSink)
    }
}

impl<H: ViewHierarchy, S: TraceSink> LayoutRuntime<H, S> {
    /// Creates a runtime with an empty tree that traces into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Pool`] if the worker pool cannot be started.
    pub fn with_sink(hierarchy: H, config: RuntimeConfig, sink: S) -> Result<Self, RuntimeError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = config.workers {
            builder = builder.num_threads(workers);
        }
        let name = config.thread_name.clone();
        let pool = builder.thread_name(move |i| format!("{name}-{i}")).build()?;
        let (results_tx, results_rx) = crossbeam_channel::bounded(config.queue_capacity.max(1));
        log::debug!(
            "layout runtime started with {} workers",
            pool.current_num_threads()
        );
        Ok(Self {
            tree: NodeTree::new(),
            scheduler: LayoutScheduler::new(config.scheduler),
            pool,
            results_tx,
            results_rx,
            inbox: Vec::new(),
            hierarchy,
            sink,
            epoch: Instant::now(),
            max_retries: config.max_retries,
            retries: BTreeMap::new(),
            failures: Vec::new(),
        })
    }

    /// The node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// The node tree, for mutation. Changes reach the hierarchy at the next
    /// [`pump`](Self::pump).
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// The request scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &LayoutScheduler {
        &self.scheduler
    }

    /// The view hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &H {
        &self.hierarchy
    }

    /// The view hierarchy, mutably.
    pub fn hierarchy_mut(&mut self) -> &mut H {
        &mut self.hierarchy
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The trace sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Host time in nanoseconds since the runtime started.
    #[must_use]
    pub fn now(&self) -> HostTime {
        host_time_since(self.epoch)
    }

    /// Requests a layout of `node` in `range`.
    ///
    /// The node is remembered with that range: whenever it is invalidated
    /// later, the next pump lays it out again at the range of its last pass.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Structural`] if `node` is stale.
    pub fn request_layout(
        &mut self,
        node: NodeId,
        range: SizeRange,
        priority: Priority,
    ) -> Result<RequestOutcome, RuntimeError> {
        if !self.tree.is_alive(node) {
            return Err(StructuralError::StaleNode(node).into());
        }
        Ok(self.request(node, range, priority))
    }

    /// Destroys a detached node and forgets its pending requests.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Structural`] if the tree rejects the removal.
    pub fn destroy_node(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        self.tree.destroy_node(node)?;
        self.scheduler.forget(node);
        self.retries.remove(&node);
        Ok(())
    }

    /// Runs one round without blocking.
    ///
    /// Re-requests invalidated roots, dispatches as many passes as the window
    /// allows, collects finished passes, and commits them together with any
    /// pending structural changes in one transaction.
    pub fn pump(&mut self) -> PumpReport {
        let mut report = PumpReport::default();
        self.rerequest_dirty();
        report.dispatched = self.dispatch();

        let mut ready = std::mem::take(&mut self.inbox);
        while let Ok(result) = self.results_rx.try_recv() {
            ready.push(result);
        }
        report.completed = ready.len();
        let mut accepted = Vec::new();
        for result in ready {
            if let Some(output) = self.finish_pass(result) {
                accepted.push(output);
            }
        }

        if !accepted.is_empty() || self.tree.has_pending_structure() {
            let mut tx = self.tree.begin_transaction();
            for output in accepted {
                tx.add_pass(output);
            }
            let commit = self.tree.commit(&mut tx, &mut self.hierarchy);
            self.after_commit(&tx, &commit);
            report.commit = Some(commit);
        }
        report
    }

    /// Pumps until nothing is queued, in flight, or waiting to commit, or
    /// until `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Disconnected`] if the result queue closed.
    pub fn run_until_idle(&mut self, timeout: StdDuration) -> Result<bool, RuntimeError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.is_idle() {
                return Ok(true);
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(false);
            };
            if self.scheduler.in_flight() == 0 {
                continue;
            }
            match self.results_rx.recv_timeout(remaining) {
                Ok(result) => self.inbox.push(result),
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Disconnected) => return Err(RuntimeError::Disconnected),
            }
        }
    }

    /// Returns `true` when no pass is queued or in flight and nothing waits
    /// to be committed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.inbox.is_empty() && !self.tree.has_pending_structure()
    }

    /// Drains the [`Diagnostic::PassFailed`] records of passes that panicked.
    pub fn take_failures(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.failures)
    }

    // -- Internal helpers --

    fn request(&mut self, node: NodeId, range: SizeRange, priority: Priority) -> RequestOutcome {
        let outcome = self.scheduler.request(node, range, priority);
        let event = RequestEvent {
            node,
            range,
            priority,
            outcome,
            timestamp: self.now(),
        };
        Tracer::new(&mut self.sink).request(&event);
        outcome
    }

    fn rerequest_dirty(&mut self) {
        for node in self.tree.take_needs_layout() {
            if self.tree.parent(node).is_some() || self.scheduler.is_queued(node) {
                continue;
            }
            if let Some(range) = self.tree.last_range(node) {
                self.request(node, range, Priority::Normal);
            }
        }
    }

    fn dispatch(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(ticket) = self.scheduler.next_dispatch() {
            let snapshot = match self.tree.begin_pass(ticket.node, ticket.range) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    log::debug!("dropping {:?}: {err}", ticket.pass);
                    self.scheduler.complete(&ticket);
                    continue;
                }
            };
            let event = DispatchEvent {
                pass: ticket.pass,
                node: ticket.node,
                priority: ticket.priority,
                in_flight: saturate(self.scheduler.in_flight()),
                window: saturate(self.scheduler.window()),
                timestamp: self.now(),
            };
            Tracer::new(&mut self.sink).dispatch(&event);
            log::debug!(
                "dispatching {:?} for {:?} ({} nodes)",
                ticket.pass,
                ticket.node,
                snapshot.len()
            );

            let results = self.results_tx.clone();
            let epoch = self.epoch;
            self.pool.spawn(move || {
                let started = host_time_since(epoch);
                let outcome = if ticket.cancel.is_cancelled() {
                    PassOutcome::Cancelled
                } else {
                    match panic::catch_unwind(AssertUnwindSafe(|| {
                        compute_pass(&snapshot, ticket.range, ticket.pass)
                    })) {
                        Ok(output) => PassOutcome::Done(output),
                        Err(payload) => PassOutcome::Panicked(panic_message(payload.as_ref())),
                    }
                };
                let finished = host_time_since(epoch);
                // Fails only once the runtime is gone.
                let _ = results.send(PassResult {
                    ticket,
                    started,
                    finished,
                    outcome,
                });
            });
            dispatched += 1;
        }
        self.scheduler.finish_round();
        dispatched
    }

    /// Returns the output if it should be committed.
    fn finish_pass(&mut self, result: PassResult) -> Option<PassOutput> {
        let PassResult {
            ticket,
            started,
            finished,
            outcome,
        } = result;
        let completion = self.scheduler.complete(&ticket);
        self.scheduler
            .observe(finished.saturating_duration_since(started));
        let records = match &outcome {
            PassOutcome::Done(output) => saturate(output.records.len()),
            PassOutcome::Cancelled | PassOutcome::Panicked(_) => 0,
        };
        let now = self.now();
        Tracer::new(&mut self.sink).pass_complete(&PassCompleteEvent {
            pass: ticket.pass,
            node: ticket.node,
            started,
            finished,
            records,
            completion,
        });

        match (completion, outcome) {
            (Completion::Superseded, _) | (Completion::Accept, PassOutcome::Cancelled) => {
                log::debug!("discarding superseded {:?} for {:?}", ticket.pass, ticket.node);
                Tracer::new(&mut self.sink).discard(&DiscardEvent {
                    pass: ticket.pass,
                    node: ticket.node,
                    reason: DiscardReason::Superseded,
                    timestamp: now,
                });
                None
            }
            (Completion::Accept, PassOutcome::Done(output)) => Some(output),
            (Completion::Accept, PassOutcome::Panicked(message)) => {
                self.pass_failed(&ticket, message, now);
                None
            }
        }
    }

    fn pass_failed(&mut self, ticket: &PassTicket, message: String, now: HostTime) {
        log::warn!(
            "layout pass {:?} for {:?} panicked: {message}",
            ticket.pass,
            ticket.node
        );
        let diagnostic = Diagnostic::PassFailed {
            owner: Some(ticket.node),
            message,
        };
        Tracer::new(&mut self.sink).diagnostic(&DiagnosticEvent::new(ticket.pass, &diagnostic, now));
        self.failures.push(diagnostic);

        let attempts = {
            let attempts = self.retries.entry(ticket.node).or_insert(0);
            *attempts += 1;
            *attempts
        };
        if attempts <= self.max_retries && self.tree.is_alive(ticket.node) {
            self.request(ticket.node, ticket.range, ticket.priority);
        } else {
            log::warn!(
                "giving up on {:?} after {} failed passes",
                ticket.node,
                attempts
            );
        }
    }

    fn after_commit(&mut self, tx: &Transaction, commit: &CommitReport) {
        let now = self.now();
        let mut tracer = Tracer::new(&mut self.sink);
        tracer.commit(&CommitEvent::new(commit, now));
        for pass in tx.passes() {
            if commit.requeue.contains(&pass.root) {
                log::debug!("{:?} for {:?} was stale; requeueing", pass.pass, pass.root);
                tracer.discard(&DiscardEvent {
                    pass: pass.pass,
                    node: pass.root,
                    reason: DiscardReason::Stale,
                    timestamp: now,
                });
            }
            for diagnostic in &pass.diagnostics {
                let owner = diagnostic.owner().unwrap_or(pass.root);
                if commit.applied.contains(&owner) {
                    tracer.diagnostic(&DiagnosticEvent::new(pass.pass, diagnostic, now));
                }
            }
        }
        log::debug!(
            "committed {:?}: {} applied, {} stale, {} duplicate, {} structural",
            commit.transaction,
            commit.applied.len(),
            commit.stale,
            commit.duplicates,
            commit.structural
        );

        for node in &commit.applied {
            self.retries.remove(node);
        }
        for &root in &commit.requeue {
            if self.scheduler.is_queued(root) {
                continue;
            }
            if let Some(range) = self.tree.last_range(root) {
                self.request(root, range, Priority::Normal);
            }
        }
    }
}

fn host_time_since(epoch: Instant) -> HostTime {
    HostTime(u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("non-string panic payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = panic::catch_unwind(|| panic!("{} {}", "formatted", 2)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 2");

        let payload = panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn host_time_is_monotonic() {
        let epoch = Instant::now();
        let a = host_time_since(epoch);
        let b = host_time_since(epoch);
        assert!(b >= a, "{b:?} < {a:?}");
    }
}
