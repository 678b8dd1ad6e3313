// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout request queue with coalescing, a concurrency window, and
//! single-flight tracking.
//!
//! The [`LayoutScheduler`] is pure bookkeeping. It never spawns work: the
//! owner asks it which request to run next with
//! [`next_dispatch`](LayoutScheduler::next_dispatch), runs the pass however it
//! likes, and reports back with [`complete`](LayoutScheduler::complete). See
//! the struct docs for the window and single-flight rules.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use core::cmp::Reverse;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::dimension::SizeRange;
use crate::node::NodeId;
use crate::time::Duration;

/// Identity of one dispatched layout pass. Increases monotonically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(pub u64);

/// How urgently a request should be dispatched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Prefetch and offscreen content.
    Low,
    /// Ordinary content changes.
    #[default]
    Normal,
    /// Visible content the user is waiting on.
    High,
}

/// Shared flag telling a worker that its pass is no longer wanted.
///
/// Workers check it before they start computing. Work that is already
/// running is not interrupted; its result is dropped at
/// [`LayoutScheduler::complete`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pass as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A dispatched request.
#[derive(Clone, Debug)]
pub struct PassTicket {
    /// The pass identity.
    pub pass: PassId,
    /// Root node of the pass.
    pub node: NodeId,
    /// Range the root is laid out in.
    pub range: SizeRange,
    /// Priority the request was dispatched at.
    pub priority: Priority,
    /// Set when a newer pass for the same node supersedes this one.
    pub cancel: CancelToken,
}

/// Result of [`LayoutScheduler::request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
    /// A new request was queued.
    Queued,
    /// A queued request for the same node was updated in place.
    Coalesced,
}

/// Result of [`LayoutScheduler::complete`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion {
    /// The pass is the node's active pass; its output may be committed.
    Accept,
    /// A newer pass for the node was dispatched; drop the output.
    Superseded,
}

/// Controls how the concurrency window adapts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConcurrencyPolicy {
    /// Keep the window at [`SchedulerConfig::initial_window`].
    Fixed,
    /// Grow the window by 1 after `grow_threshold` consecutive saturated
    /// rounds and shrink it by 1 after `shrink_threshold` consecutive rounds
    /// with spare capacity, within [`SchedulerConfig::min_window`] and
    /// [`SchedulerConfig::max_window`].
    Elastic {
        /// Saturated rounds before the window grows.
        grow_threshold: u32,
        /// Rounds with spare capacity before the window shrinks.
        shrink_threshold: u32,
    },
}

/// Configuration for the [`LayoutScheduler`].
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Passes allowed in flight at once, initially.
    pub initial_window: usize,
    /// Lower bound of the window.
    pub min_window: usize,
    /// Upper bound of the window.
    pub max_window: usize,
    /// EMA smoothing factor for pass cost estimation (0.0–1.0).
    /// Smaller values mean more smoothing.
    pub ema_alpha: f32,
    /// Policy for adapting the window.
    pub policy: ConcurrencyPolicy,
}

impl SchedulerConfig {
    /// Configuration for interactive UIs: a small window that widens quickly
    /// under bursts of mutations.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            initial_window: 2,
            min_window: 1,
            max_window: 8,
            ema_alpha: 0.2,
            policy: ConcurrencyPolicy::Elastic {
                grow_threshold: 2,
                shrink_threshold: 16,
            },
        }
    }

    /// Configuration for batch and prefetch work: one pass at a time.
    #[must_use]
    pub const fn background() -> Self {
        Self {
            initial_window: 1,
            min_window: 1,
            max_window: 1,
            ema_alpha: 0.1,
            policy: ConcurrencyPolicy::Fixed,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Exponential moving average tracker.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f32,
    alpha: f32,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f32) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f32) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    const fn get(&self) -> f32 {
        self.value
    }
}

#[derive(Clone, Copy, Debug)]
struct Queued {
    range: SizeRange,
    priority: Priority,
    seq: u64,
}

/// Request queue and in-flight bookkeeping for layout passes.
///
/// # Coalescing
///
/// At most one request per node is queued. A second request replaces the
/// queued range and keeps the higher of the two priorities; the request keeps
/// its place in line unless its priority rose.
///
/// # Window
///
/// [`next_dispatch`](Self::next_dispatch) pops the highest-priority request,
/// first-come first-served within a priority, as long as fewer than
/// [`window`](Self::window) passes are in flight. Superseded passes count
/// until they are completed, because their worker is still busy.
///
/// # Single flight
///
/// Each node has at most one active pass. Dispatching a node that already has
/// one cancels the older ticket, and [`complete`](Self::complete) reports the
/// older pass as [`Completion::Superseded`].
///
/// # Usage
///
/// ```rust,ignore
/// scheduler.request(root, range, Priority::High);
/// while let Some(ticket) = scheduler.next_dispatch() {
///     spawn_pass(ticket);
/// }
/// scheduler.finish_round();
/// // ... later, as results arrive ...
/// if scheduler.complete(&ticket) == Completion::Accept {
///     transaction.add_pass(output);
/// }
/// scheduler.observe(cost);
/// ```
#[derive(Debug)]
pub struct LayoutScheduler {
    config: SchedulerConfig,
    window: usize,
    next_pass: u64,
    next_seq: u64,
    queued: BTreeMap<NodeId, Queued>,
    order: BTreeSet<(Reverse<Priority>, u64, NodeId)>,
    active: BTreeMap<NodeId, PassTicket>,
    in_flight: BTreeSet<PassId>,
    pass_cost_ema: Ema,
    consecutive_saturated: u32,
    consecutive_spare: u32,
}

impl LayoutScheduler {
    /// Creates a new scheduler with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the window bounds are inconsistent.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        assert!(
            1 <= config.min_window
                && config.min_window <= config.initial_window
                && config.initial_window <= config.max_window,
            "window bounds must satisfy 1 <= min <= initial <= max"
        );
        Self {
            window: config.initial_window,
            next_pass: 1,
            next_seq: 0,
            queued: BTreeMap::new(),
            order: BTreeSet::new(),
            active: BTreeMap::new(),
            in_flight: BTreeSet::new(),
            pass_cost_ema: Ema::new(config.ema_alpha),
            consecutive_saturated: 0,
            consecutive_spare: 0,
            config,
        }
    }

    /// Queues a layout of `node` in `range`, or updates its queued request.
    pub fn request(&mut self, node: NodeId, range: SizeRange, priority: Priority) -> RequestOutcome {
        if let Some(queued) = self.queued.get_mut(&node) {
            queued.range = range;
            if priority > queued.priority {
                self.order.remove(&(Reverse(queued.priority), queued.seq, node));
                queued.priority = priority;
                self.order.insert((Reverse(priority), queued.seq, node));
            }
            return RequestOutcome::Coalesced;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queued.insert(
            node,
            Queued {
                range,
                priority,
                seq,
            },
        );
        self.order.insert((Reverse(priority), seq, node));
        RequestOutcome::Queued
    }

    /// Pops the next request to run, if the window has room.
    ///
    /// The returned ticket becomes the node's active pass. Any previously
    /// active ticket for the node is cancelled.
    pub fn next_dispatch(&mut self) -> Option<PassTicket> {
        if self.in_flight.len() >= self.window {
            return None;
        }
        let (_, _, node) = self.order.pop_first()?;
        let queued = self.queued.remove(&node)?;
        let pass = PassId(self.next_pass);
        self.next_pass += 1;
        let ticket = PassTicket {
            pass,
            node,
            range: queued.range,
            priority: queued.priority,
            cancel: CancelToken::new(),
        };
        if let Some(old) = self.active.insert(node, ticket.clone()) {
            log::debug!("pass {:?} for {node:?} superseded by {pass:?}", old.pass);
            old.cancel.cancel();
        }
        self.in_flight.insert(pass);
        Some(ticket)
    }

    /// Reports that the pass for `ticket` finished, successfully or not.
    ///
    /// Completing a ticket twice, or one this scheduler never issued, is
    /// reported as [`Completion::Superseded`].
    pub fn complete(&mut self, ticket: &PassTicket) -> Completion {
        if !self.in_flight.remove(&ticket.pass) {
            return Completion::Superseded;
        }
        match self.active.get(&ticket.node) {
            Some(active) if active.pass == ticket.pass => {
                self.active.remove(&ticket.node);
                Completion::Accept
            }
            _ => Completion::Superseded,
        }
    }

    /// Drops any queued request for `node` and cancels its active pass.
    ///
    /// Used when the node is destroyed. An in-flight pass still occupies the
    /// window until it is completed.
    pub fn forget(&mut self, node: NodeId) {
        if let Some(queued) = self.queued.remove(&node) {
            self.order.remove(&(Reverse(queued.priority), queued.seq, node));
        }
        if let Some(active) = self.active.remove(&node) {
            active.cancel.cancel();
        }
    }

    /// Ends a dispatch round and adapts the window.
    ///
    /// A round is saturated when requests are still queued because the window
    /// is full, and has spare capacity when the queue is empty and fewer
    /// passes than the window are in flight.
    pub fn finish_round(&mut self) {
        let ConcurrencyPolicy::Elastic {
            grow_threshold,
            shrink_threshold,
        } = self.config.policy
        else {
            return;
        };
        let saturated = !self.queued.is_empty() && self.in_flight.len() >= self.window;
        let spare = self.queued.is_empty() && self.in_flight.len() < self.window;
        if saturated {
            self.consecutive_saturated += 1;
            self.consecutive_spare = 0;
            if self.consecutive_saturated >= grow_threshold && self.window < self.config.max_window
            {
                self.window += 1;
                self.consecutive_saturated = 0;
                log::debug!("layout window grew to {}", self.window);
            }
        } else if spare {
            self.consecutive_spare += 1;
            self.consecutive_saturated = 0;
            if self.consecutive_spare >= shrink_threshold && self.window > self.config.min_window
            {
                self.window -= 1;
                self.consecutive_spare = 0;
                log::debug!("layout window shrank to {}", self.window);
            }
        } else {
            self.consecutive_saturated = 0;
            self.consecutive_spare = 0;
        }
    }

    /// Feeds the measured cost of one pass.
    pub fn observe(&mut self, cost: Duration) {
        self.pass_cost_ema.update(cost.ticks() as f32);
    }

    /// Returns the EMA-smoothed pass cost.
    #[must_use]
    pub fn estimated_pass_cost(&self) -> Duration {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "EMA-smoothed pass cost in ticks fits in u64"
        )]
        let ticks = self.pass_cost_ema.get() as u64;
        Duration(ticks)
    }

    /// Returns the current concurrency window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns the number of dispatched passes not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the number of queued requests.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Returns `true` if `node` has a queued request.
    #[must_use]
    pub fn is_queued(&self, node: NodeId) -> bool {
        self.queued.contains_key(&node)
    }

    /// Returns `true` when nothing is queued or in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queued.is_empty() && self.in_flight.is_empty()
    }
}

impl Default for LayoutScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
