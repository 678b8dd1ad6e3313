// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration.

use weft_core::scheduler::SchedulerConfig;

/// Configuration for a [`LayoutRuntime`](crate::LayoutRuntime).
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Worker threads, or `None` for rayon's default (one per core).
    pub workers: Option<usize>,
    /// Capacity of the result queue between workers and the owning thread.
    ///
    /// Workers block on a full queue until the next [`pump`](crate::LayoutRuntime::pump).
    pub queue_capacity: usize,
    /// Prefix for worker thread names; the worker index is appended.
    pub thread_name: String,
    /// How many times a pass that panicked is retried before it is dropped.
    pub max_retries: u32,
    /// Request queue and concurrency window.
    pub scheduler: SchedulerConfig,
}

impl RuntimeConfig {
    /// Returns this configuration with a fixed number of workers.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Returns this configuration with a different scheduler configuration.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            queue_capacity: 64,
            thread_name: String::from("weft-layout"),
            max_retries: 2,
            scheduler: SchedulerConfig::interactive(),
        }
    }
}
