// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use weft_core::node::NodeId;
use weft_core::time::{HostTime, Timebase};
use weft_core::trace::{
    CommitEvent, DiagnosticEvent, DiscardEvent, DiscardReason, DispatchEvent, PassCompleteEvent,
    RequestEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn us(&self, t: HostTime) -> f64 {
        t.to_nanos(self.timebase) as f64 / 1000.0
    }
}

fn node(id: NodeId) -> String {
    format!("n{}.{}", id.index(), id.slot_generation())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_request(&mut self, e: &RequestEvent) {
        let _ = writeln!(
            self.writer,
            "[request] {} {:?} {:?} at {:.1}µs",
            node(e.node),
            e.priority,
            e.outcome,
            self.us(e.timestamp),
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] pass={} {} in_flight={}/{} at {:.1}µs",
            e.pass.0,
            node(e.node),
            e.in_flight,
            e.window,
            self.us(e.timestamp),
        );
    }

    fn on_pass_complete(&mut self, e: &PassCompleteEvent) {
        let _ = writeln!(
            self.writer,
            "[complete] pass={} {} records={} took={:.1}µs {:?}",
            e.pass.0,
            node(e.node),
            e.records,
            self.us(e.finished) - self.us(e.started),
            e.completion,
        );
    }

    fn on_discard(&mut self, e: &DiscardEvent) {
        let reason = match e.reason {
            DiscardReason::Superseded => "superseded",
            DiscardReason::Stale => "stale",
        };
        let _ = writeln!(
            self.writer,
            "[discard] pass={} {} {reason}",
            e.pass.0,
            node(e.node),
        );
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        let _ = writeln!(
            self.writer,
            "[commit] tx={} applied={} stale={} dup={} dropped={} structural={} at {:.1}µs",
            e.transaction.0,
            e.applied,
            e.stale,
            e.duplicates,
            e.dropped,
            e.structural,
            self.us(e.timestamp),
        );
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        let owner = e.owner.map_or_else(|| String::from("-"), node);
        let _ = writeln!(
            self.writer,
            "[diagnostic] pass={} {owner} {}",
            e.pass.0,
            e.kind.name(),
        );
    }
}
