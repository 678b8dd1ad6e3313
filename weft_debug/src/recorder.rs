// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Node handles are stored as `(index, slot generation)` pairs and come back
//! through [`NodeId::from_raw`]; they are only meaningful against the tree
//! that produced the recording.

use kurbo::Size;
use weft_core::diagnostics::DiagnosticKind;
use weft_core::dimension::SizeRange;
use weft_core::node::NodeId;
use weft_core::scheduler::{Completion, PassId, Priority, RequestOutcome};
use weft_core::time::HostTime;
use weft_core::trace::{
    CommitEvent, DiagnosticEvent, DiscardEvent, DiscardReason, DispatchEvent, PassCompleteEvent,
    RequestEvent, TraceSink,
};
use weft_core::transaction::TransactionId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_REQUEST: u8 = 1;
const TAG_DISPATCH: u8 = 2;
const TAG_PASS_COMPLETE: u8 = 3;
const TAG_DISCARD: u8 = 4;
const TAG_COMMIT: u8 = 5;
const TAG_DIAGNOSTIC: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_node(&mut self, id: NodeId) {
        self.write_u32(id.index());
        self.write_u32(id.slot_generation());
    }

    fn write_option_node(&mut self, id: Option<NodeId>) {
        match id {
            Some(id) => {
                self.write_u8(1);
                self.write_node(id);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
                self.write_u32(0);
            }
        }
    }

    fn write_range(&mut self, range: SizeRange) {
        self.write_f64(range.min.width);
        self.write_f64(range.min.height);
        self.write_f64(range.max.width);
        self.write_f64(range.max.height);
    }

    fn write_priority(&mut self, p: Priority) {
        self.write_u8(match p {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
        });
    }
}

fn kind_code(kind: DiagnosticKind) -> u8 {
    match kind {
        DiagnosticKind::Overflow => 0,
        DiagnosticKind::MeasurementFailed => 1,
        DiagnosticKind::UnboundedSize => 2,
        DiagnosticKind::InvalidRatio => 3,
        DiagnosticKind::UnknownNode => 4,
        DiagnosticKind::PassFailed => 5,
    }
}

impl TraceSink for RecorderSink {
    fn on_request(&mut self, e: &RequestEvent) {
        self.write_u8(TAG_REQUEST);
        self.write_node(e.node);
        self.write_range(e.range);
        self.write_priority(e.priority);
        self.write_u8(match e.outcome {
            RequestOutcome::Queued => 0,
            RequestOutcome::Coalesced => 1,
        });
        self.write_u64(e.timestamp.ticks());
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_u64(e.pass.0);
        self.write_node(e.node);
        self.write_priority(e.priority);
        self.write_u32(e.in_flight);
        self.write_u32(e.window);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_pass_complete(&mut self, e: &PassCompleteEvent) {
        self.write_u8(TAG_PASS_COMPLETE);
        self.write_u64(e.pass.0);
        self.write_node(e.node);
        self.write_u64(e.started.ticks());
        self.write_u64(e.finished.ticks());
        self.write_u32(e.records);
        self.write_u8(match e.completion {
            Completion::Accept => 0,
            Completion::Superseded => 1,
        });
    }

    fn on_discard(&mut self, e: &DiscardEvent) {
        self.write_u8(TAG_DISCARD);
        self.write_u64(e.pass.0);
        self.write_node(e.node);
        self.write_u8(match e.reason {
            DiscardReason::Superseded => 0,
            DiscardReason::Stale => 1,
        });
        self.write_u64(e.timestamp.ticks());
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.transaction.0);
        self.write_u32(e.structural);
        self.write_u32(e.applied);
        self.write_u32(e.stale);
        self.write_u32(e.duplicates);
        self.write_u32(e.dropped);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        self.write_u8(TAG_DIAGNOSTIC);
        self.write_u64(e.pass.0);
        self.write_option_node(e.owner);
        self.write_u8(kind_code(e.kind));
        self.write_u64(e.timestamp.ticks());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`RequestEvent`].
    Request(RequestEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`PassCompleteEvent`].
    PassComplete(PassCompleteEvent),
    /// A [`DiscardEvent`].
    Discard(DiscardEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`DiagnosticEvent`].
    Diagnostic(DiagnosticEvent),
}

impl RecordedEvent {
    /// Host time at which the event happened.
    ///
    /// Pass completions report the time the worker finished.
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        match self {
            Self::Request(e) => e.timestamp,
            Self::Dispatch(e) => e.timestamp,
            Self::PassComplete(e) => e.finished,
            Self::Discard(e) => e.timestamp,
            Self::Commit(e) => e.timestamp,
            Self::Diagnostic(e) => e.timestamp,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_node(&mut self) -> Option<NodeId> {
        let index = self.read_u32()?;
        let slot_generation = self.read_u32()?;
        Some(NodeId::from_raw(index, slot_generation))
    }

    fn read_option_node(&mut self) -> Option<Option<NodeId>> {
        let present = self.read_u8()?;
        let node = self.read_node()?;
        Some(if present != 0 { Some(node) } else { None })
    }

    fn read_range(&mut self) -> Option<SizeRange> {
        let min = Size::new(self.read_f64()?, self.read_f64()?);
        let max = Size::new(self.read_f64()?, self.read_f64()?);
        Some(SizeRange::new(min, max))
    }

    fn read_priority(&mut self) -> Option<Priority> {
        Some(match self.read_u8()? {
            0 => Priority::Low,
            1 => Priority::Normal,
            _ => Priority::High,
        })
    }

    fn read_kind(&mut self) -> Option<DiagnosticKind> {
        Some(match self.read_u8()? {
            0 => DiagnosticKind::Overflow,
            1 => DiagnosticKind::MeasurementFailed,
            2 => DiagnosticKind::UnboundedSize,
            3 => DiagnosticKind::InvalidRatio,
            4 => DiagnosticKind::UnknownNode,
            _ => DiagnosticKind::PassFailed,
        })
    }

    fn decode_request(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Request(RequestEvent {
            node: self.read_node()?,
            range: self.read_range()?,
            priority: self.read_priority()?,
            outcome: match self.read_u8()? {
                0 => RequestOutcome::Queued,
                _ => RequestOutcome::Coalesced,
            },
            timestamp: self.read_time()?,
        }))
    }

    fn decode_dispatch(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Dispatch(DispatchEvent {
            pass: PassId(self.read_u64()?),
            node: self.read_node()?,
            priority: self.read_priority()?,
            in_flight: self.read_u32()?,
            window: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_pass_complete(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassComplete(PassCompleteEvent {
            pass: PassId(self.read_u64()?),
            node: self.read_node()?,
            started: self.read_time()?,
            finished: self.read_time()?,
            records: self.read_u32()?,
            completion: match self.read_u8()? {
                0 => Completion::Accept,
                _ => Completion::Superseded,
            },
        }))
    }

    fn decode_discard(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Discard(DiscardEvent {
            pass: PassId(self.read_u64()?),
            node: self.read_node()?,
            reason: match self.read_u8()? {
                0 => DiscardReason::Superseded,
                _ => DiscardReason::Stale,
            },
            timestamp: self.read_time()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            transaction: TransactionId(self.read_u64()?),
            structural: self.read_u32()?,
            applied: self.read_u32()?,
            stale: self.read_u32()?,
            duplicates: self.read_u32()?,
            dropped: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_diagnostic(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Diagnostic(DiagnosticEvent {
            pass: PassId(self.read_u64()?),
            owner: self.read_option_node()?,
            kind: self.read_kind()?,
            timestamp: self.read_time()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_REQUEST => self.decode_request(),
            TAG_DISPATCH => self.decode_dispatch(),
            TAG_PASS_COMPLETE => self.decode_pass_complete(),
            TAG_DISCARD => self.decode_discard(),
            TAG_COMMIT => self.decode_commit(),
            TAG_DIAGNOSTIC => self.decode_diagnostic(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
