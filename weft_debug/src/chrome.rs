// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Layout passes become complete (`"X"`) events on a per-root track, so
//! overlapping passes for different roots line up side by side. Everything
//! else is an instant event.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use weft_core::node::NodeId;
use weft_core::time::{HostTime, Timebase};
use weft_core::trace::DiscardReason;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Request(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Request",
                    "cat": "Scheduler",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": 0,
                    "tid": track(e.node),
                    "s": "t",
                    "args": {
                        "priority": format!("{:?}", e.priority),
                        "outcome": format!("{:?}", e.outcome),
                        "max_width": finite_or_null(e.range.max.width),
                        "max_height": finite_or_null(e.range.max.height),
                    }
                }));
            }
            RecordedEvent::Dispatch(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Dispatch",
                    "cat": "Scheduler",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": 0,
                    "tid": track(e.node),
                    "s": "t",
                    "args": {
                        "pass": e.pass.0,
                        "in_flight": e.in_flight,
                        "window": e.window,
                    }
                }));
            }
            RecordedEvent::PassComplete(e) => {
                let start = to_us(e.started, timebase);
                events.push(json!({
                    "ph": "X",
                    "name": "LayoutPass",
                    "cat": "Pass",
                    "ts": start,
                    "dur": to_us(e.finished, timebase) - start,
                    "pid": 1,
                    "tid": track(e.node),
                    "args": {
                        "pass": e.pass.0,
                        "records": e.records,
                        "completion": format!("{:?}", e.completion),
                    }
                }));
            }
            RecordedEvent::Discard(e) => {
                let name = match e.reason {
                    DiscardReason::Superseded => "DiscardSuperseded",
                    DiscardReason::Stale => "DiscardStale",
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Commit",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": 1,
                    "tid": track(e.node),
                    "s": "t",
                    "args": {
                        "pass": e.pass.0,
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Commit",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "transaction": e.transaction.0,
                        "structural": e.structural,
                        "applied": e.applied,
                        "stale": e.stale,
                        "duplicates": e.duplicates,
                        "dropped": e.dropped,
                    }
                }));
            }
            RecordedEvent::Diagnostic(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.kind.name(),
                    "cat": "Diagnostic",
                    "ts": to_us(e.timestamp, timebase),
                    "pid": 0,
                    "tid": e.owner.map_or(0, track),
                    "s": "p",
                    "args": {
                        "pass": e.pass.0,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_us(t: HostTime, timebase: Timebase) -> f64 {
    t.to_nanos(timebase) as f64 / 1000.0
}

/// Track 0 is reserved for global events; node tracks start at 1.
fn track(node: NodeId) -> u64 {
    u64::from(node.index()) + 1
}

fn finite_or_null(v: f64) -> Value {
    if v.is_finite() { json!(v) } else { Value::Null }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use weft_core::node::NodeTree;
    use weft_core::scheduler::{Completion, PassId, Priority};
    use weft_core::trace::{DiscardEvent, DispatchEvent, PassCompleteEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let id = NodeTree::new().create_node();
        let mut rec = RecorderSink::new();
        rec.on_dispatch(&DispatchEvent {
            pass: PassId(1),
            node: id,
            priority: Priority::Normal,
            in_flight: 1,
            window: 2,
            timestamp: HostTime(1_000_000),
        });
        rec.on_pass_complete(&PassCompleteEvent {
            pass: PassId(1),
            node: id,
            started: HostTime(1_000_000),
            finished: HostTime(1_250_000),
            records: 4,
            completion: Completion::Accept,
        });
        rec.on_discard(&DiscardEvent {
            pass: PassId(1),
            node: id,
            reason: DiscardReason::Stale,
            timestamp: HostTime(1_300_000),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Dispatch");
        assert_eq!(parsed[0]["tid"], 1);

        // The pass spans 250µs.
        assert_eq!(parsed[1]["ph"], "X");
        assert_eq!(parsed[1]["ts"], 1000.0);
        assert_eq!(parsed[1]["dur"], 250.0);
        assert_eq!(parsed[1]["args"]["records"], 4);

        assert_eq!(parsed[2]["name"], "DiscardStale");
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
