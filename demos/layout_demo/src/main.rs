// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lays out a small list on worker threads and prints what happened.
//!
//! Builds a column of rows, each an avatar and a title, lays it out through a
//! [`LayoutRuntime`], edits one title and lets the runtime lay the column out
//! again. Events go to both a
//! [`PrettyPrintSink`](weft_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](weft_debug::recorder::RecorderSink); the recording is
//! exported as a Chrome trace.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;

use kurbo::{Insets, Size};
use weft_core::dimension::SizeRange;
use weft_core::element::{Element, Inset, IntrinsicSize, Stack};
use weft_core::node::{NodeId, NodeTree};
use weft_core::scheduler::{Priority, SchedulerConfig};
use weft_core::style::Style;
use weft_core::time::Timebase;
use weft_core::trace::{
    CommitEvent, DiagnosticEvent, DiscardEvent, DispatchEvent, PassCompleteEvent, RequestEvent,
    TraceSink,
};
use weft_debug::describe::describe;
use weft_debug::mirror::MirrorHierarchy;
use weft_debug::pretty::PrettyPrintSink;
use weft_debug::recorder::RecorderSink;
use weft_runtime::{LayoutRuntime, RuntimeConfig};

const ROWS: usize = 5;
const WIDTH: f64 = 320.0;

/// Forwards every event to both sinks.
#[derive(Debug)]
struct Tee {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl TraceSink for Tee {
    fn on_request(&mut self, e: &RequestEvent) {
        self.pretty.on_request(e);
        self.recorder.on_request(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.pretty.on_dispatch(e);
        self.recorder.on_dispatch(e);
    }

    fn on_pass_complete(&mut self, e: &PassCompleteEvent) {
        self.pretty.on_pass_complete(e);
        self.recorder.on_pass_complete(e);
    }

    fn on_discard(&mut self, e: &DiscardEvent) {
        self.pretty.on_discard(e);
        self.recorder.on_discard(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.pretty.on_commit(e);
        self.recorder.on_commit(e);
    }

    fn on_diagnostic(&mut self, e: &DiagnosticEvent) {
        self.pretty.on_diagnostic(e);
        self.recorder.on_diagnostic(e);
    }
}

fn build_row(tree: &mut NodeTree, title_width: f64) -> (NodeId, NodeId) {
    let row = tree.create_node();
    let avatar = tree.create_node();
    let title = tree.create_node();
    tree.add_child(row, avatar).expect("fresh nodes");
    tree.add_child(row, title).expect("fresh nodes");
    tree.set_style(avatar, Style::preferred(Size::new(32.0, 32.0)))
        .expect("live node");
    tree.set_style(title, Style::DEFAULT.grow(1.0)).expect("live node");
    tree.set_measure(title, IntrinsicSize(Size::new(title_width, 18.0)))
        .expect("live node");
    tree.set_provider(row, |_: SizeRange, kids: &[NodeId]| {
        Element::from(Inset::new(
            Insets::uniform(8.0),
            Element::from(
                Stack::horizontal()
                    .spacing(8.0)
                    .children(kids.iter().map(|&k| Element::node(k))),
            ),
        ))
    })
    .expect("live node");
    (row, title)
}

fn main() {
    env_logger::init();
    let timebase = Timebase::NANOS;

    let stdout: Box<dyn Write> = Box::new(std::io::stdout());
    let sink = Tee {
        pretty: PrettyPrintSink::with_writer(stdout, timebase),
        recorder: RecorderSink::new(),
    };
    let config = RuntimeConfig::default().with_scheduler(SchedulerConfig::interactive());
    let mut runtime = LayoutRuntime::with_sink(MirrorHierarchy::new(), config, sink)
        .expect("failed to start the worker pool");

    // -- tree --------------------------------------------------------------
    let tree = runtime.tree_mut();
    let column = tree.create_node();
    let mut titles = Vec::new();
    for i in 0..ROWS {
        let (row, title) = build_row(tree, 80.0 + 20.0 * i as f64);
        tree.add_child(column, row).expect("fresh nodes");
        titles.push(title);
    }
    tree.set_provider(column, |_: SizeRange, kids: &[NodeId]| {
        Element::from(Stack::vertical().children(kids.iter().map(|&k| Element::node(k))))
    })
    .expect("live node");

    // -- first layout ------------------------------------------------------
    let range = SizeRange::new(Size::new(WIDTH, 0.0), Size::new(WIDTH, f64::INFINITY));
    runtime
        .request_layout(column, range, Priority::High)
        .expect("live node");
    let settled = runtime
        .run_until_idle(Duration::from_secs(5))
        .expect("worker pool alive");
    println!("first layout settled: {settled}");

    // -- edit and relayout -------------------------------------------------
    // The column is re-requested at its last range without another call.
    runtime
        .tree_mut()
        .set_measure(titles[2], IntrinsicSize(Size::new(240.0, 36.0)))
        .expect("live node");
    let settled = runtime
        .run_until_idle(Duration::from_secs(5))
        .expect("worker pool alive");
    println!("relayout settled: {settled}");

    if let Some(committed) = runtime.tree().committed(column) {
        print!("{}", describe(&committed.layout));
    }
    for failure in runtime.take_failures() {
        println!("failed: {failure:?}");
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "layout_trace.json";
    let file = File::create(path).expect("failed to create layout_trace.json");
    let mut writer = BufWriter::new(file);
    weft_debug::chrome::export(runtime.sink().recorder.as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
