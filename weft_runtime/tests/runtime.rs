// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end runs of the runtime against an in-memory hierarchy.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use kurbo::{Rect, Size};
use weft_core::diagnostics::Diagnostic;
use weft_core::dimension::SizeRange;
use weft_core::element::{Element, MeasureError, Stack};
use weft_core::node::{NodeId, NodeTree};
use weft_core::scheduler::{Priority, SchedulerConfig};
use weft_core::style::Style;
use weft_core::trace::DiscardReason;
use weft_debug::describe::describe;
use weft_debug::mirror::MirrorHierarchy;
use weft_debug::recorder::{RecordedEvent, RecorderSink, decode};
use weft_runtime::{LayoutRuntime, RuntimeConfig};

const IDLE: Duration = Duration::from_secs(10);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn row(tree: &mut NodeTree, root: NodeId) {
    tree.set_provider(root, |_: SizeRange, kids: &[NodeId]| {
        Element::from(
            Stack::horizontal()
                .spacing(5.0)
                .children(kids.iter().map(|&k| Element::node(k))),
        )
    })
    .unwrap();
}

/// A measure that blocks until the returned sender is dropped.
fn gate() -> (
    Sender<()>,
    impl Fn(SizeRange) -> Result<Size, MeasureError> + Send + Sync,
) {
    let (tx, rx): (Sender<()>, Receiver<()>) = crossbeam_channel::bounded(0);
    let measure = move |_: SizeRange| {
        let _ = rx.recv_timeout(IDLE);
        Ok::<_, MeasureError>(Size::new(30.0, 10.0))
    };
    (tx, measure)
}

fn runtime(scheduler: SchedulerConfig) -> LayoutRuntime<MirrorHierarchy, RecorderSink> {
    init_logger();
    let config = RuntimeConfig::default()
        .with_workers(2)
        .with_scheduler(scheduler);
    LayoutRuntime::with_sink(MirrorHierarchy::new(), config, RecorderSink::new()).unwrap()
}

fn discards(runtime: &LayoutRuntime<MirrorHierarchy, RecorderSink>) -> Vec<DiscardReason> {
    decode(runtime.sink().as_bytes())
        .filter_map(|e| match e {
            RecordedEvent::Discard(d) => Some(d.reason),
            _ => None,
        })
        .collect()
}

#[test]
fn committed_frames_reach_the_hierarchy() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let tree = rt.tree_mut();
    let root = tree.create_node();
    let a = tree.create_node();
    let b = tree.create_node();
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();
    tree.set_style(a, Style::preferred(Size::new(30.0, 10.0))).unwrap();
    tree.set_style(b, Style::preferred(Size::new(20.0, 10.0))).unwrap();
    row(tree, root);

    rt.request_layout(root, SizeRange::exact(Size::new(100.0, 10.0)), Priority::High)
        .unwrap();
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    let views = rt.hierarchy();
    assert_eq!(views.children(root), [a, b]);
    assert_eq!(views.frame(root), Some(Rect::new(0.0, 0.0, 100.0, 10.0)));
    assert_eq!(views.frame(a), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
    assert_eq!(views.frame(b), Some(Rect::new(35.0, 0.0, 55.0, 10.0)));
    assert_eq!(views.commit_count(root), 1);
    assert!(views.diagnostics().is_empty());

    let committed = rt.tree().committed(root).unwrap();
    assert_eq!(committed.generation, rt.tree().generation(root));
    assert!(
        describe(&committed.layout).starts_with("n0.0 100x10 @ (0, 0)\n"),
        "{}",
        describe(&committed.layout)
    );
    assert!(rt.is_idle());
}

#[test]
fn mutation_during_a_pass_discards_the_stale_result() {
    // One pass at a time: the second request waits for the first to finish.
    let mut rt = runtime(SchedulerConfig::background());
    let (release, measure) = gate();
    let tree = rt.tree_mut();
    let root = tree.create_node();
    let slow = tree.create_node();
    let label = tree.create_node();
    tree.add_child(root, slow).unwrap();
    tree.add_child(root, label).unwrap();
    tree.set_measure(slow, measure).unwrap();
    tree.set_style(label, Style::preferred(Size::new(20.0, 10.0))).unwrap();
    row(tree, root);

    let range = SizeRange::exact(Size::new(100.0, 10.0));
    rt.request_layout(root, range, Priority::High).unwrap();
    let first = rt.pump();
    assert_eq!(first.dispatched, 1);

    // The worker is blocked in `slow`; change the tree under it.
    rt.tree_mut()
        .set_style(label, Style::preferred(Size::new(40.0, 10.0)))
        .unwrap();
    rt.request_layout(root, range, Priority::High).unwrap();
    assert_eq!(rt.pump().dispatched, 0, "window of one is full");

    drop(release);
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    let views = rt.hierarchy();
    assert_eq!(views.commit_count(root), 1);
    assert_eq!(views.frame(label), Some(Rect::new(35.0, 0.0, 75.0, 10.0)));
    let committed = rt.tree().committed(root).unwrap();
    assert_eq!(committed.generation, rt.tree().generation(root));
    assert_eq!(discards(&rt), [DiscardReason::Stale]);
}

#[test]
fn newer_request_supersedes_the_pass_in_flight() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let (release, measure) = gate();
    let tree = rt.tree_mut();
    let root = tree.create_node();
    let slow = tree.create_node();
    tree.add_child(root, slow).unwrap();
    tree.set_measure(slow, measure).unwrap();
    row(tree, root);

    rt.request_layout(root, SizeRange::exact(Size::new(100.0, 10.0)), Priority::Normal)
        .unwrap();
    assert_eq!(rt.pump().dispatched, 1);

    rt.tree_mut().invalidate(slow).unwrap();
    rt.request_layout(root, SizeRange::exact(Size::new(120.0, 10.0)), Priority::Normal)
        .unwrap();
    assert_eq!(rt.pump().dispatched, 1, "second pass runs alongside the first");

    drop(release);
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    let views = rt.hierarchy();
    assert_eq!(views.commit_count(root), 1);
    assert_eq!(views.frame(root), Some(Rect::new(0.0, 0.0, 120.0, 10.0)));
    assert_eq!(
        rt.tree().committed(root).unwrap().generation,
        rt.tree().generation(root)
    );
    assert_eq!(discards(&rt), [DiscardReason::Superseded]);
}

#[test]
fn panicking_provider_is_retried_then_given_up() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let root = rt.tree_mut().create_node();
    rt.tree_mut()
        .set_provider(root, |_: SizeRange, _: &[NodeId]| -> Element {
            panic!("provider exploded")
        })
        .unwrap();

    rt.request_layout(root, SizeRange::exact(Size::new(10.0, 10.0)), Priority::Normal)
        .unwrap();
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    let failures = rt.take_failures();
    assert_eq!(failures.len(), 3, "one attempt plus two retries");
    assert!(failures.iter().all(|d| matches!(
        d,
        Diagnostic::PassFailed { owner: Some(n), message } if *n == root && message == "provider exploded"
    )));
    assert_eq!(rt.hierarchy().commit_count(root), 0);
    assert!(rt.tree().committed(root).is_none());
}

#[test]
fn invalidated_root_is_laid_out_again_at_its_last_range() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let tree = rt.tree_mut();
    let root = tree.create_node();
    let a = tree.create_node();
    tree.add_child(root, a).unwrap();
    tree.set_style(a, Style::preferred(Size::new(30.0, 10.0))).unwrap();
    row(tree, root);

    rt.request_layout(root, SizeRange::exact(Size::new(80.0, 10.0)), Priority::High)
        .unwrap();
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    rt.tree_mut()
        .set_style(a, Style::preferred(Size::new(50.0, 10.0)))
        .unwrap();
    assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");

    let views = rt.hierarchy();
    assert_eq!(views.commit_count(root), 2);
    assert_eq!(views.frame(root), Some(Rect::new(0.0, 0.0, 80.0, 10.0)));
    assert_eq!(views.frame(a), Some(Rect::new(0.0, 0.0, 50.0, 10.0)));
}

#[test]
fn returning_to_an_earlier_width_moves_every_frame_back() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let tree = rt.tree_mut();
    let root = tree.create_node();
    let a = tree.create_node();
    let b = tree.create_node();
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();
    tree.set_style(a, Style::DEFAULT.grow(1.0)).unwrap();
    tree.set_style(b, Style::preferred(Size::new(20.0, 10.0))).unwrap();
    row(tree, root);

    for width in [100.0, 200.0, 100.0] {
        rt.request_layout(root, SizeRange::exact(Size::new(width, 10.0)), Priority::High)
            .unwrap();
        assert!(rt.run_until_idle(IDLE).unwrap(), "runtime did not settle");
    }

    let views = rt.hierarchy();
    assert_eq!(views.frame(root), Some(Rect::new(0.0, 0.0, 100.0, 10.0)));
    assert_eq!(views.frame(a), Some(Rect::new(0.0, 0.0, 75.0, 10.0)));
    assert_eq!(views.frame(b), Some(Rect::new(80.0, 0.0, 100.0, 10.0)));
    for node in [root, a, b] {
        assert_eq!(views.commit_count(node), 3);
        assert_eq!(rt.tree().committed_frame(node), views.frame(node));
        assert_eq!(
            views.layout(node),
            rt.tree().committed_layout(node).map(|l| &**l)
        );
    }
}

#[test]
fn stale_handles_are_rejected() {
    let mut rt = runtime(SchedulerConfig::interactive());
    let node = rt.tree_mut().create_node();
    rt.destroy_node(node).unwrap();
    assert!(
        rt.request_layout(node, SizeRange::UNBOUNDED, Priority::Low)
            .is_err()
    );
    assert!(rt.is_idle());
}
