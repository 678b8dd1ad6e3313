// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of layout trees.

use std::fmt::Write as _;

use weft_core::element::ElementRef;
use weft_core::layout::Layout;

/// Renders `layout` as one line per element, indented two spaces per level.
///
/// ```text
/// n0.0 320x96 @ (0, 0)
///   Stack 320x96 @ (0, 0)
///     Leaf#7 40x40 @ (8, 28)
/// ```
#[must_use]
pub fn describe(layout: &Layout) -> String {
    let mut out = String::new();
    layout.visit(&mut |l, depth| {
        let _ = writeln!(
            out,
            "{:indent$}{} {}x{} @ ({}, {})",
            "",
            label(l.element),
            l.size.width,
            l.size.height,
            l.position.x,
            l.position.y,
            indent = depth * 2,
        );
    });
    out
}

fn label(element: ElementRef) -> String {
    match element {
        ElementRef::Node(id) => format!("n{}.{}", id.index(), id.slot_generation()),
        ElementRef::Spec { ty, key: Some(key) } => format!("{ty:?}#{key}"),
        ElementRef::Spec { ty, key: None } => format!("{ty:?}"),
    }
}
