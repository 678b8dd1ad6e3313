// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout elements.
//!
//! An [`Element`] is an immutable description of how to size and position a
//! subtree: a [`Style`] plus one [`ElementKind`] variant. Children are shared
//! through [`Arc`], so an element tree can be handed to a worker thread and
//! reused across passes without copying.
//!
//! | Variant        | Children            | Size comes from                       |
//! |----------------|---------------------|---------------------------------------|
//! | [`Leaf`]       | none                | [`Measure`], or the range minimum     |
//! | `Node`         | a child node        | that node's provider or measure       |
//! | [`Stack`]      | many, in flow       | flex distribution along an axis       |
//! | [`Inset`]      | one                 | child plus finite insets              |
//! | [`Overlay`]    | base + overlay      | base                                  |
//! | [`Background`] | background + child  | child                                 |
//! | [`Ratio`]      | one                 | `height = ratio * width`              |
//! | [`Absolute`]   | many, positioned    | range max or children's bounding box  |
//! | [`Center`]     | one                 | range max, optionally shrunk to child |
//! | [`Relative`]   | one                 | as `Center`, per-axis start/center/end |
//! | [`Corner`]     | child + corner      | child, optionally wrapping the corner |
//! | [`Edge`]       | child + edge        | child                                 |

mod measure;

pub use measure::{ElementProvider, IntrinsicSize, Measure, MeasureError};

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Insets, Size, Vec2};

use crate::dimension::Axis;
use crate::node::NodeId;
use crate::style::Style;

/// A layout participant.
#[derive(Clone, Debug)]
pub struct Element {
    /// Caller-chosen identity, carried into the [`Layout`](crate::layout::Layout).
    pub key: Option<u64>,
    /// Sizing and flex properties.
    pub style: Style,
    /// What kind of element this is.
    pub kind: ElementKind,
}

/// The element variants.
#[derive(Clone, Debug)]
pub enum ElementKind {
    /// Content measured by the outside world.
    Leaf(Leaf),
    /// A child node, laid out by its own provider.
    ///
    /// The node's style replaces the element's style.
    Node(NodeId),
    /// Flex flow along one axis.
    Stack(Stack),
    /// Child padded by insets.
    Inset(Inset),
    /// Overlay stretched over a base child.
    Overlay(Overlay),
    /// Background stretched under a child.
    Background(Background),
    /// Child forced to an aspect ratio.
    Ratio(Ratio),
    /// Children at declared positions.
    Absolute(Absolute),
    /// Child centered on one or both axes.
    Center(Center),
    /// Child placed at start, center or end per axis.
    Relative(Relative),
    /// Child with an element pinned to one of its corners.
    Corner(Corner),
    /// Child with an element placed against one of its edges.
    Edge(Edge),
}

/// Discriminant of an [`ElementKind`], used in [`ElementRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    /// [`ElementKind::Leaf`].
    Leaf,
    /// [`ElementKind::Node`].
    Node,
    /// [`ElementKind::Stack`].
    Stack,
    /// [`ElementKind::Inset`].
    Inset,
    /// [`ElementKind::Overlay`].
    Overlay,
    /// [`ElementKind::Background`].
    Background,
    /// [`ElementKind::Ratio`].
    Ratio,
    /// [`ElementKind::Absolute`].
    Absolute,
    /// [`ElementKind::Center`].
    Center,
    /// [`ElementKind::Relative`].
    Relative,
    /// [`ElementKind::Corner`].
    Corner,
    /// [`ElementKind::Edge`].
    Edge,
}

/// Identity of the element that produced a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementRef {
    /// A node's own layout.
    Node(NodeId),
    /// Any other element.
    Spec {
        /// Which variant.
        ty: ElementType,
        /// The element's [`key`](Element::key).
        key: Option<u64>,
    },
}

impl ElementRef {
    /// Returns the node, if this refers to one.
    #[must_use]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Spec { .. } => None,
        }
    }
}

impl Element {
    /// Creates an element with the default style.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            key: None,
            style: Style::DEFAULT,
            kind,
        }
    }

    /// A leaf measured by `measure`.
    #[must_use]
    pub fn leaf(measure: impl Measure + 'static) -> Self {
        Self::new(ElementKind::Leaf(Leaf::measured(measure)))
    }

    /// A leaf with a preferred size and no content.
    #[must_use]
    pub fn fixed(size: Size) -> Self {
        Self::new(ElementKind::Leaf(Leaf::empty())).with_style(Style::preferred(size))
    }

    /// A reference to a child node.
    #[must_use]
    pub fn node(id: NodeId) -> Self {
        Self::new(ElementKind::Node(id))
    }

    /// Replaces the style.
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: u64) -> Self {
        self.key = Some(key);
        self
    }

    /// Returns the variant discriminant.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match &self.kind {
            ElementKind::Leaf(_) => ElementType::Leaf,
            ElementKind::Node(_) => ElementType::Node,
            ElementKind::Stack(_) => ElementType::Stack,
            ElementKind::Inset(_) => ElementType::Inset,
            ElementKind::Overlay(_) => ElementType::Overlay,
            ElementKind::Background(_) => ElementType::Background,
            ElementKind::Ratio(_) => ElementType::Ratio,
            ElementKind::Absolute(_) => ElementType::Absolute,
            ElementKind::Center(_) => ElementType::Center,
            ElementKind::Relative(_) => ElementType::Relative,
            ElementKind::Corner(_) => ElementType::Corner,
            ElementKind::Edge(_) => ElementType::Edge,
        }
    }

    /// Returns the identity recorded in layouts produced from this element.
    #[must_use]
    pub fn reference(&self) -> ElementRef {
        match self.kind {
            ElementKind::Node(id) => ElementRef::Node(id),
            _ => ElementRef::Spec {
                ty: self.element_type(),
                key: self.key,
            },
        }
    }
}

macro_rules! impl_into_element {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Element {
                fn from(spec: $ty) -> Self {
                    Self::new(ElementKind::$ty(spec))
                }
            }
        )*
    };
}

impl_into_element!(
    Leaf, Stack, Inset, Overlay, Background, Ratio, Absolute, Center, Relative, Corner, Edge
);

/// Leaf content.
#[derive(Clone, Default)]
pub struct Leaf {
    /// Measures the content; `None` means the leaf takes the range minimum.
    pub measure: Option<Arc<dyn Measure>>,
}

impl Leaf {
    /// A leaf with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self { measure: None }
    }

    /// A leaf measured by `measure`.
    #[must_use]
    pub fn measured(measure: impl Measure + 'static) -> Self {
        Self {
            measure: Some(Arc::new(measure)),
        }
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("measured", &self.measure.is_some())
            .finish()
    }
}

/// Main-axis placement of leftover space in a [`Stack`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Justify {
    /// Pack children at the start.
    #[default]
    Start,
    /// Center the children.
    Center,
    /// Pack children at the end.
    End,
    /// First child at the start, last at the end, equal gaps between.
    SpaceBetween,
    /// Equal space around every child.
    SpaceAround,
}

/// Default cross-axis alignment of [`Stack`] children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlignItems {
    /// Align to the cross-axis start.
    Start,
    /// Center on the cross axis.
    Center,
    /// Align to the cross-axis end.
    End,
    /// Fill the stack's cross size.
    #[default]
    Stretch,
}

/// Whether a [`Stack`] breaks its children into several lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlexWrap {
    /// One line, however long.
    #[default]
    NoWrap,
    /// Start a new line when the next child would pass the main-axis maximum.
    Wrap,
}

/// Cross-axis placement of the lines of a wrapping [`Stack`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlignContent {
    /// Pack lines at the cross-axis start.
    #[default]
    Start,
    /// Center the lines.
    Center,
    /// Pack lines at the cross-axis end.
    End,
    /// First line at the start, last at the end, equal gaps between.
    SpaceBetween,
    /// Equal space around every line.
    SpaceAround,
    /// Share the leftover space equally among the lines.
    Stretch,
}

/// Flex flow along one axis.
#[derive(Clone, Debug)]
pub struct Stack {
    /// Main axis.
    pub direction: Axis,
    /// Space between adjacent children.
    pub spacing: f64,
    /// Placement of leftover main-axis space.
    pub justify: Justify,
    /// Default cross-axis alignment.
    pub align_items: AlignItems,
    /// Single or multiple lines.
    pub wrap: FlexWrap,
    /// Placement of lines when wrapping.
    pub align_content: AlignContent,
    /// Space between adjacent lines.
    pub line_spacing: f64,
    /// Children in flow order.
    pub children: Vec<Arc<Element>>,
}

impl Stack {
    /// An empty stack along `direction`.
    #[must_use]
    pub fn new(direction: Axis) -> Self {
        Self {
            direction,
            spacing: 0.0,
            justify: Justify::Start,
            align_items: AlignItems::Stretch,
            wrap: FlexWrap::NoWrap,
            align_content: AlignContent::Start,
            line_spacing: 0.0,
            children: Vec::new(),
        }
    }

    /// An empty horizontal stack.
    #[must_use]
    pub fn horizontal() -> Self {
        Self::new(Axis::Horizontal)
    }

    /// An empty vertical stack.
    #[must_use]
    pub fn vertical() -> Self {
        Self::new(Axis::Vertical)
    }

    /// Sets the spacing between children.
    #[must_use]
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets main-axis justification.
    #[must_use]
    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    /// Sets cross-axis alignment.
    #[must_use]
    pub fn align_items(mut self, align: AlignItems) -> Self {
        self.align_items = align;
        self
    }

    /// Sets line wrapping.
    #[must_use]
    pub fn wrap(mut self, wrap: FlexWrap) -> Self {
        self.wrap = wrap;
        self
    }

    /// Sets the cross-axis placement of lines.
    #[must_use]
    pub fn align_content(mut self, align: AlignContent) -> Self {
        self.align_content = align;
        self
    }

    /// Sets the spacing between lines.
    #[must_use]
    pub fn line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Arc<Element>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Element>>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

/// Child padded by insets. An infinite inset pushes the child to the
/// opposite edge.
#[derive(Clone, Debug)]
pub struct Inset {
    /// Left (`x0`), top (`y0`), right (`x1`) and bottom (`y1`) insets.
    pub insets: Insets,
    /// The padded child.
    pub child: Arc<Element>,
}

impl Inset {
    /// Pads `child` by `insets`.
    #[must_use]
    pub fn new(insets: Insets, child: impl Into<Arc<Element>>) -> Self {
        Self {
            insets,
            child: child.into(),
        }
    }
}

/// Overlay stretched over a base child.
#[derive(Clone, Debug)]
pub struct Overlay {
    /// Determines the size.
    pub child: Arc<Element>,
    /// Laid out at exactly the child's size, on top.
    pub overlay: Arc<Element>,
}

impl Overlay {
    /// Covers `child` with `overlay`.
    #[must_use]
    pub fn new(child: impl Into<Arc<Element>>, overlay: impl Into<Arc<Element>>) -> Self {
        Self {
            child: child.into(),
            overlay: overlay.into(),
        }
    }
}

/// Background stretched under a child.
#[derive(Clone, Debug)]
pub struct Background {
    /// Determines the size.
    pub child: Arc<Element>,
    /// Laid out at exactly the child's size, underneath.
    pub background: Arc<Element>,
}

impl Background {
    /// Puts `background` behind `child`.
    #[must_use]
    pub fn new(child: impl Into<Arc<Element>>, background: impl Into<Arc<Element>>) -> Self {
        Self {
            child: child.into(),
            background: background.into(),
        }
    }
}

/// Child forced to an aspect ratio.
#[derive(Clone, Debug)]
pub struct Ratio {
    /// `height / width`; must be positive.
    pub ratio: f64,
    /// The constrained child.
    pub child: Arc<Element>,
}

impl Ratio {
    /// Constrains `child` to `height = ratio * width`.
    #[must_use]
    pub fn new(ratio: f64, child: impl Into<Arc<Element>>) -> Self {
        Self {
            ratio,
            child: child.into(),
        }
    }
}

/// How an [`Absolute`] container picks its own size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AbsoluteSizing {
    /// The range maximum where finite, the children's extent otherwise.
    #[default]
    Default,
    /// Always the children's extent, clamped into the range.
    SizeToFit,
}

/// Children at their declared [`Style::layout_position`].
#[derive(Clone, Debug, Default)]
pub struct Absolute {
    /// How the container sizes itself.
    pub sizing: AbsoluteSizing,
    /// Positioned children.
    pub children: Vec<Arc<Element>>,
}

impl Absolute {
    /// An absolute container with the given sizing and children.
    #[must_use]
    pub fn new<I>(sizing: AbsoluteSizing, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Element>>,
    {
        Self {
            sizing,
            children: children.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lets a centering or relative container shrink to its child.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SizingOptions {
    /// Use the child's width rather than the range maximum.
    pub minimum_width: bool,
    /// Use the child's height rather than the range maximum.
    pub minimum_height: bool,
}

impl SizingOptions {
    /// Fill the range maximum on both axes.
    pub const DEFAULT: Self = Self {
        minimum_width: false,
        minimum_height: false,
    };
    /// Shrink width to the child.
    pub const MINIMUM_WIDTH: Self = Self {
        minimum_width: true,
        minimum_height: false,
    };
    /// Shrink height to the child.
    pub const MINIMUM_HEIGHT: Self = Self {
        minimum_width: false,
        minimum_height: true,
    };
    /// Shrink both axes to the child.
    pub const MINIMUM_XY: Self = Self {
        minimum_width: true,
        minimum_height: true,
    };
}

/// Which axes a [`Center`] centers on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Centering {
    /// Leave the child at the origin.
    None,
    /// Center horizontally.
    X,
    /// Center vertically.
    Y,
    /// Center on both axes.
    #[default]
    XY,
}

/// Child centered within the container.
#[derive(Clone, Debug)]
pub struct Center {
    /// Which axes to center on.
    pub centering: Centering,
    /// Whether the container shrinks to the child.
    pub sizing: SizingOptions,
    /// The centered child.
    pub child: Arc<Element>,
}

impl Center {
    /// Centers `child` on both axes.
    #[must_use]
    pub fn new(child: impl Into<Arc<Element>>) -> Self {
        Self {
            centering: Centering::XY,
            sizing: SizingOptions::DEFAULT,
            child: child.into(),
        }
    }

    /// Sets the centering axes.
    #[must_use]
    pub fn centering(mut self, centering: Centering) -> Self {
        self.centering = centering;
        self
    }

    /// Sets the sizing options.
    #[must_use]
    pub fn sizing(mut self, sizing: SizingOptions) -> Self {
        self.sizing = sizing;
        self
    }
}

/// Placement of a [`Relative`] child along one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RelativePosition {
    /// At the start.
    #[default]
    Start,
    /// Centered.
    Center,
    /// At the end.
    End,
}

impl RelativePosition {
    pub(crate) const fn proportion(self) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Center => 0.5,
            Self::End => 1.0,
        }
    }
}

/// Child placed at start, center or end on each axis.
#[derive(Clone, Debug)]
pub struct Relative {
    /// Horizontal placement.
    pub horizontal: RelativePosition,
    /// Vertical placement.
    pub vertical: RelativePosition,
    /// Whether the container shrinks to the child.
    pub sizing: SizingOptions,
    /// The placed child.
    pub child: Arc<Element>,
}

impl Relative {
    /// Places `child` at the given positions.
    #[must_use]
    pub fn new(
        horizontal: RelativePosition,
        vertical: RelativePosition,
        child: impl Into<Arc<Element>>,
    ) -> Self {
        Self {
            horizontal,
            vertical,
            sizing: SizingOptions::DEFAULT,
            child: child.into(),
        }
    }

    /// Sets the sizing options.
    #[must_use]
    pub fn sizing(mut self, sizing: SizingOptions) -> Self {
        self.sizing = sizing;
        self
    }
}

/// Which corner a [`Corner`] element is pinned to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CornerLocation {
    /// Top left.
    TopLeft,
    /// Top right.
    #[default]
    TopRight,
    /// Bottom left.
    BottomLeft,
    /// Bottom right.
    BottomRight,
}

/// Child with an element centered on one of its corners, like a badge.
#[derive(Clone, Debug)]
pub struct Corner {
    /// Determines the base size.
    pub child: Arc<Element>,
    /// Pinned to the corner, sized by its own style.
    pub corner: Arc<Element>,
    /// Which corner.
    pub location: CornerLocation,
    /// Added to the corner element's centered position.
    pub offset: Vec2,
    /// Grow the layout to include the corner element.
    pub wraps_corner: bool,
}

impl Corner {
    /// Pins `corner` to `location` of `child`.
    #[must_use]
    pub fn new(
        child: impl Into<Arc<Element>>,
        corner: impl Into<Arc<Element>>,
        location: CornerLocation,
    ) -> Self {
        Self {
            child: child.into(),
            corner: corner.into(),
            location,
            offset: Vec2::ZERO,
            wraps_corner: false,
        }
    }

    /// Sets the offset.
    #[must_use]
    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Sets whether the layout wraps the corner element.
    #[must_use]
    pub fn wraps_corner(mut self, wraps: bool) -> Self {
        self.wraps_corner = wraps;
        self
    }
}

/// Which edge an [`Edge`] element sits against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeLocation {
    /// Above the child.
    #[default]
    Top,
    /// Left of the child.
    Left,
    /// Below the child.
    Bottom,
    /// Right of the child.
    Right,
}

/// Child with an element placed just outside one of its edges and centered
/// along it. The child alone determines the size.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Determines the size.
    pub child: Arc<Element>,
    /// Placed against the edge, sized by its own style.
    pub edge: Arc<Element>,
    /// Which edge.
    pub location: EdgeLocation,
    /// Distance from the edge, away from the child.
    pub offset: f64,
}

impl Edge {
    /// Places `edge` against `location` of `child`.
    #[must_use]
    pub fn new(child: impl Into<Arc<Element>>, edge: impl Into<Arc<Element>>, location: EdgeLocation) -> Self {
        Self {
            child: child.into(),
            edge: edge.into(),
            location,
            offset: 0.0,
        }
    }

    /// Sets the offset.
    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}
