#![forbid(unsafe_code)]

//! Host document abstraction.
//!
//! The drag engine never touches a rendering surface directly. Everything it
//! needs from the host (tree structure, live geometry, scroll state and a few
//! presentation writes) goes through the [`Dom`] trait, so the engine can run
//! against a browser adapter or against [`MemoryDom`](crate::memory_dom::MemoryDom)
//! in tests.
//!
//! # Invariants
//!
//! 1. [`Dom::children`] always reflects live document order.
//! 2. [`Dom::rect`] reports viewport coordinates *including* any translate
//!    applied through [`StyleDecl::Transform`], like `getBoundingClientRect`.
//! 3. [`Dom::rect`] returns `None` for elements without a layout box
//!    (detached, collapsed, or inside a collapsed ancestor).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Stable identifier for a host element.
///
/// Identity is assigned by the host and never reused while the element is
/// alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a raw host identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Computed `overflow` value of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
    Overlay,
}

impl Overflow {
    /// Returns true for values that create a user-scrollable box.
    #[must_use]
    pub const fn is_scrollable(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll | Self::Overlay)
    }
}

/// Scroll state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
    /// Visible (client) extent.
    pub client: Size,
    /// Full scrollable extent.
    pub content: Size,
    /// Current scroll offset (`scrollLeft`, `scrollTop`).
    pub offset: Point,
}

impl ScrollMetrics {
    /// Returns true if the element scrolls on either axis, either because of
    /// its computed overflow or because its content exceeds its client box.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.overflow_x.is_scrollable()
            || self.overflow_y.is_scrollable()
            || self.content.width > self.client.width
            || self.content.height > self.client.height
    }

    /// Maximum scroll offset on each axis.
    #[must_use]
    pub fn max_offset(&self) -> Point {
        Point::new(
            (self.content.width - self.client.width).max(0.0),
            (self.content.height - self.client.height).max(0.0),
        )
    }
}

/// Where to insert an element relative to a reference element, mirroring
/// `insertAdjacentElement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    /// Immediately before the reference, as a sibling.
    BeforeBegin,
    /// Immediately after the reference, as a sibling.
    AfterEnd,
    /// As the last child of the reference.
    BeforeEnd,
}

/// A CSS length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Px(f64),
    /// Percentage of the containing block (0..=100).
    Percent(f64),
}

impl Length {
    /// Resolve against the containing block extent.
    #[must_use]
    pub fn resolve(self, containing: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => containing * pct / 100.0,
        }
    }
}

/// Presentation properties the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKey {
    Transform,
    Transition,
    Width,
    Height,
    Fixed,
    ZIndex,
    PointerEvents,
    Visibility,
    Display,
}

/// A single presentation declaration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prop", content = "value", rename_all = "snake_case")]
pub enum StyleDecl {
    /// `transform: translate3d(x, y, 0)`.
    Transform(Point),
    /// `transition: transform <duration> ease`.
    Transition(Duration),
    Width(Length),
    Height(Length),
    /// `position: fixed` at the given viewport point.
    Fixed(Point),
    ZIndex(i32),
    /// `pointer-events: none`.
    PointerEventsNone,
    /// `visibility: hidden` (keeps the layout box).
    Hidden,
    /// `display: none` (removes the layout box).
    Collapsed,
}

impl StyleDecl {
    /// The property this declaration sets.
    #[must_use]
    pub const fn key(&self) -> StyleKey {
        match self {
            Self::Transform(_) => StyleKey::Transform,
            Self::Transition(_) => StyleKey::Transition,
            Self::Width(_) => StyleKey::Width,
            Self::Height(_) => StyleKey::Height,
            Self::Fixed(_) => StyleKey::Fixed,
            Self::ZIndex(_) => StyleKey::ZIndex,
            Self::PointerEventsNone => StyleKey::PointerEvents,
            Self::Hidden => StyleKey::Visibility,
            Self::Collapsed => StyleKey::Display,
        }
    }
}

/// Read/write access to the host document.
///
/// Write operations are presentation-only: the engine never mutates
/// application data through this trait.
pub trait Dom {
    /// The body element; floating drag clones are appended here.
    fn root(&self) -> ElementId;

    /// The document's scrolling element, used as the fallback scroll container.
    fn scrolling_root(&self) -> ElementId;

    /// Parent element, or `None` for the root and detached elements.
    fn parent(&self, el: ElementId) -> Option<ElementId>;

    /// Children in live document order.
    fn children(&self, el: ElementId) -> Vec<ElementId>;

    /// Live viewport rectangle, or `None` if the element is not rendered.
    fn rect(&self, el: ElementId) -> Option<Rect>;

    /// Scroll state, or `None` if the element is not rendered.
    fn scroll_metrics(&self, el: ElementId) -> Option<ScrollMetrics>;

    /// Window scroll offset (`scrollX`, `scrollY`).
    fn window_scroll(&self) -> Point;

    /// Create a detached, empty block element.
    fn create_element(&mut self) -> ElementId;

    /// Shallow-clone an element (size, classes, and styles) into a detached
    /// element. Returns `None` if `el` is unknown.
    fn clone_element(&mut self, el: ElementId) -> Option<ElementId>;

    /// Insert `el` relative to `reference`, detaching it from any previous
    /// position first. Returns false if the insertion was impossible.
    fn insert(&mut self, reference: ElementId, position: InsertPosition, el: ElementId) -> bool;

    /// Remove `el` from the document. Detaching a detached element is a no-op.
    fn detach(&mut self, el: ElementId);

    /// Set (or replace) a presentation property.
    fn set_style(&mut self, el: ElementId, decl: StyleDecl);

    /// Remove a presentation property.
    fn clear_style(&mut self, el: ElementId, key: StyleKey);

    /// Current value of a presentation property set through [`Dom::set_style`].
    fn style(&self, el: ElementId, key: StyleKey) -> Option<StyleDecl>;

    /// Add or remove a class.
    fn set_class(&mut self, el: ElementId, class: &str, on: bool);

    /// Scroll an element (or the window, when `el` is the scrolling root) by
    /// the given delta, clamped to its scroll range.
    fn scroll_by(&mut self, el: ElementId, delta: Point);

    /// Append `el` as the last child of `parent`.
    fn append_child(&mut self, parent: ElementId, el: ElementId) -> bool {
        self.insert(parent, InsertPosition::BeforeEnd, el)
    }

    /// Returns true if `ancestor` is `el` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut cursor = Some(el);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Number of ancestors between `el` and the root.
    fn depth(&self, el: ElementId) -> usize {
        let mut depth = 0;
        let mut cursor = self.parent(el);
        while let Some(current) = cursor {
            depth += 1;
            cursor = self.parent(current);
        }
        depth
    }

    /// Translate currently applied through [`StyleDecl::Transform`].
    fn transform(&self, el: ElementId) -> Point {
        match self.style(el, StyleKey::Transform) {
            Some(StyleDecl::Transform(offset)) => offset,
            _ => Point::ZERO,
        }
    }

    /// Viewport rectangle with any applied translate removed.
    fn untransformed_rect(&self, el: ElementId) -> Option<Rect> {
        self.rect(el).map(|rect| rect.translate(-self.transform(el)))
    }
}
