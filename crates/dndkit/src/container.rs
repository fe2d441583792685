#![forbid(unsafe_code)]

//! Container and item capability surface.
//!
//! A [`DropContainer`] is an ordered drop target; a [`DraggableItem`] is an
//! element that can be picked up. Both are owned by the
//! [`DragRegistry`](crate::registry::DragRegistry) and addressed by stable
//! integer ids. Application behavior (what happens on drop, custom placeholder
//! templates) plugs in through [`DropHandler`].
//!
//! # Invariants
//!
//! 1. Member order is never stored: it is recomputed from live document order.
//! 2. An item belongs to at most one container.
//! 3. Geometry captured by [`DraggableItem::refresh_rect`] is untransformed,
//!    so shift transforms applied during a drag never feed back into hit
//!    testing.

use std::collections::BTreeSet;
use std::fmt;

use dndkit_core::dom::{Dom, ElementId, Length, StyleDecl};
use dndkit_core::geometry::{Axis, Point, Rect};
use dndkit_core::scroll::accumulated_scroll;
use serde::{Deserialize, Serialize};

use crate::config::ContainerConfig;

/// Class carried by default placeholder elements.
pub const PLACEHOLDER_CLASS: &str = "dnd-placeholder";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable container identifier assigned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(u64);

impl ContainerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Stable item identifier assigned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Layout direction of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Horizontal,
    #[default]
    Vertical,
}

impl Direction {
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Horizontal => Axis::Horizontal,
            Self::Vertical => Axis::Vertical,
        }
    }
}

// ---------------------------------------------------------------------------
// Flow coordinates
// ---------------------------------------------------------------------------

/// Main axis of a container, mirrored for right-to-left horizontal lists so
/// that "start" is always where the first item sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowAxis {
    pub axis: Axis,
    pub reversed: bool,
}

impl FlowAxis {
    #[must_use]
    pub fn new(direction: Direction, rtl: bool) -> Self {
        Self {
            axis: direction.axis(),
            reversed: rtl && direction == Direction::Horizontal,
        }
    }

    /// Flow position of a point.
    #[must_use]
    pub fn pos(self, point: Point) -> f64 {
        let v = point.along(self.axis);
        if self.reversed { -v } else { v }
    }

    /// Leading edge in flow order.
    #[must_use]
    pub fn start(self, rect: &Rect) -> f64 {
        if self.reversed {
            -rect.end(self.axis)
        } else {
            rect.start(self.axis)
        }
    }

    /// Trailing edge in flow order.
    #[must_use]
    pub fn end(self, rect: &Rect) -> f64 {
        self.start(rect) + rect.extent(self.axis)
    }

    #[must_use]
    pub fn mid(self, rect: &Rect) -> f64 {
        self.start(rect) + rect.extent(self.axis) / 2.0
    }

    /// Physical offset for a displacement of `delta` along the flow.
    #[must_use]
    pub fn offset(self, delta: f64) -> Point {
        Point::on_axis(self.axis, if self.reversed { -delta } else { delta })
    }
}

// ---------------------------------------------------------------------------
// DropEvent / DropHandler
// ---------------------------------------------------------------------------

/// Outcome of one completed drag, delivered to the destination container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    pub previous_index: usize,
    pub current_index: usize,
    pub item: ItemId,
    pub container: ContainerId,
    pub previous_container: ContainerId,
}

impl DropEvent {
    /// Returns true if the drop moves nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.container == self.previous_container && self.previous_index == self.current_index
    }
}

/// Application hooks of a container.
pub trait DropHandler {
    /// A drag finished over this container. The application reorders or
    /// transfers its own data.
    fn on_drop(&mut self, event: &DropEvent);

    /// Materialize a custom placeholder element. Return `None` to use the
    /// default block sized to the dragged item.
    fn create_placeholder(&mut self, _dom: &mut dyn Dom, _dragged_rect: Rect) -> Option<ElementId> {
        None
    }

    /// The placeholder left this container.
    fn dispose_placeholder(&mut self) {}
}

/// Handler that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDropHandler;

impl DropHandler for NoopDropHandler {
    fn on_drop(&mut self, _event: &DropEvent) {}
}

impl<F> DropHandler for F
where
    F: FnMut(&DropEvent),
{
    fn on_drop(&mut self, event: &DropEvent) {
        self(event);
    }
}

// ---------------------------------------------------------------------------
// DropContainer
// ---------------------------------------------------------------------------

/// A registered drop list.
pub struct DropContainer {
    id: ContainerId,
    element: ElementId,
    config: ContainerConfig,
    handler: Box<dyn DropHandler>,
    members: BTreeSet<ItemId>,
    rect: Option<Rect>,
    dragging: bool,
}

impl fmt::Debug for DropContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropContainer")
            .field("id", &self.id)
            .field("element", &self.element)
            .field("config", &self.config)
            .field("members", &self.members)
            .field("rect", &self.rect)
            .field("dragging", &self.dragging)
            .finish_non_exhaustive()
    }
}

impl DropContainer {
    pub(crate) fn new(
        id: ContainerId,
        element: ElementId,
        config: ContainerConfig,
        handler: Box<dyn DropHandler>,
    ) -> Self {
        Self {
            id,
            element,
            config,
            handler,
            members: BTreeSet::new(),
            rect: None,
            dragging: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.config.direction
    }

    #[must_use]
    pub fn is_rtl(&self) -> bool {
        self.config.rtl
    }

    #[must_use]
    pub fn is_sort_disabled(&self) -> bool {
        self.config.disable_sort
    }

    #[must_use]
    pub fn connected_to(&self) -> &[ElementId] {
        &self.config.connected_to
    }

    #[must_use]
    pub fn flow(&self) -> FlowAxis {
        FlowAxis::new(self.config.direction, self.config.rtl)
    }

    /// Registered members in no particular order; see
    /// [`DragRegistry::ordered_members`](crate::registry::DragRegistry::ordered_members).
    pub fn members(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.members.iter().copied()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn add_member(&mut self, item: ItemId) {
        self.members.insert(item);
    }

    pub(crate) fn remove_member(&mut self, item: ItemId) {
        self.members.remove(&item);
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub(crate) fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Rectangle captured at the last geometry refresh.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Live viewport rectangle.
    #[must_use]
    pub fn live_rect(&self, dom: &dyn Dom) -> Option<Rect> {
        dom.rect(self.element)
    }

    /// Recapture the container rectangle. Returns false if it has no box.
    pub fn refresh_rect(&mut self, dom: &dyn Dom) -> bool {
        self.rect = dom.untransformed_rect(self.element);
        self.rect.is_some()
    }

    /// Returns true if items dragged out of `source` may be dropped here.
    #[must_use]
    pub fn check_allowed_connections(&self, source: &DropContainer) -> bool {
        source.id == self.id || self.config.connected_to.contains(&source.element)
    }

    /// Create a detached placeholder element for an item of `dragged_rect`.
    pub fn add_placeholder(&mut self, dom: &mut dyn Dom, dragged_rect: Rect) -> ElementId {
        if let Some(el) = self.handler.create_placeholder(dom, dragged_rect) {
            return el;
        }
        let el = dom.create_element();
        dom.set_style(el, StyleDecl::Width(Length::Px(dragged_rect.width)));
        dom.set_style(el, StyleDecl::Height(Length::Px(dragged_rect.height)));
        dom.set_class(el, PLACEHOLDER_CLASS, true);
        el
    }

    pub fn dispose_placeholder(&mut self) {
        self.handler.dispose_placeholder();
    }

    pub fn on_drop(&mut self, event: &DropEvent) {
        self.handler.on_drop(event);
    }
}

// ---------------------------------------------------------------------------
// DraggableItem
// ---------------------------------------------------------------------------

/// A registered draggable element, or the synthetic wrapper around a
/// placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggableItem {
    id: ItemId,
    element: ElementId,
    container: Option<ContainerId>,
    rect: Option<Rect>,
    scroll: Point,
    offset: Point,
    is_placeholder: bool,
}

impl DraggableItem {
    pub(crate) fn new(
        id: ItemId,
        element: ElementId,
        container: Option<ContainerId>,
        is_placeholder: bool,
    ) -> Self {
        Self {
            id,
            element,
            container,
            rect: None,
            scroll: Point::ZERO,
            offset: Point::ZERO,
            is_placeholder,
        }
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    #[must_use]
    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub(crate) fn set_container(&mut self, container: Option<ContainerId>) {
        self.container = container;
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    /// Viewport rectangle frozen at the last refresh.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Frozen rectangle in content space (viewport plus the scroll of every
    /// ancestor at capture time). Stable while ancestors scroll.
    #[must_use]
    pub fn content_rect(&self) -> Option<Rect> {
        self.rect.map(|rect| rect.translate(self.scroll))
    }

    /// Visual translation currently applied by the engine.
    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Live geometry with any active transform removed.
    #[must_use]
    pub fn live_rect(&self, dom: &dyn Dom) -> Option<Rect> {
        dom.untransformed_rect(self.element)
    }

    /// Recapture geometry. Returns false, keeping the previous capture, if the
    /// element has no layout box or a degenerate one.
    pub fn refresh_rect(&mut self, dom: &dyn Dom) -> bool {
        match self.live_rect(dom) {
            Some(rect) if !rect.is_degenerate() => {
                self.rect = Some(rect);
                self.scroll = accumulated_scroll(dom, self.element);
                true
            }
            _ => false,
        }
    }
}
