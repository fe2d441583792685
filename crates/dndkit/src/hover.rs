#![forbid(unsafe_code)]

//! Pointer-to-slot resolution.
//!
//! Turns a viewport pointer position into the hovered slot of a container
//! and whether the pointer lies past that slot's midpoint along the
//! container's flow. Geometry comes from the rectangles frozen at the last
//! refresh, compared in content space so scrolling between refreshes does
//! not skew the result.

use dndkit_core::dom::Dom;
use dndkit_core::geometry::{Point, Rect};
use dndkit_core::scroll::accumulated_scroll;

use crate::container::{ContainerId, ItemId};
use crate::registry::DragRegistry;

/// The slot list of a container as seen by one drag.
///
/// See [`shift`](crate::shift) for how slots are counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slots {
    pub container: ContainerId,
    /// Items in live order, without the dragged item. Includes the
    /// placeholder only in the list the drag started from.
    pub items: Vec<ItemId>,
    /// Placeholder's slot, or `items.len()` when it is not in this list.
    pub placeholder_index: usize,
    pub placeholder: Option<ItemId>,
    pub is_self_list: bool,
}

impl Slots {
    /// Collect the slots of `container` for a drag of `dragged`.
    #[must_use]
    pub fn collect(dom: &dyn Dom, registry: &DragRegistry, container: ContainerId, dragged: ItemId) -> Self {
        let is_self_list = registry.item(dragged).and_then(|item| item.container()) == Some(container);
        let mut items: Vec<ItemId> = registry
            .ordered_members(dom, container, true)
            .into_iter()
            .filter(|id| *id != dragged)
            .collect();
        let position = items
            .iter()
            .position(|id| registry.item(*id).is_some_and(|item| item.is_placeholder()));
        let placeholder = position.map(|p| items[p]);
        if !is_self_list && let Some(p) = position {
            items.remove(p);
        }
        let placeholder_index = position.unwrap_or(items.len());
        Self {
            container,
            items,
            placeholder_index,
            placeholder,
            is_self_list,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Hovered slot of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hover {
    /// Item in the hovered slot; `None` past the end of a foreign list or
    /// when no slot has geometry.
    pub item: Option<ItemId>,
    pub index: usize,
    pub is_after: bool,
}

/// Scroll that applies to the children of `el`, including its own offset.
#[must_use]
pub fn child_scroll(dom: &dyn Dom, el: dndkit_core::dom::ElementId) -> Point {
    let own = if el == dom.scrolling_root() {
        Point::ZERO
    } else {
        dom.scroll_metrics(el).map_or(Point::ZERO, |m| m.offset)
    };
    accumulated_scroll(dom, el) + own
}

/// Resolve the hovered slot of `container` for a viewport `point`.
#[must_use]
pub fn resolve_hover(
    dom: &dyn Dom,
    registry: &DragRegistry,
    container: ContainerId,
    dragged: ItemId,
    point: Point,
) -> Hover {
    let slots = Slots::collect(dom, registry, container, dragged);
    resolve_hover_in(dom, registry, &slots, point)
}

/// Resolve the hovered slot among precollected `slots`.
#[must_use]
pub fn resolve_hover_in(dom: &dyn Dom, registry: &DragRegistry, slots: &Slots, point: Point) -> Hover {
    let stay = Hover {
        item: None,
        index: slots.placeholder_index,
        is_after: false,
    };
    let Some(container) = registry.container(slots.container) else {
        return stay;
    };
    let flow = container.flow();
    let p = point + child_scroll(dom, container.element());

    let rects: Vec<(usize, Rect)> = slots
        .items
        .iter()
        .enumerate()
        .filter_map(|(i, id)| registry.item(*id)?.content_rect().map(|r| (i, r)))
        .collect();
    let (Some(&(first, first_rect)), Some(&(last, last_rect))) = (rects.first(), rects.last()) else {
        return stay;
    };

    let at = |index: usize, is_after: bool| Hover {
        item: slots.items.get(index).copied(),
        index,
        is_after,
    };

    if let Some((i, r)) = rects.iter().find(|(_, r)| r.contains(p)) {
        return at(*i, flow.pos(p) > flow.mid(r));
    }

    let pos = flow.pos(p);
    if pos < flow.start(&first_rect) {
        return at(first, false);
    }
    if pos >= flow.end(&last_rect) {
        return if slots.is_self_list {
            at(last, true)
        } else {
            at(slots.items.len(), true)
        };
    }
    rects
        .iter()
        .find(|(_, r)| flow.end(r) > pos)
        .map_or(at(last, true), |(i, r)| at(*i, pos > flow.mid(r)))
}
