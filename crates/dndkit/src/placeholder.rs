#![forbid(unsafe_code)]

//! Placeholder lifecycle.
//!
//! The placeholder is a synthetic element marking where the dragged item
//! would land. [`PlaceholderController::show`] inserts it into a container,
//! [`PlaceholderController::update`] relocates it (and shifts the siblings it
//! passes) purely with translate transforms as the pointer moves, and
//! [`PlaceholderController::hide`] tears it down.
//!
//! While the placeholder stays in one container its document position never
//! changes; only transforms do. All geometry is compared in content space so
//! a scroll between refreshes does not skew the computed offsets.
//!
//! # Invariants
//!
//! 1. At most one placeholder exists at a time.
//! 2. An `update` that would produce the same frame as the previous one
//!    writes nothing to the host document, so transitions are not restarted.
//! 3. `hide` leaves no engine transform or transition on any registered item.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Captured rect is degenerate | Placeholder inside a collapsing flex row | Explicit width (dragged width, else 100%) and recapture |
//! | Host rejects insertion | Hovered element detached mid-drag | Placeholder disposed, error returned |
//! | Placeholder has no geometry | Container hidden after show | Offsets skipped; slot bookkeeping continues |

use std::collections::BTreeSet;
use std::time::Duration;

use dndkit_core::dom::{Dom, ElementId, InsertPosition, Length, StyleDecl, StyleKey};
use dndkit_core::geometry::{DEGENERATE_EPSILON, Point, Rect};
use dndkit_core::throttle::DistinctGate;

use crate::container::{ContainerId, FlowAxis, ItemId};
use crate::error::DndError;
use crate::hover::{Hover, Slots};
use crate::registry::DragRegistry;
use crate::shift::{Shift, ShiftContext, decide_shifts};

/// Visual state produced by one update.
#[derive(Debug, Clone, PartialEq)]
struct Frame {
    target: usize,
    placeholder_offset: Point,
    siblings: Vec<(ItemId, Point)>,
}

#[derive(Debug)]
struct ActivePlaceholder {
    container: ContainerId,
    element: ElementId,
    item: ItemId,
    initial_index: usize,
    gate: DistinctGate<Frame>,
    shifted: BTreeSet<ItemId>,
}

/// Owns the placeholder element and the sibling shift transforms.
#[derive(Debug)]
pub struct PlaceholderController {
    transition: Duration,
    active: Option<ActivePlaceholder>,
}

impl Default for PlaceholderController {
    fn default() -> Self {
        Self::new(Duration::from_millis(150))
    }
}

impl PlaceholderController {
    /// Create a controller easing transforms over `transition`.
    #[must_use]
    pub fn new(transition: Duration) -> Self {
        Self {
            transition,
            active: None,
        }
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.active.is_some()
    }

    /// Container currently hosting the placeholder.
    #[must_use]
    pub fn container(&self) -> Option<ContainerId> {
        self.active.as_ref().map(|a| a.container)
    }

    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.active.as_ref().map(|a| a.element)
    }

    /// Registry id of the placeholder's synthetic item.
    #[must_use]
    pub fn item(&self) -> Option<ItemId> {
        self.active.as_ref().map(|a| a.item)
    }

    /// Slot index the placeholder was inserted at.
    #[must_use]
    pub fn initial_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.initial_index)
    }

    /// Insert a placeholder for `dragged` into `container`, replacing any
    /// existing one.
    ///
    /// With a hovered item the placeholder goes right after it (`is_after`)
    /// or right before it. Without one it goes right after the dragged item
    /// when `container` is the drag's own list, otherwise at the end of
    /// `container`. Returns the placeholder's slot index.
    pub fn show(
        &mut self,
        dom: &mut dyn Dom,
        registry: &mut DragRegistry,
        container: ContainerId,
        dragged: ItemId,
        hovered: Option<ItemId>,
        is_after: bool,
    ) -> Result<usize, DndError> {
        self.hide(dom, registry);

        let dragged_item = registry.item(dragged).ok_or(DndError::UnknownItem(dragged))?;
        let dragged_rect = dragged_item
            .rect()
            .or_else(|| dragged_item.live_rect(dom))
            .unwrap_or_default();
        let dragged_el = dragged_item.element();
        let is_self_list = dragged_item.container() == Some(container);
        let hovered_el = hovered
            .and_then(|id| registry.item(id))
            .map(|item| item.element());

        let host = registry
            .container_mut(container)
            .ok_or(DndError::UnknownContainer(container))?;
        let host_el = host.element();
        let el = host.add_placeholder(dom, dragged_rect);

        let inserted = match hovered_el {
            Some(reference) => {
                let position = if is_after {
                    InsertPosition::AfterEnd
                } else {
                    InsertPosition::BeforeBegin
                };
                dom.insert(reference, position, el)
            }
            None if is_self_list => dom.insert(dragged_el, InsertPosition::AfterEnd, el),
            None => dom.append_child(host_el, el),
        };
        if !inserted {
            dom.detach(el);
            host.dispose_placeholder();
            return Err(DndError::InsertRejected(el));
        }

        let item = registry.register_placeholder(el, container)?;
        capture_placeholder(dom, registry, item, el, dragged_rect);
        dom.set_style(el, StyleDecl::Transition(self.transition));
        registry.refresh_container_geometry(dom, container);

        let initial_index = Slots::collect(dom, registry, container, dragged).placeholder_index;
        tracing::debug!(
            container = %container,
            placeholder = %el,
            index = initial_index,
            "placeholder shown"
        );
        self.active = Some(ActivePlaceholder {
            container,
            element: el,
            item,
            initial_index,
            gate: DistinctGate::new(),
            shifted: BTreeSet::new(),
        });
        Ok(initial_index)
    }

    /// Move the placeholder toward the hovered slot and shift the siblings in
    /// between. Returns the slot the placeholder now represents, or `None`
    /// if no placeholder is shown.
    pub fn update(
        &mut self,
        dom: &mut dyn Dom,
        registry: &mut DragRegistry,
        dragged: ItemId,
        hover: &Hover,
    ) -> Option<usize> {
        let active = self.active.as_mut()?;
        let slots = Slots::collect(dom, registry, active.container, dragged);
        let context = ShiftContext {
            index: 0,
            placeholder_index: slots.placeholder_index,
            over_item_index: hover.index,
            is_after: hover.is_after,
            is_self_list: slots.is_self_list,
        };
        let target = context.target_index();

        let flow = registry.container(active.container)?.flow();
        let Some(placeholder_rect) = registry.item(active.item).and_then(|p| p.content_rect()) else {
            return Some(target);
        };
        let frame = compute_frame(registry, &slots, &context, flow, placeholder_rect);
        if !active.gate.update(frame.clone()) {
            return Some(target);
        }

        set_transform(dom, active.element, frame.placeholder_offset);
        for (id, offset) in &frame.siblings {
            let Some(item) = registry.item_mut(*id) else {
                continue;
            };
            let el = item.element();
            item.set_offset(*offset);
            if offset.is_zero() {
                if active.shifted.remove(id) {
                    dom.clear_style(el, StyleKey::Transform);
                }
            } else {
                if active.shifted.insert(*id) {
                    dom.set_style(el, StyleDecl::Transition(self.transition));
                }
                dom.set_style(el, StyleDecl::Transform(*offset));
            }
        }
        if let Some(placeholder) = registry.item_mut(active.item) {
            placeholder.set_offset(frame.placeholder_offset);
        }
        tracing::trace!(target_index = target, shifted = active.shifted.len(), "placeholder updated");
        Some(target)
    }

    /// Remove the placeholder, clear every shift transform, and notify the
    /// host container. Returns false if nothing was shown.
    pub fn hide(&mut self, dom: &mut dyn Dom, registry: &mut DragRegistry) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        dom.detach(active.element);
        if let Err(err) = registry.remove_item(active.item) {
            tracing::warn!(error = %err, "placeholder was already deregistered");
        }
        for item in registry.items_mut() {
            if active.shifted.contains(&item.id()) || !item.offset().is_zero() {
                dom.clear_style(item.element(), StyleKey::Transform);
                dom.clear_style(item.element(), StyleKey::Transition);
                item.set_offset(Point::ZERO);
            }
        }
        if let Some(host) = registry.container_mut(active.container) {
            host.dispose_placeholder();
        }
        registry.refresh_container_geometry(dom, active.container);
        tracing::debug!(container = %active.container, "placeholder hidden");
        true
    }
}

/// Capture the placeholder rect, forcing an explicit width when it collapsed.
fn capture_placeholder(
    dom: &mut dyn Dom,
    registry: &mut DragRegistry,
    item: ItemId,
    el: ElementId,
    dragged_rect: Rect,
) {
    let captured = match registry.item_mut(item) {
        Some(placeholder) => placeholder.refresh_rect(&*dom),
        None => false,
    };
    if captured {
        return;
    }
    let width = if dragged_rect.width >= DEGENERATE_EPSILON {
        Length::Px(dragged_rect.width)
    } else {
        Length::Percent(100.0)
    };
    tracing::debug!(placeholder = %el, ?width, "degenerate placeholder; forcing width");
    dom.set_style(el, StyleDecl::Width(width));
    if let Some(placeholder) = registry.item_mut(item) {
        placeholder.refresh_rect(dom);
    }
}

fn set_transform(dom: &mut dyn Dom, el: ElementId, offset: Point) {
    if offset.is_zero() {
        dom.clear_style(el, StyleKey::Transform);
    } else {
        dom.set_style(el, StyleDecl::Transform(offset));
    }
}

/// Distance one slot covers: the placeholder extent plus the spacing to its
/// nearest neighbour.
fn slot_pitch(registry: &DragRegistry, slots: &Slots, flow: FlowAxis, placeholder_rect: &Rect) -> f64 {
    let rect_at = |index: usize| -> Option<Rect> {
        slots
            .items
            .get(index)
            .and_then(|id| registry.item(*id))
            .and_then(|item| item.content_rect())
    };
    let next_index = if slots.is_self_list {
        slots.placeholder_index + 1
    } else {
        slots.placeholder_index
    };
    let gap = rect_at(next_index)
        .map(|next| flow.start(&next) - flow.end(placeholder_rect))
        .or_else(|| {
            slots
                .placeholder_index
                .checked_sub(1)
                .and_then(rect_at)
                .map(|prev| flow.start(placeholder_rect) - flow.end(&prev))
        })
        .unwrap_or(0.0)
        .max(0.0);
    placeholder_rect.extent(flow.axis) + gap
}

fn compute_frame(
    registry: &DragRegistry,
    slots: &Slots,
    context: &ShiftContext,
    flow: FlowAxis,
    placeholder_rect: Rect,
) -> Frame {
    let target = context.target_index();
    let pitch = slot_pitch(registry, slots, flow, &placeholder_rect);
    let shifts = decide_shifts(context, slots.len());

    let mut siblings = Vec::with_capacity(slots.len());
    let mut first_shifted: Option<Rect> = None;
    let mut last_shifted: Option<Rect> = None;
    for (id, shift) in slots.items.iter().zip(shifts) {
        if Some(*id) == slots.placeholder {
            continue;
        }
        let offset = match shift {
            Shift::None => Point::ZERO,
            Shift::Ahead => flow.offset(pitch),
            Shift::Behind => flow.offset(-pitch),
        };
        if shift != Shift::None
            && let Some(rect) = registry.item(*id).and_then(|item| item.content_rect())
        {
            first_shifted.get_or_insert(rect);
            last_shifted = Some(rect);
        }
        siblings.push((*id, offset));
    }

    let delta = if target > context.placeholder_index {
        last_shifted.map_or(0.0, |r| flow.end(&r) - flow.end(&placeholder_rect))
    } else if target < context.placeholder_index {
        first_shifted.map_or(0.0, |r| flow.start(&r) - flow.start(&placeholder_rect))
    } else {
        0.0
    };
    Frame {
        target,
        placeholder_offset: flow.offset(delta),
        siblings,
    }
}
