#![forbid(unsafe_code)]

//! Input routing for the drag service.
//!
//! [`DragController`] turns raw host events into [`DragService`] calls:
//!
//! - pointer-down on a registered item (or any descendant of one) starts a
//!   drag and pins the gesture to that pointer id;
//! - pointer moves and scroll notifications pass through a frame
//!   [`Throttle`], so at most one of each is processed per interval and the
//!   latest coalesced event is delivered on [`tick`](DragController::tick);
//! - pointer-up flushes any pending move before stopping, so the drop
//!   index reflects the final pointer position;
//! - `tick` also drives edge auto-scroll while a drag is active.
//!
//! Time is passed in by the caller.

use dndkit_core::dom::{Dom, ElementId};
use dndkit_core::geometry::Point;
use dndkit_core::pointer::{PointerEvent, resolve_viewport_pointer_position};
use dndkit_core::throttle::Throttle;
use web_time::Instant;

use crate::autoscroll::auto_scroll_step;
use crate::config::DragConfig;
use crate::container::{ContainerId, ItemId};
use crate::service::{DragEffect, DragNoopReason, DragService};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Gesture {
    item: ItemId,
    pointer_id: u32,
    origin: Point,
}

/// Throttled event router around a [`DragService`].
#[derive(Debug)]
pub struct DragController {
    service: DragService,
    gesture: Option<Gesture>,
    moves: Throttle<PointerEvent>,
    scrolls: Throttle<ElementId>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

impl DragController {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self::with_service(DragService::new(config))
    }

    #[must_use]
    pub fn with_service(service: DragService) -> Self {
        let interval = service.config().throttle;
        Self {
            service,
            gesture: None,
            moves: Throttle::new(interval),
            scrolls: Throttle::new(interval),
        }
    }

    #[must_use]
    pub fn service(&self) -> &DragService {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut DragService {
        &mut self.service
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Pointer that owns the active gesture.
    #[must_use]
    pub fn pointer_id(&self) -> Option<u32> {
        self.gesture.map(|g| g.pointer_id)
    }

    /// Earliest instant at which [`tick`](Self::tick) has a trailing event to
    /// deliver.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.moves.next_deadline(), self.scrolls.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // -- pointer ------------------------------------------------------------

    /// Start a drag from the item owning `target`.
    pub fn pointer_down(&mut self, dom: &mut dyn Dom, target: ElementId, event: &PointerEvent) -> DragEffect {
        if self.gesture.is_some() {
            return DragEffect::Noop {
                reason: DragNoopReason::AlreadyDragging,
            };
        }
        let Some(item) = self.owning_item(&*dom, target) else {
            return DragEffect::Noop {
                reason: DragNoopReason::ItemNotRegistered,
            };
        };
        let effect = self.service.start(dom, item);
        if matches!(effect, DragEffect::Started { .. }) {
            self.gesture = Some(Gesture {
                item,
                pointer_id: event.effective_pointer_id(),
                origin: resolve_viewport_pointer_position(event),
            });
        }
        effect
    }

    fn owning_item(&self, dom: &dyn Dom, target: ElementId) -> Option<ItemId> {
        let registry = self.service.registry();
        let mut cursor = Some(target);
        while let Some(el) = cursor {
            if let Some(item) = registry.item_for_element(el) {
                return Some(item);
            }
            if registry.container_for_element(el).is_some() {
                return None;
            }
            cursor = dom.parent(el);
        }
        None
    }

    /// Feed a pointer move. Moves inside the throttle window are coalesced
    /// and report [`DragNoopReason::Throttled`].
    pub fn pointer_move(&mut self, dom: &mut dyn Dom, event: &PointerEvent, now: Instant) -> DragEffect {
        if let Err(reason) = self.check_pointer(event) {
            return DragEffect::Noop { reason };
        }
        match self.moves.push(event.clone(), now) {
            Some(event) => self.deliver_move(dom, &event),
            None => DragEffect::Noop {
                reason: DragNoopReason::Throttled,
            },
        }
    }

    /// Finish the gesture. A coalesced move is delivered first.
    pub fn pointer_up(&mut self, dom: &mut dyn Dom, event: &PointerEvent) -> Vec<DragEffect> {
        if let Err(reason) = self.check_pointer(event) {
            return vec![DragEffect::Noop { reason }];
        }
        let mut effects = Vec::with_capacity(2);
        if let Some(pending) = self.moves.flush() {
            effects.push(self.deliver_move(dom, &pending));
        }
        let Some(gesture) = self.end_gesture() else {
            return effects;
        };
        effects.push(self.service.stop(dom, gesture.item));
        effects
    }

    /// Abandon the gesture, reporting the drop at the original slot.
    pub fn cancel(&mut self, dom: &mut dyn Dom) -> DragEffect {
        self.end_gesture();
        self.service.cancel(dom)
    }

    fn end_gesture(&mut self) -> Option<Gesture> {
        let coalesced = self.moves.coalesced_count();
        self.moves.clear();
        self.scrolls.clear();
        let gesture = self.gesture.take();
        if gesture.is_some() {
            tracing::trace!(coalesced_moves = coalesced, "gesture ended");
        }
        gesture
    }

    fn check_pointer(&self, event: &PointerEvent) -> Result<Gesture, DragNoopReason> {
        let gesture = self.gesture.ok_or(DragNoopReason::NotDragging)?;
        if event.effective_pointer_id() != gesture.pointer_id {
            return Err(DragNoopReason::PointerMismatch);
        }
        Ok(gesture)
    }

    fn deliver_move(&mut self, dom: &mut dyn Dom, event: &PointerEvent) -> DragEffect {
        let Some(gesture) = self.gesture else {
            return DragEffect::Noop {
                reason: DragNoopReason::NotDragging,
            };
        };
        let transform = resolve_viewport_pointer_position(event) - gesture.origin;
        self.service.move_to(dom, gesture.item, event, transform)
    }

    // -- scroll -------------------------------------------------------------

    /// A scrollable ancestor scrolled. Geometry is refreshed at most once per
    /// throttle interval, then hovering is re-evaluated at the last pointer
    /// position.
    pub fn scroll(&mut self, dom: &mut dyn Dom, element: ElementId, now: Instant) -> Vec<DragEffect> {
        if self.gesture.is_none() {
            return vec![DragEffect::Noop {
                reason: DragNoopReason::NotDragging,
            }];
        }
        match self.scrolls.push(element, now) {
            Some(element) => self.refresh_after_scroll(dom, element),
            None => vec![DragEffect::Noop {
                reason: DragNoopReason::Throttled,
            }],
        }
    }

    fn refresh_after_scroll(&mut self, dom: &mut dyn Dom, element: ElementId) -> Vec<DragEffect> {
        let refreshed = self.service.on_scroll(dom, element);
        if refreshed.is_noop() {
            return vec![refreshed];
        }
        let rehovered = self.service.rehover(dom);
        vec![refreshed, rehovered]
    }

    // -- frame --------------------------------------------------------------

    /// Deliver trailing throttled events and advance auto-scroll by one step.
    pub fn tick(&mut self, dom: &mut dyn Dom, now: Instant) -> Vec<DragEffect> {
        let mut effects = Vec::new();
        if self.gesture.is_none() {
            return effects;
        }
        if let Some(event) = self.moves.poll(now) {
            effects.push(self.deliver_move(dom, &event));
        }
        if let Some(element) = self.scrolls.poll(now) {
            effects.extend(self.refresh_after_scroll(dom, element));
        }

        let step = self.service.session().and_then(|session| {
            let point = session.last_pointer()?;
            auto_scroll_step(&*dom, session.scroll_targets(), point, self.service.config())
        });
        if let Some(step) = step {
            dom.scroll_by(step.element, step.delta);
            tracing::trace!(element = %step.element, dx = step.delta.x, dy = step.delta.y, "auto-scroll");
            effects.extend(self.refresh_after_scroll(dom, step.element));
        }
        effects
    }

    // -- hover bookkeeping --------------------------------------------------

    /// The pointer entered `container`; it wins hit-test ties from now on.
    pub fn pointer_enter(&mut self, container: ContainerId) {
        self.service.registry_mut().set_entered(Some(container));
    }

    /// The pointer left `container`.
    pub fn pointer_leave(&mut self, container: ContainerId) {
        let registry = self.service.registry_mut();
        if registry.entered() == Some(container) {
            registry.set_entered(None);
        }
    }
}
