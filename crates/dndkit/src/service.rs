#![forbid(unsafe_code)]

//! Drag coordination service.
//!
//! [`DragService`] is the `Idle -> Dragging -> Idle` state machine. It owns
//! the [`DragRegistry`] and the [`PlaceholderController`] and drives them from
//! four calls: [`start`](DragService::start), [`move_to`](DragService::move_to),
//! [`stop`](DragService::stop), and [`on_scroll`](DragService::on_scroll).
//!
//! # Invariants
//!
//! 1. At most one [`DragSession`] exists. `start` during a session is a no-op
//!    and leaves the session untouched.
//! 2. Every session ends in exactly one [`DropEvent`], delivered to the
//!    destination container's handler, and teardown clears all session state
//!    even when no handler can be reached.
//! 3. The service never mutates application data; it only writes
//!    presentation styles and reports indices.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Item has no container | Pointer-down before the list mounted | `Noop`, no session |
//! | Pointer over no container | Dragging over empty page | `Noop`, placeholder stays put |
//! | Connection refused | Target list not connected to source | `Noop`, placeholder stays put |
//! | Destination vanished | Container removed mid-drag | No-op drop reported to the source container |

use dndkit_core::dom::{Dom, ElementId, Length, StyleDecl, StyleKey};
use dndkit_core::geometry::{Point, Rect};
use dndkit_core::pointer::{PointerEvent, resolve_viewport_pointer_position};
use dndkit_core::scroll::find_scrollable_ancestors;
use serde::{Deserialize, Serialize};

use crate::config::DragConfig;
use crate::container::{ContainerId, DropEvent, ItemId};
use crate::hover::{Slots, child_scroll, resolve_hover};
use crate::placeholder::PlaceholderController;
use crate::registry::DragRegistry;

/// Class set on the original element while it is being dragged.
pub const DRAGGING_CLASS: &str = "dnd-dragging";
/// Class set on the floating drag clone.
pub const CLONE_CLASS: &str = "dnd-clone";
#[cfg(feature = "debug-overlay")]
pub const DEBUG_OVERLAY_CLASS: &str = "dnd-debug-overlay";

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Why a call was safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    AlreadyDragging,
    ItemNotRegistered,
    ItemHasNoContainer,
    ItemNotRendered,
    NotDragging,
    ItemMismatch,
    NoContainerUnderPointer,
    ConnectionRefused,
    PointerMismatch,
    /// Coalesced into a later delivery by the frame throttle.
    Throttled,
    /// Scroll from an element the session does not watch.
    UnwatchedScroll,
}

/// Outcome of one service call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        item: ItemId,
        container: ContainerId,
        index: usize,
    },
    Moved {
        container: ContainerId,
        index: usize,
        /// The pointer crossed into `container` with this move.
        entered: bool,
    },
    Refreshed {
        refreshed: usize,
        skipped: usize,
        /// Window plus hovered-container scroll since the container was
        /// entered.
        scroll_delta: Point,
    },
    Dropped {
        event: DropEvent,
    },
    Canceled {
        event: DropEvent,
    },
    Noop {
        reason: DragNoopReason,
    },
}

impl DragEffect {
    const fn noop(reason: DragNoopReason) -> Self {
        Self::Noop { reason }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop { .. })
    }

    /// The drop event carried by `Dropped` or `Canceled`.
    #[must_use]
    pub fn drop_event(&self) -> Option<&DropEvent> {
        match self {
            Self::Dropped { event } | Self::Canceled { event } => Some(event),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DragSession
// ---------------------------------------------------------------------------

/// State of the active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    item: ItemId,
    element: ElementId,
    source: ContainerId,
    hovered: ContainerId,
    previous_index: usize,
    target_index: usize,
    drag_rect: Rect,
    clone: Option<ElementId>,
    initial_window_scroll: Point,
    initial_container_scroll: Point,
    scroll_targets: Vec<ElementId>,
    last_pointer: Option<Point>,
    #[cfg(feature = "debug-overlay")]
    debug_overlay: Option<ElementId>,
}

impl DragSession {
    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    #[must_use]
    pub fn source(&self) -> ContainerId {
        self.source
    }

    /// Last container the pointer validly hovered.
    #[must_use]
    pub fn hovered(&self) -> ContainerId {
        self.hovered
    }

    #[must_use]
    pub fn previous_index(&self) -> usize {
        self.previous_index
    }

    /// Slot the item would land in if dropped now.
    #[must_use]
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Viewport rectangle of the item when the drag started.
    #[must_use]
    pub fn drag_rect(&self) -> Rect {
        self.drag_rect
    }

    /// Floating avatar element.
    #[must_use]
    pub fn clone_element(&self) -> Option<ElementId> {
        self.clone
    }

    /// Scrollable ancestors whose scroll refreshes geometry.
    #[must_use]
    pub fn scroll_targets(&self) -> &[ElementId] {
        &self.scroll_targets
    }

    /// Last viewport pointer position processed by the session.
    #[must_use]
    pub fn last_pointer(&self) -> Option<Point> {
        self.last_pointer
    }

    /// Window plus hovered-container scroll accumulated since the session
    /// started (or since the hovered container was entered).
    #[must_use]
    pub fn scroll_delta(&self, dom: &dyn Dom, hovered_element: ElementId) -> Point {
        (dom.window_scroll() - self.initial_window_scroll)
            + (child_scroll(dom, hovered_element) - dom.window_scroll() - self.initial_container_scroll)
    }

    #[cfg(feature = "debug-overlay")]
    #[must_use]
    pub fn debug_overlay(&self) -> Option<ElementId> {
        self.debug_overlay
    }
}

// ---------------------------------------------------------------------------
// DragService
// ---------------------------------------------------------------------------

/// Drag coordination state machine.
#[derive(Debug)]
pub struct DragService {
    registry: DragRegistry,
    config: DragConfig,
    placeholder: PlaceholderController,
    session: Option<DragSession>,
}

impl Default for DragService {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

impl DragService {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self::with_registry(DragRegistry::new(), config)
    }

    /// Build a service around an already populated registry.
    #[must_use]
    pub fn with_registry(registry: DragRegistry, config: DragConfig) -> Self {
        Self {
            registry,
            placeholder: PlaceholderController::new(config.transition),
            config,
            session: None,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &DragRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DragRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    #[must_use]
    pub fn placeholder(&self) -> &PlaceholderController {
        &self.placeholder
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    // -- start --------------------------------------------------------------

    /// Begin dragging `item`.
    pub fn start(&mut self, dom: &mut dyn Dom, item: ItemId) -> DragEffect {
        if self.session.is_some() {
            tracing::debug!(item = %item, "drag refused: a session is already active");
            return DragEffect::noop(DragNoopReason::AlreadyDragging);
        }
        let Some(entry) = self.registry.item(item).filter(|entry| !entry.is_placeholder()) else {
            tracing::debug!(item = %item, "drag refused: item not registered");
            return DragEffect::noop(DragNoopReason::ItemNotRegistered);
        };
        let Some(source) = entry.container() else {
            tracing::debug!(item = %item, "drag refused: item has no container");
            return DragEffect::noop(DragNoopReason::ItemHasNoContainer);
        };
        let element = entry.element();
        let Some(drag_rect) = entry.live_rect(dom) else {
            tracing::debug!(item = %item, "drag refused: item is not rendered");
            return DragEffect::noop(DragNoopReason::ItemNotRendered);
        };
        let Some(container) = self.registry.container_mut(source) else {
            return DragEffect::noop(DragNoopReason::ItemHasNoContainer);
        };
        container.set_dragging(true);
        let sort_disabled = container.is_sort_disabled();
        let container_el = container.element();

        if let Some(entry) = self.registry.item_mut(item) {
            entry.refresh_rect(&*dom);
        }
        let previous_index = self.registry.ordinal_index(&*dom, item, false).unwrap_or(0);

        let clone = self.spawn_clone(dom, element, drag_rect);
        if sort_disabled {
            dom.set_style(element, StyleDecl::Hidden);
        } else {
            dom.set_style(element, StyleDecl::Collapsed);
        }
        dom.set_class(element, DRAGGING_CLASS, true);

        if !sort_disabled
            && let Err(err) = self
                .placeholder
                .show(dom, &mut self.registry, source, item, None, true)
        {
            tracing::warn!(error = %err, "could not show placeholder");
        }

        let scroll_targets = find_scrollable_ancestors(&*dom, &self.registry.container_elements());
        let initial_window_scroll = dom.window_scroll();
        let initial_container_scroll = child_scroll(&*dom, container_el) - initial_window_scroll;
        #[cfg(feature = "debug-overlay")]
        let debug_overlay = self.spawn_debug_overlay(dom);

        self.session = Some(DragSession {
            item,
            element,
            source,
            hovered: source,
            previous_index,
            target_index: previous_index,
            drag_rect,
            clone,
            initial_window_scroll,
            initial_container_scroll,
            scroll_targets,
            last_pointer: None,
            #[cfg(feature = "debug-overlay")]
            debug_overlay,
        });
        tracing::debug!(item = %item, container = %source, index = previous_index, "drag started");
        DragEffect::Started {
            item,
            container: source,
            index: previous_index,
        }
    }

    fn spawn_clone(&self, dom: &mut dyn Dom, element: ElementId, rect: Rect) -> Option<ElementId> {
        let clone = dom.clone_element(element)?;
        dom.clear_style(clone, StyleKey::Transform);
        dom.clear_style(clone, StyleKey::Transition);
        dom.set_style(clone, StyleDecl::Fixed(rect.origin()));
        dom.set_style(clone, StyleDecl::Width(Length::Px(rect.width)));
        dom.set_style(clone, StyleDecl::Height(Length::Px(rect.height)));
        dom.set_style(clone, StyleDecl::PointerEventsNone);
        dom.set_style(clone, StyleDecl::ZIndex(self.config.clone_z_index));
        dom.set_class(clone, CLONE_CLASS, true);
        let root = dom.root();
        dom.append_child(root, clone).then_some(clone)
    }

    #[cfg(feature = "debug-overlay")]
    fn spawn_debug_overlay(&self, dom: &mut dyn Dom) -> Option<ElementId> {
        let el = dom.create_element();
        dom.set_style(el, StyleDecl::Fixed(Point::ZERO));
        dom.set_style(el, StyleDecl::PointerEventsNone);
        dom.set_style(el, StyleDecl::ZIndex(self.config.clone_z_index.saturating_sub(1)));
        dom.set_class(el, DEBUG_OVERLAY_CLASS, true);
        let root = dom.root();
        dom.append_child(root, el).then_some(el)
    }

    // -- move ---------------------------------------------------------------

    /// Follow the pointer. `current_transform` is applied to the floating
    /// clone; the pointer's viewport position drives hit testing.
    pub fn move_to(
        &mut self,
        dom: &mut dyn Dom,
        item: ItemId,
        event: &PointerEvent,
        current_transform: Point,
    ) -> DragEffect {
        let Some(session) = self.session.as_mut() else {
            return DragEffect::noop(DragNoopReason::NotDragging);
        };
        if session.item != item {
            return DragEffect::noop(DragNoopReason::ItemMismatch);
        }
        if self.registry.item(item).and_then(|entry| entry.container()).is_none() {
            return DragEffect::noop(DragNoopReason::ItemHasNoContainer);
        }
        if let Some(clone) = session.clone {
            dom.set_style(clone, StyleDecl::Transform(current_transform));
        }
        let point = resolve_viewport_pointer_position(event);
        session.last_pointer = Some(point);
        self.reposition(dom, point)
    }

    /// Re-run hit testing at the last pointer position, e.g. after the page
    /// scrolled under a stationary pointer.
    pub fn rehover(&mut self, dom: &mut dyn Dom) -> DragEffect {
        match self.session.as_ref().and_then(|s| s.last_pointer) {
            Some(point) => self.reposition(dom, point),
            None if self.session.is_some() => DragEffect::noop(DragNoopReason::NoContainerUnderPointer),
            None => DragEffect::noop(DragNoopReason::NotDragging),
        }
    }

    fn reposition(&mut self, dom: &mut dyn Dom, point: Point) -> DragEffect {
        let Self {
            registry,
            placeholder,
            session,
            ..
        } = self;
        let Some(session) = session.as_mut() else {
            return DragEffect::noop(DragNoopReason::NotDragging);
        };
        let Some(over) = registry.container_at(&*dom, point) else {
            return DragEffect::noop(DragNoopReason::NoContainerUnderPointer);
        };
        let (Some(dest), Some(source)) = (registry.container(over), registry.container(session.source)) else {
            return DragEffect::noop(DragNoopReason::NoContainerUnderPointer);
        };
        if !dest.check_allowed_connections(source) {
            return DragEffect::noop(DragNoopReason::ConnectionRefused);
        }
        let sort_disabled = dest.is_sort_disabled();
        let dest_el = dest.element();

        let entered = over != session.hovered;
        if entered {
            tracing::debug!(from = %session.hovered, to = %over, "drag entered container");
            session.hovered = over;
            session.initial_container_scroll = child_scroll(&*dom, dest_el) - dom.window_scroll();
        }

        let item = session.item;
        let index = if sort_disabled {
            placeholder.hide(dom, registry);
            if over == session.source {
                session.previous_index
            } else {
                Slots::collect(&*dom, registry, over, item).len()
            }
        } else {
            if placeholder.container() != Some(over) {
                let hover = resolve_hover(&*dom, registry, over, item, point);
                if let Err(err) = placeholder.show(dom, registry, over, item, hover.item, hover.is_after) {
                    tracing::warn!(error = %err, container = %over, "could not show placeholder");
                    return DragEffect::noop(DragNoopReason::NoContainerUnderPointer);
                }
            }
            let hover = resolve_hover(&*dom, registry, over, item, point);
            placeholder
                .update(dom, registry, item, &hover)
                .unwrap_or(hover.index)
        };
        session.target_index = index;

        #[cfg(feature = "debug-overlay")]
        if let Some(overlay) = session.debug_overlay
            && let Some(rect) = dom.rect(dest_el)
        {
            dom.set_style(overlay, StyleDecl::Fixed(rect.origin()));
            dom.set_style(overlay, StyleDecl::Width(Length::Px(rect.width)));
            dom.set_style(overlay, StyleDecl::Height(Length::Px(rect.height)));
        }

        DragEffect::Moved {
            container: over,
            index,
            entered,
        }
    }

    // -- scroll -------------------------------------------------------------

    /// A watched ancestor scrolled: refresh all geometry.
    pub fn on_scroll(&mut self, dom: &mut dyn Dom, element: ElementId) -> DragEffect {
        let Some(session) = self.session.as_ref() else {
            return DragEffect::noop(DragNoopReason::NotDragging);
        };
        if !session.scroll_targets.contains(&element) {
            return DragEffect::noop(DragNoopReason::UnwatchedScroll);
        }
        let stats = self.registry.refresh_all_geometry(&*dom);
        let scroll_delta = self
            .registry
            .container(session.hovered)
            .map_or(Point::ZERO, |hovered| session.scroll_delta(&*dom, hovered.element()));
        tracing::trace!(
            element = %element,
            dx = scroll_delta.x,
            dy = scroll_delta.y,
            "geometry refreshed after scroll"
        );
        DragEffect::Refreshed {
            refreshed: stats.refreshed,
            skipped: stats.skipped,
            scroll_delta,
        }
    }

    // -- stop ---------------------------------------------------------------

    /// Finish the drag of `item` and deliver its drop event.
    pub fn stop(&mut self, dom: &mut dyn Dom, item: ItemId) -> DragEffect {
        if self.session.as_ref().is_some_and(|session| session.item != item) {
            return DragEffect::noop(DragNoopReason::ItemMismatch);
        }
        match self.session.take() {
            Some(session) => DragEffect::Dropped {
                event: self.finish(dom, session, false),
            },
            None => DragEffect::noop(DragNoopReason::NotDragging),
        }
    }

    /// Abandon the active drag. The drop is reported at the original slot.
    pub fn cancel(&mut self, dom: &mut dyn Dom) -> DragEffect {
        match self.session.take() {
            Some(session) => DragEffect::Canceled {
                event: self.finish(dom, session, true),
            },
            None => DragEffect::noop(DragNoopReason::NotDragging),
        }
    }

    fn finish(&mut self, dom: &mut dyn Dom, session: DragSession, canceled: bool) -> DropEvent {
        for container in self.registry.containers_mut() {
            container.set_dragging(false);
        }
        self.placeholder.hide(dom, &mut self.registry);
        if let Some(clone) = session.clone {
            dom.detach(clone);
        }
        #[cfg(feature = "debug-overlay")]
        if let Some(overlay) = session.debug_overlay {
            dom.detach(overlay);
        }
        for key in [
            StyleKey::Display,
            StyleKey::Visibility,
            StyleKey::Transform,
            StyleKey::Transition,
        ] {
            dom.clear_style(session.element, key);
        }
        dom.set_class(session.element, DRAGGING_CLASS, false);

        let hovered_alive = self.registry.container(session.hovered).is_some();
        let (container, current_index) = if canceled || !hovered_alive {
            (session.source, session.previous_index)
        } else {
            (session.hovered, session.target_index)
        };
        let event = DropEvent {
            previous_index: session.previous_index,
            current_index,
            item: session.item,
            container,
            previous_container: session.source,
        };
        self.registry.refresh_all_geometry(&*dom);
        match self.registry.container_mut(container) {
            Some(target) => target.on_drop(&event),
            None => tracing::warn!(container = %container, "drop target no longer registered"),
        }
        tracing::debug!(
            item = %event.item,
            from = %event.previous_container,
            to = %event.container,
            previous_index = event.previous_index,
            current_index = event.current_index,
            canceled,
            "drop"
        );
        event
    }
}
