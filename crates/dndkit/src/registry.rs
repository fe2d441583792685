#![forbid(unsafe_code)]

//! Drag-item registry.
//!
//! Bookkeeping for every registered container and item, keyed by stable ids
//! with non-owning element lookups. Cleanup is explicit: hosts call
//! [`DragRegistry::remove_item`] / [`DragRegistry::remove_container`] when an
//! element unmounts.
//!
//! Ordinal positions are never cached. [`DragRegistry::ordinal_index`] walks
//! the live document every time, so arbitrary intervening DOM mutation is
//! always reflected.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Item outside any container | Registered before its list mounted | Item kept with no container; drags refused |
//! | Element without a layout box | Hidden or virtualized entry | Skipped by geometry refresh |

use std::collections::{BTreeMap, HashMap};

use dndkit_core::dom::{Dom, ElementId};
use dndkit_core::geometry::Point;

use crate::config::ContainerConfig;
use crate::container::{ContainerId, DraggableItem, DropContainer, DropHandler, ItemId};
use crate::error::DndError;

/// Counts reported by [`DragRegistry::refresh_all_geometry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub refreshed: usize,
    pub skipped: usize,
}

/// Process-wide container and item bookkeeping.
#[derive(Debug, Default)]
pub struct DragRegistry {
    containers: BTreeMap<ContainerId, DropContainer>,
    container_by_element: HashMap<ElementId, ContainerId>,
    items: BTreeMap<ItemId, DraggableItem>,
    item_by_element: HashMap<ElementId, ItemId>,
    next_container: u64,
    next_item: u64,
    entered: Option<ContainerId>,
}

impl DragRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- containers ---------------------------------------------------------

    /// Register `element` as a drop list.
    pub fn register_container(
        &mut self,
        element: ElementId,
        config: ContainerConfig,
        handler: impl DropHandler + 'static,
    ) -> Result<ContainerId, DndError> {
        if self.container_by_element.contains_key(&element) || self.item_by_element.contains_key(&element) {
            return Err(DndError::AlreadyRegistered(element));
        }
        self.next_container += 1;
        let id = ContainerId::new(self.next_container);
        self.containers
            .insert(id, DropContainer::new(id, element, config, Box::new(handler)));
        self.container_by_element.insert(element, id);
        tracing::debug!(container = %id, element = %element, "container registered");
        Ok(id)
    }

    /// Deregister a container. Its members stay registered without a
    /// container.
    pub fn remove_container(&mut self, id: ContainerId) -> Result<DropContainer, DndError> {
        let container = self
            .containers
            .remove(&id)
            .ok_or(DndError::UnknownContainer(id))?;
        self.container_by_element.remove(&container.element());
        for member in container.members() {
            if let Some(item) = self.items.get_mut(&member) {
                item.set_container(None);
            }
        }
        if self.entered == Some(id) {
            self.entered = None;
        }
        Ok(container)
    }

    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<&DropContainer> {
        self.containers.get(&id)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut DropContainer> {
        self.containers.get_mut(&id)
    }

    #[must_use]
    pub fn container_for_element(&self, element: ElementId) -> Option<ContainerId> {
        self.container_by_element.get(&element).copied()
    }

    pub fn containers(&self) -> impl Iterator<Item = &DropContainer> {
        self.containers.values()
    }

    pub(crate) fn containers_mut(&mut self) -> impl Iterator<Item = &mut DropContainer> {
        self.containers.values_mut()
    }

    #[must_use]
    pub fn container_elements(&self) -> Vec<ElementId> {
        self.containers.values().map(DropContainer::element).collect()
    }

    // -- items --------------------------------------------------------------

    /// Register a draggable element, assigning it to the nearest ancestor
    /// container.
    pub fn register_item(&mut self, dom: &dyn Dom, element: ElementId) -> Result<ItemId, DndError> {
        if self.item_by_element.contains_key(&element) || self.container_by_element.contains_key(&element) {
            return Err(DndError::AlreadyRegistered(element));
        }
        let container = self.nearest_container(dom, element);
        if container.is_none() {
            tracing::debug!(element = %element, "item registered outside any container");
        }
        Ok(self.insert_item(element, container, false))
    }

    /// Register the synthetic wrapper around a placeholder element.
    pub fn register_placeholder(
        &mut self,
        element: ElementId,
        container: ContainerId,
    ) -> Result<ItemId, DndError> {
        if !self.containers.contains_key(&container) {
            return Err(DndError::UnknownContainer(container));
        }
        if self.item_by_element.contains_key(&element) {
            return Err(DndError::AlreadyRegistered(element));
        }
        Ok(self.insert_item(element, Some(container), true))
    }

    fn insert_item(&mut self, element: ElementId, container: Option<ContainerId>, placeholder: bool) -> ItemId {
        self.next_item += 1;
        let id = ItemId::new(self.next_item);
        if let Some(owner) = container.and_then(|c| self.containers.get_mut(&c)) {
            owner.add_member(id);
        }
        self.items
            .insert(id, DraggableItem::new(id, element, container, placeholder));
        self.item_by_element.insert(element, id);
        id
    }

    /// Deregister an item and drop it from its container's member set.
    pub fn remove_item(&mut self, id: ItemId) -> Result<DraggableItem, DndError> {
        let item = self.items.remove(&id).ok_or(DndError::UnknownItem(id))?;
        self.item_by_element.remove(&item.element());
        if let Some(owner) = item.container().and_then(|c| self.containers.get_mut(&c)) {
            owner.remove_member(id);
        }
        Ok(item)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&DraggableItem> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut DraggableItem> {
        self.items.get_mut(&id)
    }

    #[must_use]
    pub fn item_for_element(&self, element: ElementId) -> Option<ItemId> {
        self.item_by_element.get(&element).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &DraggableItem> {
        self.items.values()
    }

    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut DraggableItem> {
        self.items.values_mut()
    }

    fn nearest_container(&self, dom: &dyn Dom, element: ElementId) -> Option<ContainerId> {
        let mut cursor = dom.parent(element);
        while let Some(current) = cursor {
            if let Some(id) = self.container_by_element.get(&current) {
                return Some(*id);
            }
            cursor = dom.parent(current);
        }
        None
    }

    // -- ordering -----------------------------------------------------------

    /// Members of `container` in live document order.
    ///
    /// The container subtree is walked in pre-order; descent stops at nested
    /// container elements, whose items belong to the nested list.
    #[must_use]
    pub fn ordered_members(
        &self,
        dom: &dyn Dom,
        container: ContainerId,
        include_placeholder: bool,
    ) -> Vec<ItemId> {
        let Some(owner) = self.containers.get(&container) else {
            return Vec::new();
        };
        let mut ordered = Vec::with_capacity(owner.member_count());
        let mut stack: Vec<ElementId> = dom.children(owner.element()).into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            if let Some(item) = self.item_by_element.get(&el).and_then(|id| self.items.get(id))
                && item.container() == Some(container)
                && (include_placeholder || !item.is_placeholder())
            {
                ordered.push(item.id());
            }
            if self.container_by_element.contains_key(&el) {
                continue;
            }
            stack.extend(dom.children(el).into_iter().rev());
        }
        ordered
    }

    /// Position of `item` among its container's members in live document
    /// order, or `None` if it has no container or is not in the document.
    #[must_use]
    pub fn ordinal_index(&self, dom: &dyn Dom, item: ItemId, include_placeholder: bool) -> Option<usize> {
        let container = self.items.get(&item)?.container()?;
        self.ordered_members(dom, container, include_placeholder)
            .iter()
            .position(|member| *member == item)
    }

    // -- geometry -----------------------------------------------------------

    /// Recapture rectangles of every container and item, skipping elements
    /// without a usable layout box.
    pub fn refresh_all_geometry(&mut self, dom: &dyn Dom) -> RefreshStats {
        let mut stats = RefreshStats::default();
        for container in self.containers.values_mut() {
            tally(&mut stats, container.refresh_rect(dom));
        }
        for item in self.items.values_mut() {
            tally(&mut stats, item.refresh_rect(dom));
        }
        if stats.skipped > 0 {
            tracing::trace!(skipped = stats.skipped, refreshed = stats.refreshed, "skipped unrendered geometry");
        }
        stats
    }

    /// Recapture one container and its members.
    pub fn refresh_container_geometry(&mut self, dom: &dyn Dom, id: ContainerId) -> RefreshStats {
        let mut stats = RefreshStats::default();
        let Some(container) = self.containers.get_mut(&id) else {
            return stats;
        };
        tally(&mut stats, container.refresh_rect(dom));
        let members: Vec<ItemId> = container.members().collect();
        for member in members {
            if let Some(item) = self.items.get_mut(&member) {
                tally(&mut stats, item.refresh_rect(dom));
            }
        }
        stats
    }

    // -- hit testing --------------------------------------------------------

    /// Container under a viewport point: the deepest one whose live rectangle
    /// contains it, preferring the entered container among equals.
    #[must_use]
    pub fn container_at(&self, dom: &dyn Dom, point: Point) -> Option<ContainerId> {
        let mut best: Option<(usize, bool, ContainerId)> = None;
        for container in self.containers.values() {
            let Some(rect) = container.live_rect(dom) else {
                continue;
            };
            if !rect.contains(point) {
                continue;
            }
            let rank = (dom.depth(container.element()), self.entered == Some(container.id()));
            if best.is_none_or(|(depth, entered, _)| rank > (depth, entered)) {
                best = Some((rank.0, rank.1, container.id()));
            }
        }
        best.map(|(_, _, id)| id)
    }

    /// Container the pointer last entered, from mouse-enter bookkeeping.
    #[must_use]
    pub fn entered(&self) -> Option<ContainerId> {
        self.entered
    }

    pub fn set_entered(&mut self, container: Option<ContainerId>) {
        self.entered = container;
    }
}

fn tally(stats: &mut RefreshStats, refreshed: bool) {
    if refreshed {
        stats.refreshed += 1;
    } else {
        stats.skipped += 1;
    }
}
