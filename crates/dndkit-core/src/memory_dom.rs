#![forbid(unsafe_code)]

//! In-memory host document with a small flow-layout engine.
//!
//! [`MemoryDom`] implements [`Dom`] without a browser. Every element has an
//! explicit size; children are stacked along their parent's flow axis
//! (vertical, horizontal, or right-to-left horizontal) with an optional gap,
//! unless they are explicitly placed or fixed-positioned. Scroll offsets,
//! `display: none`, `visibility: hidden`, and translate transforms behave as
//! they do in a browser, which is enough to drive full drag sessions in tests
//! and in headless simulations.
//!
//! # Example
//!
//! ```
//! use dndkit_core::dom::Dom;
//! use dndkit_core::geometry::{Axis, Rect, Size};
//! use dndkit_core::memory_dom::MemoryDom;
//!
//! let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
//! let list = dom.append(dom.root(), Size::new(200.0, 400.0));
//! dom.set_flow(list, Axis::Vertical, false);
//! let a = dom.append(list, Size::new(200.0, 40.0));
//! let b = dom.append(list, Size::new(200.0, 40.0));
//! assert_eq!(dom.rect(a), Some(Rect::new(0.0, 0.0, 200.0, 40.0)));
//! assert_eq!(dom.rect(b), Some(Rect::new(0.0, 40.0, 200.0, 40.0)));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::dom::{Dom, ElementId, InsertPosition, Overflow, ScrollMetrics, StyleDecl, StyleKey};
use crate::geometry::{Axis, Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Flow {
    axis: Axis,
    rtl: bool,
    gap: f64,
}

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    size: Size,
    flow: Flow,
    placement: Option<Point>,
    styles: BTreeMap<StyleKey, StyleDecl>,
    classes: BTreeSet<String>,
    overflow: Overflow,
    content_size: Option<Size>,
    scroll_offset: Point,
}

impl Node {
    fn is_collapsed(&self) -> bool {
        self.styles.contains_key(&StyleKey::Display)
    }

    fn fixed_at(&self) -> Option<Point> {
        match self.styles.get(&StyleKey::Fixed) {
            Some(StyleDecl::Fixed(at)) => Some(*at),
            _ => None,
        }
    }

    fn transform(&self) -> Point {
        match self.styles.get(&StyleKey::Transform) {
            Some(StyleDecl::Transform(offset)) => *offset,
            _ => Point::ZERO,
        }
    }

    fn in_flow(&self) -> bool {
        !self.is_collapsed() && self.placement.is_none() && self.fixed_at().is_none()
    }
}

/// In-memory [`Dom`] implementation.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: BTreeMap<ElementId, Node>,
    next_id: u64,
    root: ElementId,
    viewport: Size,
    window_scroll: Point,
}

impl MemoryDom {
    /// Create a document whose root fills a viewport of the given size.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let root = ElementId::new(1);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                size: viewport,
                overflow: Overflow::Auto,
                ..Node::default()
            },
        );
        Self {
            nodes,
            next_id: 2,
            root,
            viewport,
            window_scroll: Point::ZERO,
        }
    }

    /// Viewport size.
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Append a new element of the given size as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not created by this document.
    pub fn append(&mut self, parent: ElementId, size: Size) -> ElementId {
        assert!(self.nodes.contains_key(&parent), "unknown parent {parent}");
        let el = self.alloc(Node {
            size,
            ..Node::default()
        });
        self.attach(parent, None, el);
        el
    }

    /// Lay out children of `el` along `axis`; `rtl` reverses horizontal flow.
    pub fn set_flow(&mut self, el: ElementId, axis: Axis, rtl: bool) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.flow.axis = axis;
            node.flow.rtl = rtl;
        }
    }

    /// Spacing between consecutive in-flow children of `el`.
    pub fn set_gap(&mut self, el: ElementId, gap: f64) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.flow.gap = gap;
        }
    }

    /// Take `el` out of flow and place it at `offset` from its parent's
    /// content origin.
    pub fn place(&mut self, el: ElementId, offset: Point) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.placement = Some(offset);
        }
    }

    /// Change the intrinsic size of `el`.
    pub fn set_size(&mut self, el: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.size = size;
        }
    }

    /// Set the computed overflow of `el` on both axes.
    pub fn set_overflow(&mut self, el: ElementId, overflow: Overflow) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.overflow = overflow;
        }
    }

    /// Override the scrollable content extent of `el`.
    pub fn set_content_size(&mut self, el: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.content_size = Some(size);
        }
    }

    /// Set the scroll offset of `el` without clamping.
    pub fn set_scroll_offset(&mut self, el: ElementId, offset: Point) {
        if el == self.root {
            self.window_scroll = offset;
        } else if let Some(node) = self.nodes.get_mut(&el) {
            node.scroll_offset = offset;
        }
    }

    /// Set the window scroll offset.
    pub fn set_window_scroll(&mut self, offset: Point) {
        self.window_scroll = offset;
    }

    /// Returns true if `el` carries the class.
    #[must_use]
    pub fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.nodes
            .get(&el)
            .is_some_and(|node| node.classes.contains(class))
    }

    /// Returns true if `el` is connected to the root.
    #[must_use]
    pub fn is_attached(&self, el: ElementId) -> bool {
        self.is_inclusive_ancestor(self.root, el)
    }

    /// Number of elements ever created and still known to the document.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, node: Node) -> ElementId {
        let el = ElementId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(el, node);
        el
    }

    fn attach(&mut self, parent: ElementId, index: Option<usize>, el: ElementId) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = index
                .unwrap_or(parent_node.children.len())
                .min(parent_node.children.len());
            parent_node.children.insert(index, el);
        }
        if let Some(node) = self.nodes.get_mut(&el) {
            node.parent = Some(parent);
        }
    }

    /// Size after applying width/height declarations.
    fn resolved_size(&self, el: ElementId) -> Size {
        let Some(node) = self.nodes.get(&el) else {
            return Size::ZERO;
        };
        let containing = node
            .parent
            .map(|parent| self.resolved_size(parent))
            .unwrap_or(self.viewport);
        let width = match node.styles.get(&StyleKey::Width) {
            Some(StyleDecl::Width(len)) => len.resolve(containing.width),
            _ => node.size.width,
        };
        let height = match node.styles.get(&StyleKey::Height) {
            Some(StyleDecl::Height(len)) => len.resolve(containing.height),
            _ => node.size.height,
        };
        Size::new(width, height)
    }

    /// Extent occupied by in-flow children of `el` along and across its flow.
    fn flow_extent(&self, el: ElementId) -> Size {
        let Some(node) = self.nodes.get(&el) else {
            return Size::ZERO;
        };
        let axis = node.flow.axis;
        let mut main = 0.0;
        let mut cross: f64 = 0.0;
        let mut count = 0usize;
        for child in &node.children {
            let Some(child_node) = self.nodes.get(child) else {
                continue;
            };
            if !child_node.in_flow() {
                continue;
            }
            let size = self.resolved_size(*child);
            main += size.along(axis);
            cross = cross.max(size.along(axis.cross()));
            count += 1;
        }
        main += node.flow.gap * count.saturating_sub(1) as f64;
        match axis {
            Axis::Horizontal => Size::new(main, cross),
            Axis::Vertical => Size::new(cross, main),
        }
    }

    /// Offset of `el` along its parent's flow axis.
    fn flow_offset(&self, parent: &Node, el: ElementId) -> f64 {
        let mut offset = 0.0;
        for sibling in &parent.children {
            if *sibling == el {
                break;
            }
            if self.nodes.get(sibling).is_some_and(Node::in_flow) {
                offset += self.resolved_size(*sibling).along(parent.flow.axis) + parent.flow.gap;
            }
        }
        offset
    }

    fn layout_rect(&self, el: ElementId) -> Option<Rect> {
        let node = self.nodes.get(&el)?;
        if node.is_collapsed() {
            return None;
        }
        let size = self.resolved_size(el);
        if el == self.root {
            return Some(Rect::from_origin_size(-self.window_scroll, size));
        }
        if let Some(at) = node.fixed_at() {
            return Some(Rect::from_origin_size(at, size).translate(node.transform()));
        }
        let parent = node.parent?;
        let parent_rect = self.layout_rect(parent)?;
        let parent_node = self.nodes.get(&parent)?;
        let scroll = if parent == self.root {
            Point::ZERO
        } else {
            parent_node.scroll_offset
        };
        let content = parent_rect.origin() - scroll;

        let origin = if let Some(offset) = node.placement {
            content + offset
        } else {
            let offset = self.flow_offset(parent_node, el);
            let flow = parent_node.flow;
            match (flow.axis, flow.rtl) {
                (Axis::Horizontal, true) => {
                    Point::new(content.x + parent_rect.width - offset - size.width, content.y)
                }
                (axis, _) => content + Point::on_axis(axis, offset),
            }
        };
        Some(Rect::from_origin_size(origin, size).translate(node.transform()))
    }

    fn snapshot(&self, el: ElementId) -> Option<Node> {
        self.nodes.get(&el).map(|node| Node {
            parent: None,
            children: Vec::new(),
            ..node.clone()
        })
    }
}

impl Dom for MemoryDom {
    fn root(&self) -> ElementId {
        self.root
    }

    fn scrolling_root(&self) -> ElementId {
        self.root
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.nodes.get(&el).and_then(|node| node.parent)
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(&el)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn rect(&self, el: ElementId) -> Option<Rect> {
        if !self.is_attached(el) {
            return None;
        }
        self.layout_rect(el)
    }

    fn scroll_metrics(&self, el: ElementId) -> Option<ScrollMetrics> {
        let rect = self.rect(el)?;
        let node = self.nodes.get(&el)?;
        let client = rect.size();
        let flow = self.flow_extent(el);
        let content = node.content_size.unwrap_or(Size::new(
            flow.width.max(client.width),
            flow.height.max(client.height),
        ));
        let offset = if el == self.root {
            self.window_scroll
        } else {
            node.scroll_offset
        };
        Some(ScrollMetrics {
            overflow_x: node.overflow,
            overflow_y: node.overflow,
            client,
            content,
            offset,
        })
    }

    fn window_scroll(&self) -> Point {
        self.window_scroll
    }

    fn create_element(&mut self) -> ElementId {
        self.alloc(Node::default())
    }

    fn clone_element(&mut self, el: ElementId) -> Option<ElementId> {
        let mut copy = self.snapshot(el)?;
        copy.size = self.resolved_size(el);
        copy.placement = None;
        Some(self.alloc(copy))
    }

    fn insert(&mut self, reference: ElementId, position: InsertPosition, el: ElementId) -> bool {
        if el == self.root
            || !self.nodes.contains_key(&el)
            || !self.nodes.contains_key(&reference)
            || self.is_inclusive_ancestor(el, reference)
        {
            return false;
        }
        self.detach(el);
        match position {
            InsertPosition::BeforeEnd => {
                self.attach(reference, None, el);
                true
            }
            InsertPosition::BeforeBegin | InsertPosition::AfterEnd => {
                let Some(parent) = self.parent(reference) else {
                    return false;
                };
                let Some(index) = self
                    .nodes
                    .get(&parent)
                    .and_then(|node| node.children.iter().position(|c| *c == reference))
                else {
                    return false;
                };
                let index = if position == InsertPosition::AfterEnd {
                    index + 1
                } else {
                    index
                };
                self.attach(parent, Some(index), el);
                true
            }
        }
    }

    fn detach(&mut self, el: ElementId) {
        let Some(parent) = self.nodes.get_mut(&el).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|c| *c != el);
        }
    }

    fn set_style(&mut self, el: ElementId, decl: StyleDecl) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.styles.insert(decl.key(), decl);
        }
    }

    fn clear_style(&mut self, el: ElementId, key: StyleKey) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.styles.remove(&key);
        }
    }

    fn style(&self, el: ElementId, key: StyleKey) -> Option<StyleDecl> {
        self.nodes
            .get(&el)
            .and_then(|node| node.styles.get(&key).copied())
    }

    fn set_class(&mut self, el: ElementId, class: &str, on: bool) {
        if let Some(node) = self.nodes.get_mut(&el) {
            if on {
                node.classes.insert(class.to_string());
            } else {
                node.classes.remove(class);
            }
        }
    }

    fn scroll_by(&mut self, el: ElementId, delta: Point) {
        let Some(metrics) = self.scroll_metrics(el) else {
            return;
        };
        let max = metrics.max_offset();
        let next = Point::new(
            (metrics.offset.x + delta.x).clamp(0.0, max.x),
            (metrics.offset.y + delta.y).clamp(0.0, max.y),
        );
        self.set_scroll_offset(el, next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Length;

    fn vertical_list(dom: &mut MemoryDom, items: usize) -> (ElementId, Vec<ElementId>) {
        let list = dom.append(dom.root(), Size::new(100.0, 300.0));
        dom.set_flow(list, Axis::Vertical, false);
        let items = (0..items)
            .map(|_| dom.append(list, Size::new(100.0, 30.0)))
            .collect();
        (list, items)
    }

    #[test]
    fn vertical_flow_stacks_children() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (_, items) = vertical_list(&mut dom, 3);
        assert_eq!(dom.rect(items[2]), Some(Rect::new(0.0, 60.0, 100.0, 30.0)));
    }

    #[test]
    fn rtl_flow_starts_at_right_edge() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let row = dom.append(dom.root(), Size::new(300.0, 40.0));
        dom.set_flow(row, Axis::Horizontal, true);
        let a = dom.append(row, Size::new(50.0, 40.0));
        let b = dom.append(row, Size::new(50.0, 40.0));
        assert_eq!(dom.rect(a), Some(Rect::new(250.0, 0.0, 50.0, 40.0)));
        assert_eq!(dom.rect(b), Some(Rect::new(200.0, 0.0, 50.0, 40.0)));
    }

    #[test]
    fn gap_separates_children() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, items) = vertical_list(&mut dom, 2);
        dom.set_gap(list, 10.0);
        assert_eq!(dom.rect(items[1]).map(|r| r.y), Some(40.0));
    }

    #[test]
    fn collapsed_elements_have_no_box_and_leave_flow() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (_, items) = vertical_list(&mut dom, 3);
        dom.set_style(items[0], StyleDecl::Collapsed);
        assert_eq!(dom.rect(items[0]), None);
        assert_eq!(dom.rect(items[1]).map(|r| r.y), Some(0.0));
        dom.clear_style(items[0], StyleKey::Display);
        assert_eq!(dom.rect(items[1]).map(|r| r.y), Some(30.0));
    }

    #[test]
    fn hidden_elements_keep_their_box() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (_, items) = vertical_list(&mut dom, 2);
        dom.set_style(items[0], StyleDecl::Hidden);
        assert!(dom.rect(items[0]).is_some());
        assert_eq!(dom.rect(items[1]).map(|r| r.y), Some(30.0));
    }

    #[test]
    fn transform_moves_reported_rect_but_not_layout() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (_, items) = vertical_list(&mut dom, 2);
        dom.set_style(items[0], StyleDecl::Transform(Point::new(0.0, 30.0)));
        assert_eq!(dom.rect(items[0]).map(|r| r.y), Some(30.0));
        assert_eq!(dom.untransformed_rect(items[0]).map(|r| r.y), Some(0.0));
        assert_eq!(dom.rect(items[1]).map(|r| r.y), Some(30.0));
    }

    #[test]
    fn scroll_offsets_shift_descendants() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, items) = vertical_list(&mut dom, 20);
        dom.set_overflow(list, Overflow::Auto);
        dom.scroll_by(list, Point::new(0.0, 45.0));
        assert_eq!(dom.rect(items[2]).map(|r| r.y), Some(15.0));
        dom.set_window_scroll(Point::new(0.0, 10.0));
        assert_eq!(dom.rect(items[2]).map(|r| r.y), Some(5.0));
        assert_eq!(dom.rect(list).map(|r| r.y), Some(-10.0));
    }

    #[test]
    fn scroll_by_clamps_to_range() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, _) = vertical_list(&mut dom, 20);
        dom.scroll_by(list, Point::new(0.0, 10_000.0));
        let metrics = dom.scroll_metrics(list).map(|m| m.offset);
        assert_eq!(metrics, Some(Point::new(0.0, 300.0)));
        dom.scroll_by(list, Point::new(-5.0, -10_000.0));
        assert_eq!(dom.scroll_metrics(list).map(|m| m.offset), Some(Point::ZERO));
    }

    #[test]
    fn fixed_elements_ignore_window_scroll() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let el = dom.create_element();
        dom.set_style(el, StyleDecl::Fixed(Point::new(40.0, 50.0)));
        dom.set_style(el, StyleDecl::Width(Length::Px(10.0)));
        dom.set_style(el, StyleDecl::Height(Length::Px(10.0)));
        assert!(dom.append_child(dom.root(), el));
        dom.set_window_scroll(Point::new(0.0, 100.0));
        assert_eq!(dom.rect(el), Some(Rect::new(40.0, 50.0, 10.0, 10.0)));
    }

    #[test]
    fn insert_adjacent_positions() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, items) = vertical_list(&mut dom, 2);
        let el = dom.create_element();
        assert!(dom.insert(items[0], InsertPosition::AfterEnd, el));
        assert_eq!(dom.children(list), vec![items[0], el, items[1]]);
        assert!(dom.insert(items[0], InsertPosition::BeforeBegin, el));
        assert_eq!(dom.children(list), vec![el, items[0], items[1]]);
        assert!(dom.insert(list, InsertPosition::BeforeEnd, el));
        assert_eq!(dom.children(list), vec![items[0], items[1], el]);
        dom.detach(el);
        assert_eq!(dom.children(list), items);
        assert_eq!(dom.rect(el), None);
    }

    #[test]
    fn insert_rejects_cycles() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, items) = vertical_list(&mut dom, 1);
        assert!(!dom.insert(items[0], InsertPosition::BeforeEnd, list));
        assert!(!dom.insert(list, InsertPosition::BeforeEnd, dom.root()));
    }

    #[test]
    fn percent_width_resolves_against_parent() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (list, _) = vertical_list(&mut dom, 1);
        let el = dom.create_element();
        dom.set_style(el, StyleDecl::Width(Length::Percent(100.0)));
        dom.append_child(list, el);
        assert_eq!(dom.rect(el).map(|r| r.width), Some(100.0));
    }

    #[test]
    fn clone_copies_presentation_but_not_position() {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let (_, items) = vertical_list(&mut dom, 1);
        dom.set_class(items[0], "card", true);
        let copy = dom.clone_element(items[0]);
        let Some(copy) = copy else {
            unreachable!("clone of a known element");
        };
        assert!(dom.has_class(copy, "card"));
        assert!(!dom.is_attached(copy));
        assert_eq!(dom.rect(copy), None);
    }
}
