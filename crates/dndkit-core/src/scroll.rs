#![forbid(unsafe_code)]

//! Scrollable-ancestor discovery and scroll accumulation.
//!
//! An element is scrollable when its computed overflow is `auto`, `scroll`,
//! or `overlay`, or when its content overflows its client box on either axis.
//! The document's scrolling root is never returned as an ancestor; it is the
//! fallback when a root has no scrollable ancestor at all.

use crate::dom::{Dom, ElementId};
use crate::geometry::Point;

/// Returns true if `el` scrolls on either axis.
#[must_use]
pub fn is_scrollable<D: Dom + ?Sized>(dom: &D, el: ElementId) -> bool {
    dom.scroll_metrics(el)
        .is_some_and(|metrics| metrics.is_scrollable())
}

/// Nearest scrollable inclusive ancestor of `el` below the scrolling root.
#[must_use]
pub fn nearest_scrollable_ancestor<D: Dom + ?Sized>(dom: &D, el: ElementId) -> Option<ElementId> {
    let scrolling_root = dom.scrolling_root();
    let mut cursor = Some(el);
    while let Some(current) = cursor {
        if current == scrolling_root {
            return None;
        }
        if is_scrollable(dom, current) {
            return Some(current);
        }
        cursor = dom.parent(current);
    }
    None
}

/// For each root, its nearest scrollable ancestor, or the scrolling root when
/// there is none. Duplicates are removed; first occurrence order is kept.
#[must_use]
pub fn find_scrollable_ancestors<D: Dom + ?Sized>(dom: &D, roots: &[ElementId]) -> Vec<ElementId> {
    let scrolling_root = dom.scrolling_root();
    let mut found: Vec<ElementId> = Vec::with_capacity(roots.len());
    for root in roots {
        let el = nearest_scrollable_ancestor(dom, *root).unwrap_or(scrolling_root);
        if !found.contains(&el) {
            found.push(el);
        }
    }
    core_log!(
        trace,
        roots = roots.len(),
        scrollables = found.len(),
        "resolved scrollable ancestors"
    );
    found
}

/// Total scroll applied above `el`: the window scroll plus the offsets of
/// every scrolling ancestor (excluding `el` itself).
///
/// Adding this to a viewport rectangle yields content-space coordinates that
/// stay stable while any of those ancestors scroll.
#[must_use]
pub fn accumulated_scroll<D: Dom + ?Sized>(dom: &D, el: ElementId) -> Point {
    let scrolling_root = dom.scrolling_root();
    let mut total = dom.window_scroll();
    let mut cursor = dom.parent(el);
    while let Some(current) = cursor {
        if current == scrolling_root {
            break;
        }
        if let Some(metrics) = dom.scroll_metrics(current) {
            total = total + metrics.offset;
        }
        cursor = dom.parent(current);
    }
    total
}
