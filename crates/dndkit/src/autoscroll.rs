#![forbid(unsafe_code)]

//! Edge auto-scroll.
//!
//! While a drag is active and the pointer sits inside the edge band of a
//! scrollable ancestor, that ancestor scrolls toward the edge. Speed ramps
//! linearly from zero at the inner border of the band to `max_speed` at the
//! edge itself.

use dndkit_core::dom::{Dom, ElementId};
use dndkit_core::geometry::{Point, Rect};

use crate::config::DragConfig;

/// One scroll step chosen for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScroll {
    pub element: ElementId,
    pub delta: Point,
}

/// Scroll velocity for `point` inside `bounds`, in pixels per frame.
///
/// Zero outside `bounds` and outside the edge band. The band shrinks to half
/// the extent on axes narrower than two thresholds.
#[must_use]
pub fn scroll_velocity(bounds: Rect, point: Point, edge_threshold: f64, max_speed: f64) -> Point {
    if !bounds.contains(point) || edge_threshold <= 0.0 || max_speed <= 0.0 {
        return Point::ZERO;
    }
    let axis = |pos: f64, start: f64, end: f64| -> f64 {
        let band = edge_threshold.min((end - start) / 2.0);
        if band <= 0.0 {
            return 0.0;
        }
        let to_start = pos - start;
        let to_end = end - pos;
        if to_start < band {
            -max_speed * (1.0 - to_start / band)
        } else if to_end < band {
            max_speed * (1.0 - to_end / band)
        } else {
            0.0
        }
    };
    Point::new(
        axis(point.x, bounds.left(), bounds.right()),
        axis(point.y, bounds.top(), bounds.bottom()),
    )
}

/// Pick the scroll step for this frame: the deepest target whose edge band
/// holds `point` and that can still scroll in that direction.
#[must_use]
pub fn auto_scroll_step(
    dom: &dyn Dom,
    targets: &[ElementId],
    point: Point,
    config: &DragConfig,
) -> Option<AutoScroll> {
    if !config.auto_scroll {
        return None;
    }
    let mut ordered: Vec<ElementId> = targets.to_vec();
    ordered.sort_by_key(|el| std::cmp::Reverse(dom.depth(*el)));

    let root = dom.scrolling_root();
    ordered.into_iter().find_map(|element| {
        let metrics = dom.scroll_metrics(element)?;
        let bounds = if element == root {
            Rect::from_origin_size(Point::ZERO, metrics.client)
        } else {
            dom.rect(element)?
        };
        let velocity = scroll_velocity(bounds, point, config.edge_threshold, config.max_speed);
        let max = metrics.max_offset();
        let clamp = |v: f64, offset: f64, max: f64| -> f64 {
            if (v < 0.0 && offset <= 0.0) || (v > 0.0 && offset >= max) {
                0.0
            } else {
                v
            }
        };
        let delta = Point::new(
            clamp(velocity.x, metrics.offset.x, max.x),
            clamp(velocity.y, metrics.offset.y, max.y),
        );
        (!delta.is_zero()).then_some(AutoScroll { element, delta })
    })
}
