#![forbid(unsafe_code)]

//! Corner-handle resizing.
//!
//! A [`ResizeSession`] follows one pointer gesture on a corner handle. Each
//! update recomputes the element's rectangle from the gesture origin, clamps
//! it into the boundary element, enforces the minimum size, and writes the
//! result as explicit width/height plus a translate for the edges that move
//! the origin.
//!
//! # Invariants
//!
//! 1. The edges opposite the handle never move.
//! 2. Width and height never drop below the configured minimum. When the
//!    boundary is smaller than the minimum, the minimum wins.
//! 3. `cancel` restores the element's prior declarations.

use dndkit_core::dom::{Dom, ElementId, StyleDecl, StyleKey, Length};
use dndkit_core::geometry::{Point, Rect};

use crate::config::ResizeConfig;
use crate::error::DndError;

/// Handle being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    #[must_use]
    pub const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    #[must_use]
    pub const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }
}

/// One active corner-resize gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    element: ElementId,
    corner: Corner,
    config: ResizeConfig,
    origin: Point,
    initial: Rect,
    current: Rect,
    base_transform: Point,
    prior: [Option<StyleDecl>; 3],
}

impl ResizeSession {
    /// Start resizing `element` from `corner`, with the pointer at `pointer`
    /// in viewport coordinates.
    pub fn begin(
        dom: &dyn Dom,
        element: ElementId,
        corner: Corner,
        config: ResizeConfig,
        pointer: Point,
    ) -> Result<Self, DndError> {
        let initial = dom.rect(element).ok_or(DndError::NotRendered(element))?;
        tracing::debug!(element = %element, ?corner, "resize started");
        Ok(Self {
            element,
            corner,
            config,
            origin: pointer,
            initial,
            current: initial,
            base_transform: dom.transform(element),
            prior: [
                dom.style(element, StyleKey::Width),
                dom.style(element, StyleKey::Height),
                dom.style(element, StyleKey::Transform),
            ],
        })
    }

    #[must_use]
    pub fn element(&self) -> ElementId {
        self.element
    }

    #[must_use]
    pub fn corner(&self) -> Corner {
        self.corner
    }

    #[must_use]
    pub fn initial_rect(&self) -> Rect {
        self.initial
    }

    #[must_use]
    pub fn current_rect(&self) -> Rect {
        self.current
    }

    /// Follow the pointer and return the new viewport rectangle.
    pub fn update(&mut self, dom: &mut dyn Dom, pointer: Point) -> Rect {
        let delta = pointer - self.origin;
        let mut left = self.initial.left();
        let mut top = self.initial.top();
        let mut right = self.initial.right();
        let mut bottom = self.initial.bottom();
        if self.corner.moves_left() {
            left += delta.x;
        } else {
            right += delta.x;
        }
        if self.corner.moves_top() {
            top += delta.y;
        } else {
            bottom += delta.y;
        }

        if let Some(bounds) = self.config.boundary.and_then(|b| dom.rect(b)) {
            left = left.max(bounds.left());
            top = top.max(bounds.top());
            right = right.min(bounds.right());
            bottom = bottom.min(bounds.bottom());
        }

        let min_width = self.config.min_width.max(0.0);
        let min_height = self.config.min_height.max(0.0);
        if right - left < min_width {
            if self.corner.moves_left() {
                left = right - min_width;
            } else {
                right = left + min_width;
            }
        }
        if bottom - top < min_height {
            if self.corner.moves_top() {
                top = bottom - min_height;
            } else {
                bottom = top + min_height;
            }
        }

        let rect = Rect::new(left, top, right - left, bottom - top);
        self.apply(dom, rect);
        self.current = rect;
        rect
    }

    fn apply(&self, dom: &mut dyn Dom, rect: Rect) {
        dom.set_style(self.element, StyleDecl::Width(Length::Px(rect.width)));
        dom.set_style(self.element, StyleDecl::Height(Length::Px(rect.height)));
        let translate = self.base_transform + (rect.origin() - self.initial.origin());
        if translate.is_zero() {
            dom.clear_style(self.element, StyleKey::Transform);
        } else {
            dom.set_style(self.element, StyleDecl::Transform(translate));
        }
    }

    /// End the gesture, keeping the last rectangle.
    pub fn finish(self) -> Rect {
        tracing::debug!(
            element = %self.element,
            width = self.current.width,
            height = self.current.height,
            "resize finished"
        );
        self.current
    }

    /// End the gesture and restore the element's prior size and translate.
    pub fn cancel(self, dom: &mut dyn Dom) {
        let keys = [StyleKey::Width, StyleKey::Height, StyleKey::Transform];
        for (key, prior) in keys.into_iter().zip(self.prior) {
            match prior {
                Some(decl) => dom.set_style(self.element, decl),
                None => dom.clear_style(self.element, key),
            }
        }
        tracing::debug!(element = %self.element, "resize canceled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dndkit_core::geometry::Size;
    use dndkit_core::memory_dom::MemoryDom;

    fn setup() -> (MemoryDom, ElementId, ElementId) {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let frame = dom.append(dom.root(), Size::new(200.0, 200.0));
        let el = dom.append(frame, Size::new(100.0, 100.0));
        (dom, frame, el)
    }

    #[test]
    fn bottom_right_grows_size_only() {
        let (mut dom, _, el) = setup();
        let mut session =
            ResizeSession::begin(&dom, el, Corner::BottomRight, ResizeConfig::default(), Point::new(100.0, 100.0))
                .unwrap();
        let rect = session.update(&mut dom, Point::new(150.0, 120.0));
        assert_eq!(rect, Rect::new(0.0, 0.0, 150.0, 120.0));
        assert_eq!(dom.rect(el), Some(rect));
        assert_eq!(dom.style(el, StyleKey::Transform), None);
        assert_eq!(session.finish(), rect);
    }

    #[test]
    fn top_left_translates_origin() {
        let (mut dom, _, el) = setup();
        let mut session =
            ResizeSession::begin(&dom, el, Corner::TopLeft, ResizeConfig::default(), Point::ZERO).unwrap();
        let rect = session.update(&mut dom, Point::new(30.0, 30.0));
        assert_eq!(rect, Rect::new(30.0, 30.0, 70.0, 70.0));
        assert_eq!(dom.rect(el), Some(rect));
    }

    #[test]
    fn minimum_size_pins_moving_edge() {
        let (mut dom, _, el) = setup();
        let config = ResizeConfig::default().with_min_size(80.0, 80.0);
        let mut session = ResizeSession::begin(&dom, el, Corner::TopLeft, config, Point::ZERO).unwrap();
        let rect = session.update(&mut dom, Point::new(30.0, 30.0));
        assert_eq!(rect, Rect::new(20.0, 20.0, 80.0, 80.0));
    }

    #[test]
    fn boundary_clamps_growth() {
        let (mut dom, frame, el) = setup();
        let config = ResizeConfig::default().with_boundary(frame);
        let mut session =
            ResizeSession::begin(&dom, el, Corner::BottomRight, config, Point::new(100.0, 100.0)).unwrap();
        let rect = session.update(&mut dom, Point::new(600.0, 600.0));
        assert_eq!(rect, Rect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn cancel_restores_prior_styles() {
        let (mut dom, _, el) = setup();
        let mut session =
            ResizeSession::begin(&dom, el, Corner::TopLeft, ResizeConfig::default(), Point::ZERO).unwrap();
        session.update(&mut dom, Point::new(10.0, 10.0));
        session.cancel(&mut dom);
        assert_eq!(dom.rect(el), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(dom.style(el, StyleKey::Width), None);
    }

    #[test]
    fn begin_requires_layout() {
        let (mut dom, _, el) = setup();
        dom.set_style(el, StyleDecl::Collapsed);
        let err = ResizeSession::begin(&dom, el, Corner::TopLeft, ResizeConfig::default(), Point::ZERO).unwrap_err();
        assert_eq!(err, DndError::NotRendered(el));
    }
}
