#![forbid(unsafe_code)]

//! Pointer and touch event normalization.
//!
//! Host adapters translate `mousedown`/`pointermove`/`touchend`/... into a
//! [`PointerEvent`]; the engine only ever reads positions through
//! [`resolve_pointer_position`] (page coordinates) and
//! [`resolve_viewport_pointer_position`] (viewport coordinates, used for
//! hit-testing against live rectangles).
//!
//! Touch events take their position from the first active touch, preferring
//! `targetTouches` and falling back to `changedTouches` (a `touchend` carries
//! its lifted finger only in `changedTouches`).
//!
//! # Wire format
//!
//! [`PointerEvent::to_json_string`] / [`PointerEvent::from_json_str`] encode a
//! small, stable, `kind`-tagged schema used for recording and replaying
//! pointer traces:
//!
//! ```json
//! {"kind":"mouse","phase":"move","pointer_id":1,"x":10.0,"y":20.0,"page_x":10.0,"page_y":520.0}
//! {"kind":"touch","phase":"end","target_touches":[],"changed_touches":[{"id":3,"x":1.0,"y":2.0,"page_x":1.0,"page_y":2.0}]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;
use crate::geometry::Point;

/// Phase of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Input device that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// One touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u32,
    /// Viewport coordinates.
    pub client: Point,
    /// Document coordinates.
    pub page: Point,
}

impl TouchPoint {
    #[must_use]
    pub const fn new(id: u32, client: Point, page: Point) -> Self {
        Self { id, client, page }
    }
}

/// Normalized pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub kind: PointerKind,
    /// Pointer identity for mouse/pen; ignored for touch (see
    /// [`PointerEvent::effective_pointer_id`]).
    pub pointer_id: u32,
    /// Viewport coordinates of a mouse/pen event.
    pub client: Point,
    /// Document coordinates of a mouse/pen event.
    pub page: Point,
    pub target_touches: Vec<TouchPoint>,
    pub changed_touches: Vec<TouchPoint>,
    /// Element the event was dispatched to, if known.
    pub target: Option<ElementId>,
}

impl PointerEvent {
    /// Mouse event with identical client and page coordinates (no scroll).
    #[must_use]
    pub fn mouse(phase: PointerPhase, client: Point) -> Self {
        Self {
            phase,
            kind: PointerKind::Mouse,
            pointer_id: 1,
            client,
            page: client,
            target_touches: Vec::new(),
            changed_touches: Vec::new(),
            target: None,
        }
    }

    /// Touch event from explicit touch lists.
    #[must_use]
    pub fn touch(
        phase: PointerPhase,
        target_touches: Vec<TouchPoint>,
        changed_touches: Vec<TouchPoint>,
    ) -> Self {
        Self {
            phase,
            kind: PointerKind::Touch,
            pointer_id: 0,
            client: Point::ZERO,
            page: Point::ZERO,
            target_touches,
            changed_touches,
            target: None,
        }
    }

    /// Override page coordinates of a mouse/pen event.
    #[must_use]
    pub fn with_page(mut self, page: Point) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: PointerKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// First active touch: `targetTouches[0]`, else `changedTouches[0]`.
    #[must_use]
    pub fn primary_touch(&self) -> Option<&TouchPoint> {
        self.target_touches
            .first()
            .or_else(|| self.changed_touches.first())
    }

    /// Identity used to pair downs, moves, and ups. Touch events use the id of
    /// their primary touch.
    #[must_use]
    pub fn effective_pointer_id(&self) -> u32 {
        match self.kind {
            PointerKind::Touch => self.primary_touch().map_or(self.pointer_id, |t| t.id),
            PointerKind::Mouse | PointerKind::Pen => self.pointer_id,
        }
    }

    /// Encode as a stable JSON string.
    ///
    /// Errors can occur only if serialization fails (for example, due to a
    /// non-finite coordinate).
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PointerEventJson::from(self))
    }

    /// Decode a previously encoded event.
    pub fn from_json_str(s: &str) -> Result<Self, PointerDecodeError> {
        let json: PointerEventJson = serde_json::from_str(s)?;
        Self::try_from(json)
    }
}

/// Page coordinates of the event.
#[must_use]
pub fn resolve_pointer_position(event: &PointerEvent) -> Point {
    match event.kind {
        PointerKind::Touch => event.primary_touch().map_or(event.page, |t| t.page),
        PointerKind::Mouse | PointerKind::Pen => event.page,
    }
}

/// Viewport coordinates of the event.
#[must_use]
pub fn resolve_viewport_pointer_position(event: &PointerEvent) -> Point {
    match event.kind {
        PointerKind::Touch => event.primary_touch().map_or(event.client, |t| t.client),
        PointerKind::Mouse | PointerKind::Pen => event.client,
    }
}

// ---------------------------------------------------------------------------
// JSON schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct TouchPointJson {
    id: u32,
    x: f64,
    y: f64,
    page_x: f64,
    page_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PointerEventJson {
    Mouse {
        phase: PointerPhase,
        #[serde(default = "default_pointer_id")]
        pointer_id: u32,
        x: f64,
        y: f64,
        page_x: f64,
        page_y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ElementId>,
    },
    Pen {
        phase: PointerPhase,
        pointer_id: u32,
        x: f64,
        y: f64,
        page_x: f64,
        page_y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ElementId>,
    },
    Touch {
        phase: PointerPhase,
        #[serde(default)]
        target_touches: Vec<TouchPointJson>,
        #[serde(default)]
        changed_touches: Vec<TouchPointJson>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ElementId>,
    },
}

const fn default_pointer_id() -> u32 {
    1
}

impl From<&TouchPoint> for TouchPointJson {
    fn from(t: &TouchPoint) -> Self {
        Self {
            id: t.id,
            x: t.client.x,
            y: t.client.y,
            page_x: t.page.x,
            page_y: t.page.y,
        }
    }
}

impl From<TouchPointJson> for TouchPoint {
    fn from(t: TouchPointJson) -> Self {
        Self::new(t.id, Point::new(t.x, t.y), Point::new(t.page_x, t.page_y))
    }
}

impl From<&PointerEvent> for PointerEventJson {
    fn from(event: &PointerEvent) -> Self {
        match event.kind {
            PointerKind::Mouse => Self::Mouse {
                phase: event.phase,
                pointer_id: event.pointer_id,
                x: event.client.x,
                y: event.client.y,
                page_x: event.page.x,
                page_y: event.page.y,
                target: event.target,
            },
            PointerKind::Pen => Self::Pen {
                phase: event.phase,
                pointer_id: event.pointer_id,
                x: event.client.x,
                y: event.client.y,
                page_x: event.page.x,
                page_y: event.page.y,
                target: event.target,
            },
            PointerKind::Touch => Self::Touch {
                phase: event.phase,
                target_touches: event.target_touches.iter().map(Into::into).collect(),
                changed_touches: event.changed_touches.iter().map(Into::into).collect(),
                target: event.target,
            },
        }
    }
}

impl TryFrom<PointerEventJson> for PointerEvent {
    type Error = PointerDecodeError;

    fn try_from(json: PointerEventJson) -> Result<Self, Self::Error> {
        let (kind, phase, pointer_id, client, page, target) = match json {
            PointerEventJson::Mouse {
                phase,
                pointer_id,
                x,
                y,
                page_x,
                page_y,
                target,
            } => (
                PointerKind::Mouse,
                phase,
                pointer_id,
                Point::new(x, y),
                Point::new(page_x, page_y),
                target,
            ),
            PointerEventJson::Pen {
                phase,
                pointer_id,
                x,
                y,
                page_x,
                page_y,
                target,
            } => (
                PointerKind::Pen,
                phase,
                pointer_id,
                Point::new(x, y),
                Point::new(page_x, page_y),
                target,
            ),
            PointerEventJson::Touch {
                phase,
                target_touches,
                changed_touches,
                target,
            } => {
                if target_touches.is_empty() && changed_touches.is_empty() {
                    return Err(PointerDecodeError::EmptyTouchList);
                }
                let mut event = PointerEvent::touch(
                    phase,
                    target_touches.into_iter().map(Into::into).collect(),
                    changed_touches.into_iter().map(Into::into).collect(),
                );
                event.target = target;
                return Ok(event);
            }
        };
        let mut event = PointerEvent::mouse(phase, client)
            .with_kind(kind)
            .with_page(page)
            .with_pointer_id(pointer_id);
        event.target = target;
        Ok(event)
    }
}

/// Error decoding a recorded pointer event.
#[derive(Debug)]
pub enum PointerDecodeError {
    /// The input is not valid JSON or does not match the schema.
    Json(serde_json::Error),
    /// A touch event carried neither target nor changed touches.
    EmptyTouchList,
}

impl fmt::Display for PointerDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid pointer event json: {err}"),
            Self::EmptyTouchList => write!(f, "touch event has no touch points"),
        }
    }
}

impl std::error::Error for PointerDecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::EmptyTouchList => None,
        }
    }
}

impl From<serde_json::Error> for PointerDecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u32, x: f64, y: f64, scroll_y: f64) -> TouchPoint {
        TouchPoint::new(id, Point::new(x, y), Point::new(x, y + scroll_y))
    }

    #[test]
    fn mouse_positions_use_event_coordinates() {
        let event = PointerEvent::mouse(PointerPhase::Move, Point::new(10.0, 20.0))
            .with_page(Point::new(10.0, 520.0));
        assert_eq!(resolve_viewport_pointer_position(&event), Point::new(10.0, 20.0));
        assert_eq!(resolve_pointer_position(&event), Point::new(10.0, 520.0));
    }

    #[test]
    fn touch_prefers_target_touches() {
        let event = PointerEvent::touch(
            PointerPhase::Move,
            vec![touch(1, 5.0, 6.0, 100.0)],
            vec![touch(2, 50.0, 60.0, 100.0)],
        );
        assert_eq!(resolve_pointer_position(&event), Point::new(5.0, 106.0));
        assert_eq!(resolve_viewport_pointer_position(&event), Point::new(5.0, 6.0));
        assert_eq!(event.effective_pointer_id(), 1);
    }

    #[test]
    fn touch_end_falls_back_to_changed_touches() {
        let event = PointerEvent::touch(PointerPhase::Up, Vec::new(), vec![touch(7, 1.0, 2.0, 0.0)]);
        assert_eq!(resolve_viewport_pointer_position(&event), Point::new(1.0, 2.0));
        assert_eq!(event.effective_pointer_id(), 7);
    }

    #[test]
    fn json_schema_is_kind_tagged() {
        let event = PointerEvent::mouse(PointerPhase::Down, Point::new(1.0, 2.0))
            .with_target(ElementId::new(9));
        let json = event.to_json_string().expect("encode");
        assert!(json.starts_with(r#"{"kind":"mouse","phase":"down""#), "{json}");
        assert!(json.contains(r#""target":9"#), "{json}");
        let decoded = PointerEvent::from_json_str(&json).expect("decode");
        assert_eq!(decoded, event);
    }

    #[test]
    fn pen_and_touch_decode_preserve_kind() {
        let pen = PointerEvent::from_json_str(
            r#"{"kind":"pen","phase":"move","pointer_id":4,"x":1,"y":2,"page_x":1,"page_y":2}"#,
        )
        .expect("pen");
        assert_eq!(pen.kind, PointerKind::Pen);
        assert_eq!(pen.effective_pointer_id(), 4);

        let touch = PointerEvent::from_json_str(
            r#"{"kind":"touch","phase":"end","changed_touches":[{"id":3,"x":1,"y":2,"page_x":1,"page_y":2}]}"#,
        )
        .expect("touch");
        assert_eq!(touch.kind, PointerKind::Touch);
        assert!(touch.target_touches.is_empty());
    }

    #[test]
    fn decode_errors() {
        let empty = PointerEvent::from_json_str(r#"{"kind":"touch","phase":"move"}"#);
        assert!(matches!(empty, Err(PointerDecodeError::EmptyTouchList)));
        let bad = PointerEvent::from_json_str(r#"{"kind":"wheel"}"#);
        assert!(matches!(bad, Err(PointerDecodeError::Json(_))));
        let msg = PointerDecodeError::EmptyTouchList.to_string();
        assert_eq!(msg, "touch event has no touch points");
    }
}
