#![forbid(unsafe_code)]

//! Container, drag, and resize configuration.
//!
//! Options can be built in code with the `with_*` builders or parsed from the
//! loosely-typed option objects UI glue passes around (`direction`,
//! `disableSort`, `connectedTo`, `rtl`, `flexWrap`, `minWidth`, `minHeight`,
//! `boundary`). Parsing is lenient: a malformed value is logged as a warning
//! and replaced by its default, since a bad option must never break a drag
//! that is already under way.

use std::time::Duration;

use dndkit_core::dom::ElementId;
use serde_json::Value;

use crate::container::Direction;
use crate::error::DndError;

// ---------------------------------------------------------------------------
// ContainerConfig
// ---------------------------------------------------------------------------

/// Per-container options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    pub direction: Direction,
    /// Horizontal lists flow right-to-left.
    pub rtl: bool,
    /// Items wrap onto several rows. Hit-testing handles wrapped rows; the
    /// placeholder animation treats the list as a single line.
    pub flex_wrap: bool,
    /// Items can be dragged out but the list never reorders.
    pub disable_sort: bool,
    /// Container elements this list exchanges items with.
    pub connected_to: Vec<ElementId>,
}

impl ContainerConfig {
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn horizontal(self) -> Self {
        self.with_direction(Direction::Horizontal)
    }

    #[must_use]
    pub fn rtl(mut self) -> Self {
        self.rtl = true;
        self
    }

    #[must_use]
    pub fn flex_wrap(mut self) -> Self {
        self.flex_wrap = true;
        self
    }

    #[must_use]
    pub fn disable_sort(mut self) -> Self {
        self.disable_sort = true;
        self
    }

    #[must_use]
    pub fn connected_to(mut self, elements: impl IntoIterator<Item = ElementId>) -> Self {
        self.connected_to.extend(elements);
        self
    }

    /// Parse an options object, logging and defaulting invalid values.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let (config, issues) = Self::from_json_with_issues(value);
        warn_issues(&issues);
        config
    }

    /// Parse an options object, returning the configuration together with
    /// every value that was rejected and defaulted.
    #[must_use]
    pub fn from_json_with_issues(value: &Value) -> (Self, Vec<DndError>) {
        let mut issues = Vec::new();
        let mut config = Self::default();
        let Some(options) = options_object(value, &mut issues) else {
            return (config, issues);
        };

        if let Some(direction) = options.get("direction") {
            match direction.as_str() {
                Some("horizontal") => config.direction = Direction::Horizontal,
                Some("vertical") => config.direction = Direction::Vertical,
                _ => issues.push(invalid("direction", format!("expected \"horizontal\" or \"vertical\", got {direction}"))),
            }
        }
        config.rtl = flag(options.get("rtl"), "rtl", &mut issues);
        config.flex_wrap = flag(options.get("flexWrap"), "flexWrap", &mut issues);
        config.disable_sort = flag(options.get("disableSort"), "disableSort", &mut issues);

        match options.get("connectedTo") {
            None | Some(Value::Null) => {}
            Some(Value::Array(entries)) => {
                for entry in entries {
                    match element_id(entry) {
                        Some(el) => config.connected_to.push(el),
                        None => issues.push(invalid("connectedTo", format!("ignoring non-element entry {entry}"))),
                    }
                }
            }
            Some(other) => issues.push(invalid("connectedTo", format!("expected an array, got {other}"))),
        }
        (config, issues)
    }
}

// ---------------------------------------------------------------------------
// DragConfig
// ---------------------------------------------------------------------------

/// Session-wide drag tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct DragConfig {
    /// Minimum spacing between processed pointer moves and scroll refreshes
    /// (default: 16ms).
    pub throttle: Duration,
    /// Easing duration applied to placeholder and sibling transforms
    /// (default: 150ms).
    pub transition: Duration,
    /// Stacking order of the floating clone (default: 1000).
    pub clone_z_index: i32,
    /// Scroll containers when the pointer nears their edges (default: true).
    pub auto_scroll: bool,
    /// Distance from an edge, in px, at which auto-scroll starts (default: 40).
    pub edge_threshold: f64,
    /// Auto-scroll speed at the very edge, in px per tick (default: 20).
    pub max_speed: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(16),
            transition: Duration::from_millis(150),
            clone_z_index: 1000,
            auto_scroll: true,
            edge_threshold: 40.0,
            max_speed: 20.0,
        }
    }
}

impl DragConfig {
    #[must_use]
    pub fn with_throttle(mut self, interval: Duration) -> Self {
        self.throttle = interval;
        self
    }

    #[must_use]
    pub fn with_transition(mut self, duration: Duration) -> Self {
        self.transition = duration;
        self
    }

    #[must_use]
    pub fn with_clone_z_index(mut self, z_index: i32) -> Self {
        self.clone_z_index = z_index;
        self
    }

    /// Tune auto-scroll.
    #[must_use]
    pub fn with_auto_scroll(mut self, edge_threshold: f64, max_speed: f64) -> Self {
        self.auto_scroll = true;
        self.edge_threshold = edge_threshold.max(0.0);
        self.max_speed = max_speed.max(0.0);
        self
    }

    #[must_use]
    pub fn no_auto_scroll(mut self) -> Self {
        self.auto_scroll = false;
        self
    }
}

// ---------------------------------------------------------------------------
// ResizeConfig
// ---------------------------------------------------------------------------

/// Options for corner-handle resizing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizeConfig {
    pub min_width: f64,
    pub min_height: f64,
    /// Element whose rectangle the resized element must stay inside.
    pub boundary: Option<ElementId>,
}

impl ResizeConfig {
    #[must_use]
    pub fn with_min_size(mut self, width: f64, height: f64) -> Self {
        self.min_width = width.max(0.0);
        self.min_height = height.max(0.0);
        self
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: ElementId) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Parse an options object, logging and defaulting invalid values.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let mut issues = Vec::new();
        let mut config = Self::default();
        if let Some(options) = options_object(value, &mut issues) {
            config.min_width = dimension(options.get("minWidth"), "minWidth", &mut issues);
            config.min_height = dimension(options.get("minHeight"), "minHeight", &mut issues);
            match options.get("boundary") {
                None | Some(Value::Null) => {}
                Some(entry) => match element_id(entry) {
                    Some(el) => config.boundary = Some(el),
                    None => issues.push(invalid("boundary", format!("expected an element id, got {entry}"))),
                },
            }
        }
        warn_issues(&issues);
        config
    }
}

// ---------------------------------------------------------------------------
// Lenient parsing helpers
// ---------------------------------------------------------------------------

fn invalid(field: &'static str, reason: String) -> DndError {
    DndError::InvalidConfig { field, reason }
}

fn warn_issues(issues: &[DndError]) {
    for issue in issues {
        tracing::warn!(error = %issue, "invalid option; using default");
    }
}

fn options_object<'a>(
    value: &'a Value,
    issues: &mut Vec<DndError>,
) -> Option<&'a serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            issues.push(invalid("options", format!("expected an object, got {other}")));
            None
        }
    }
}

fn flag(value: Option<&Value>, field: &'static str, issues: &mut Vec<DndError>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            issues.push(invalid(field, format!("expected a boolean, got {other}")));
            false
        }
    }
}

fn dimension(value: Option<&Value>, field: &'static str, issues: &mut Vec<DndError>) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(v) => match v.as_f64() {
            Some(n) if n.is_finite() && n >= 0.0 => n,
            _ => {
                issues.push(invalid(field, format!("expected a non-negative number, got {v}")));
                0.0
            }
        },
    }
}

fn element_id(value: &Value) -> Option<ElementId> {
    value.as_u64().map(ElementId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn container_options_parse() {
        let config = ContainerConfig::from_json(&json!({
            "direction": "horizontal",
            "rtl": true,
            "disableSort": true,
            "connectedTo": [4, 5],
        }));
        assert_eq!(config.direction, Direction::Horizontal);
        assert!(config.rtl);
        assert!(config.disable_sort);
        assert!(!config.flex_wrap);
        assert_eq!(config.connected_to, vec![ElementId::new(4), ElementId::new(5)]);
    }

    #[test]
    fn non_array_connection_list_defaults_to_empty() {
        let (config, issues) =
            ContainerConfig::from_json_with_issues(&json!({ "connectedTo": "list-b" }));
        assert!(config.connected_to.is_empty());
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            issues[0],
            DndError::InvalidConfig { field: "connectedTo", .. }
        ));
    }

    #[test]
    fn bad_values_are_defaulted_individually() {
        let (config, issues) = ContainerConfig::from_json_with_issues(&json!({
            "direction": "diagonal",
            "rtl": "yes",
            "flexWrap": true,
            "connectedTo": [1, "x", 2],
        }));
        assert_eq!(config.direction, Direction::Vertical);
        assert!(!config.rtl);
        assert!(config.flex_wrap);
        assert_eq!(config.connected_to, vec![ElementId::new(1), ElementId::new(2)]);
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn non_object_options_default() {
        let (config, issues) = ContainerConfig::from_json_with_issues(&json!([1, 2]));
        assert_eq!(config, ContainerConfig::default());
        assert_eq!(issues.len(), 1);
        let (_, issues) = ContainerConfig::from_json_with_issues(&Value::Null);
        assert!(issues.is_empty());
    }

    #[test]
    fn builders_compose() {
        let config = ContainerConfig::default()
            .horizontal()
            .rtl()
            .connected_to([ElementId::new(9)]);
        assert_eq!(config.direction, Direction::Horizontal);
        assert!(config.rtl);
        assert_eq!(config.connected_to, vec![ElementId::new(9)]);
    }

    #[test]
    fn drag_config_defaults() {
        let config = DragConfig::default();
        assert_eq!(config.throttle, Duration::from_millis(16));
        assert_eq!(config.transition, Duration::from_millis(150));
        assert!(config.auto_scroll);
        let config = config.no_auto_scroll().with_throttle(Duration::ZERO);
        assert!(!config.auto_scroll);
        assert_eq!(config.throttle, Duration::ZERO);
    }

    #[test]
    fn resize_options_parse() {
        let config = ResizeConfig::from_json(&json!({
            "minWidth": 50,
            "minHeight": -3,
            "boundary": 12,
        }));
        assert_eq!(config.min_width, 50.0);
        assert_eq!(config.min_height, 0.0);
        assert_eq!(config.boundary, Some(ElementId::new(12)));
    }
}
