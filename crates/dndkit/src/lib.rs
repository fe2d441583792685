#![forbid(unsafe_code)]

//! Drag-and-drop engine.
//!
//! Containers and draggable items register with a [`DragRegistry`]; a
//! [`DragService`] runs at most one drag session at a time against a host
//! document ([`Dom`](dndkit_core::dom::Dom)), moving a placeholder through the
//! hovered container and reporting a single [`DropEvent`] per gesture. The
//! caller owns its data and applies the reorder or transfer itself.
//!
//! [`DragController`] routes raw pointer, scroll and hover events onto the
//! service with frame throttling and edge auto-scroll. [`ResizeSession`]
//! implements corner-handle resizing.

pub mod autoscroll;
pub mod config;
pub mod container;
pub mod controller;
pub mod error;
pub mod hover;
pub mod placeholder;
pub mod registry;
pub mod resize;
pub mod service;
pub mod shift;

pub use config::{ContainerConfig, DragConfig, ResizeConfig};
pub use container::{ContainerId, Direction, DraggableItem, DropContainer, DropEvent, DropHandler, ItemId};
pub use controller::DragController;
pub use error::DndError;
pub use hover::{Hover, resolve_hover};
pub use placeholder::PlaceholderController;
pub use registry::DragRegistry;
pub use resize::{Corner, ResizeSession};
pub use service::{DragEffect, DragNoopReason, DragService, DragSession};
pub use shift::{Shift, ShiftContext, decide_shift};
