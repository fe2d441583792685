#![forbid(unsafe_code)]

//! Error types for registry and resize operations.
//!
//! Drag session operations never fail; they report
//! [`DragEffect::Noop`](crate::service::DragEffect::Noop) instead.

use std::fmt;

use dndkit_core::dom::ElementId;

use crate::container::{ContainerId, ItemId};

/// Registry or setup failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DndError {
    UnknownContainer(ContainerId),
    UnknownItem(ItemId),
    /// The element is already registered as a container or item.
    AlreadyRegistered(ElementId),
    /// The element has no layout box.
    NotRendered(ElementId),
    /// A host insertion was rejected.
    InsertRejected(ElementId),
    InvalidConfig { field: &'static str, reason: String },
}

impl fmt::Display for DndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownContainer(id) => write!(f, "unknown container {id}"),
            Self::UnknownItem(id) => write!(f, "unknown item {id}"),
            Self::AlreadyRegistered(el) => write!(f, "element {el} is already registered"),
            Self::NotRendered(el) => write!(f, "element {el} has no layout box"),
            Self::InsertRejected(el) => write!(f, "host rejected insertion of {el}"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration for {field}: {reason}")
            }
        }
    }
}

impl std::error::Error for DndError {}
