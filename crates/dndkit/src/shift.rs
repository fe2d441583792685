#![forbid(unsafe_code)]

//! Shift decision for sibling reorder animation.
//!
//! Given where the placeholder sits and which slot the pointer hovers,
//! [`decide_shift`] tells each sibling whether it must move one slot toward
//! the start of the list ([`Shift::Behind`]), one slot toward the end
//! ([`Shift::Ahead`]), or stay put. It is pure and is evaluated once per
//! sibling per processed pointer move.
//!
//! # Slot indices
//!
//! Indices count the container's items in live order, never the dragged item.
//! In the list the drag started from, the placeholder stands in for the
//! dragged item and occupies a slot; in any other list it does not, and
//! `placeholder_index` is the number of items before it.
//!
//! # Invariants
//!
//! 1. Hovering the placeholder's own slot moves nothing.
//! 2. The shifted siblings form one contiguous run of exactly
//!    `|target_index - placeholder_index|` indices.
//! 3. Forward moves only produce `Behind`; backward moves only `Ahead`.

use serde::{Deserialize, Serialize};

/// Visual displacement of one sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    #[default]
    None,
    /// Move one slot toward the end of the list to open a gap.
    Ahead,
    /// Move one slot toward the start of the list to fill the vacated slot.
    Behind,
}

/// Inputs for one sibling's shift decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftContext {
    /// The sibling being decided.
    pub index: usize,
    pub placeholder_index: usize,
    /// Slot currently under the pointer.
    pub over_item_index: usize,
    /// The pointer is past the hovered item's midpoint.
    pub is_after: bool,
    /// The drag started in this container.
    pub is_self_list: bool,
}

impl ShiftContext {
    /// The same decision evaluated for another sibling.
    #[must_use]
    pub fn with_index(self, index: usize) -> Self {
        Self { index, ..self }
    }

    /// Slot the placeholder should occupy after this move.
    ///
    /// The placeholder takes over the hovered slot, except when the pointer is
    /// in the trailing half of the item directly before it, where it stays.
    #[must_use]
    pub fn target_index(&self) -> usize {
        let over = self.over_item_index;
        let placeholder = self.placeholder_index;
        if over == placeholder || (self.is_after && over + 1 == placeholder) {
            placeholder
        } else {
            over
        }
    }
}

/// Decide how the sibling at `context.index` must shift.
#[must_use]
pub fn decide_shift(context: &ShiftContext) -> Shift {
    let placeholder = context.placeholder_index;
    let target = context.target_index();
    let index = context.index;

    if target > placeholder {
        let moved = if context.is_self_list {
            index > placeholder && index <= target
        } else {
            index >= placeholder && index < target
        };
        if moved {
            return Shift::Behind;
        }
    } else if target < placeholder && index >= target && index < placeholder {
        return Shift::Ahead;
    }
    Shift::None
}

/// Decisions for every sibling `0..len`.
#[must_use]
pub fn decide_shifts(context: &ShiftContext, len: usize) -> Vec<Shift> {
    (0..len)
        .map(|index| decide_shift(&context.with_index(index)))
        .collect()
}
