//! Property-based invariant tests for the shift decision and slot ordering.
//!
//! 1. Hovering the placeholder's own slot moves nothing.
//! 2. Shifted siblings form one contiguous run of |target - placeholder|.
//! 3. Forward moves shift behind, backward moves shift ahead.
//! 4. Ordinal indices follow live document order after arbitrary inserts.

use dndkit::container::NoopDropHandler;
use dndkit::shift::decide_shifts;
use dndkit::{ContainerConfig, DragRegistry, Shift, ShiftContext};
use dndkit_core::dom::{Dom, ElementId, InsertPosition};
use dndkit_core::geometry::Size;
use dndkit_core::memory_dom::MemoryDom;
use proptest::prelude::*;

fn context() -> impl Strategy<Value = (ShiftContext, usize)> {
    (1usize..24, any::<bool>(), any::<bool>()).prop_flat_map(|(len, is_after, is_self_list)| {
        (0..len, 0..len).prop_map(move |(placeholder, over)| {
            let ctx = ShiftContext {
                index: 0,
                placeholder_index: placeholder,
                over_item_index: over,
                is_after,
                is_self_list,
            };
            (ctx, len)
        })
    })
}

fn shifted(shifts: &[Shift]) -> Vec<usize> {
    shifts
        .iter()
        .enumerate()
        .filter(|(_, s)| **s != Shift::None)
        .map(|(i, _)| i)
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Stationary placeholder
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn hovering_own_slot_is_stationary((ctx, len) in context()) {
        let ctx = ShiftContext { over_item_index: ctx.placeholder_index, ..ctx };
        prop_assert_eq!(ctx.target_index(), ctx.placeholder_index);
        prop_assert!(decide_shifts(&ctx, len).iter().all(|s| *s == Shift::None));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Contiguous run of the right size
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn shifted_run_is_contiguous((ctx, len) in context()) {
        let target = ctx.target_index();
        let moved = shifted(&decide_shifts(&ctx, len));
        prop_assert_eq!(moved.len(), target.abs_diff(ctx.placeholder_index));
        for pair in moved.windows(2) {
            prop_assert_eq!(pair[1], pair[0] + 1);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Direction
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn direction_matches_move((ctx, len) in context()) {
        let target = ctx.target_index();
        let shifts = decide_shifts(&ctx, len);
        let expected = if target > ctx.placeholder_index { Shift::Behind } else { Shift::Ahead };
        prop_assert!(shifts.iter().all(|s| *s == Shift::None || *s == expected));
    }

    #[test]
    fn target_is_hovered_or_placeholder((ctx, _len) in context()) {
        let target = ctx.target_index();
        prop_assert!(target == ctx.over_item_index || target == ctx.placeholder_index);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Ordinal round-trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ordinal_follows_document_order(picks in prop::collection::vec(any::<prop::sample::Index>(), 1..16)) {
        let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
        let root = dom.root();
        let list = dom.append(root, Size::new(200.0, 600.0));
        let mut registry = DragRegistry::new();
        registry.register_container(list, ContainerConfig::default(), NoopDropHandler).unwrap();

        let mut elements: Vec<ElementId> = Vec::new();
        for pick in &picks {
            let el = dom.create_element();
            if elements.is_empty() {
                prop_assert!(dom.append_child(list, el));
            } else {
                let reference = elements[pick.index(elements.len())];
                prop_assert!(dom.insert(reference, InsertPosition::BeforeBegin, el));
            }
            elements.push(el);
        }
        let items: Vec<_> = elements.iter().map(|el| registry.register_item(&dom, *el).unwrap()).collect();

        let live = dom.children(list);
        for (el, item) in elements.iter().zip(&items) {
            let expected = live.iter().position(|c| c == el);
            prop_assert_eq!(registry.ordinal_index(&dom, *item, false), expected);
        }
    }
}
