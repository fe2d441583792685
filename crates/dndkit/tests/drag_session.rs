#![forbid(unsafe_code)]

//! End-to-end drag sessions against the in-memory host.
//!
//! Board layout: a horizontal row of three 200x400 lists `a` (x=0),
//! `b` (x=200) and `c` (x=400), each holding four 200x50 items. `a` and `b`
//! are connected to each other; `c` accepts nothing from them.
//!
//! Overlay scenarios need the feature:
//!   cargo test -p dndkit --features debug-overlay --test drag_session

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use dndkit::service::{CLONE_CLASS, DRAGGING_CLASS};
use dndkit::{
    ContainerConfig, ContainerId, DragConfig, DragController, DragEffect, DragNoopReason, DragService, DropEvent,
    ItemId,
};
use dndkit_core::dom::{Dom, ElementId, StyleKey};
use dndkit_core::geometry::{Axis, Point, Size};
use dndkit_core::memory_dom::MemoryDom;
use dndkit_core::pointer::{PointerEvent, PointerPhase};
use pretty_assertions::assert_eq;
use web_time::Instant;

// ============================================================================
// Fixture
// ============================================================================

type DropLog = Rc<RefCell<Vec<DropEvent>>>;

struct Board {
    dom: MemoryDom,
    service: DragService,
    a: ContainerId,
    b: ContainerId,
    c: ContainerId,
    a_items: Vec<ItemId>,
    b_items: Vec<ItemId>,
    a_drops: DropLog,
    b_drops: DropLog,
}

fn recorder(log: &DropLog) -> impl FnMut(&DropEvent) + 'static {
    let log = Rc::clone(log);
    move |event: &DropEvent| log.borrow_mut().push(*event)
}

fn board_with(b_config: ContainerConfig) -> Board {
    let mut dom = MemoryDom::new(Size::new(800.0, 600.0));
    let row = dom.append(dom.root(), Size::new(800.0, 400.0));
    dom.set_flow(row, Axis::Horizontal, false);
    let a_el = dom.append(row, Size::new(200.0, 400.0));
    let b_el = dom.append(row, Size::new(200.0, 400.0));
    let c_el = dom.append(row, Size::new(200.0, 400.0));

    let a_drops = DropLog::default();
    let b_drops = DropLog::default();
    let mut service = DragService::new(DragConfig::default());
    let registry = service.registry_mut();
    let a = registry
        .register_container(a_el, ContainerConfig::default().connected_to([b_el]), recorder(&a_drops))
        .unwrap();
    let b = registry
        .register_container(b_el, b_config.connected_to([a_el]), recorder(&b_drops))
        .unwrap();
    let c = registry
        .register_container(c_el, ContainerConfig::default(), |_: &DropEvent| {})
        .unwrap();

    let mut fill = |parent: ElementId| -> Vec<ItemId> {
        (0..4)
            .map(|_| {
                let el = dom.append(parent, Size::new(200.0, 50.0));
                service.registry_mut().register_item(&dom, el).unwrap()
            })
            .collect()
    };
    let a_items = fill(a_el);
    let b_items = fill(b_el);
    for _ in 0..4 {
        let el = dom.append(c_el, Size::new(200.0, 50.0));
        service.registry_mut().register_item(&dom, el).unwrap();
    }
    service.registry_mut().refresh_all_geometry(&dom);

    Board {
        dom,
        service,
        a,
        b,
        c,
        a_items,
        b_items,
        a_drops,
        b_drops,
    }
}

fn board() -> Board {
    board_with(ContainerConfig::default())
}

impl Board {
    fn element(&self, item: ItemId) -> ElementId {
        self.service.registry().item(item).unwrap().element()
    }

    fn move_to(&mut self, item: ItemId, x: f64, y: f64) -> DragEffect {
        let event = PointerEvent::mouse(PointerPhase::Move, Point::new(x, y));
        self.service.move_to(&mut self.dom, item, &event, Point::ZERO)
    }
}

fn noop(reason: DragNoopReason) -> DragEffect {
    DragEffect::Noop { reason }
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn transfer_between_lists_reports_both_indices() {
    let mut board = board();
    let item = board.a_items[2];

    let started = board.service.start(&mut board.dom, item);
    assert_eq!(
        started,
        DragEffect::Started {
            item,
            container: board.a,
            index: 2
        }
    );

    let moved = board.move_to(item, 300.0, 60.0);
    assert_eq!(
        moved,
        DragEffect::Moved {
            container: board.b,
            index: 1,
            entered: true
        }
    );

    let expected = DropEvent {
        previous_index: 2,
        current_index: 1,
        item,
        container: board.b,
        previous_container: board.a,
    };
    assert_eq!(board.service.stop(&mut board.dom, item), DragEffect::Dropped { event: expected });
    assert_eq!(*board.b_drops.borrow(), vec![expected]);
    assert!(board.a_drops.borrow().is_empty());
    assert!(!board.service.is_dragging());
}

#[test]
fn reorder_within_list_shifts_siblings_and_cleans_up() {
    let mut board = board();
    let item = board.a_items[0];
    board.service.start(&mut board.dom, item);

    let moved = board.move_to(item, 100.0, 160.0);
    assert_eq!(
        moved,
        DragEffect::Moved {
            container: board.a,
            index: 3,
            entered: false
        }
    );
    for sibling in &board.a_items[1..] {
        assert_eq!(board.dom.transform(board.element(*sibling)), Point::new(0.0, -50.0));
    }
    let placeholder = board.service.placeholder().element().unwrap();
    assert_eq!(board.dom.transform(placeholder), Point::new(0.0, 150.0));

    let effect = board.service.stop(&mut board.dom, item);
    let event = effect.drop_event().copied().unwrap();
    assert_eq!((event.previous_index, event.current_index), (0, 3));
    assert_eq!(event.container, board.a);
    assert_eq!(event.previous_container, board.a);

    for sibling in &board.a_items {
        let el = board.element(*sibling);
        assert_eq!(board.dom.style(el, StyleKey::Transform), None);
        assert_eq!(board.dom.style(el, StyleKey::Display), None);
        assert!(!board.dom.has_class(el, DRAGGING_CLASS));
    }
    assert!(!board.dom.is_attached(placeholder));
    assert_eq!(board.service.placeholder().element(), None);
}

#[test]
fn clone_follows_transform_and_is_removed_on_drop() {
    let mut board = board();
    let item = board.a_items[1];
    board.service.start(&mut board.dom, item);
    let clone = board.service.session().and_then(|s| s.clone_element()).unwrap();
    assert!(board.dom.has_class(clone, CLONE_CLASS));
    assert!(board.dom.is_attached(clone));

    let event = PointerEvent::mouse(PointerPhase::Move, Point::new(120.0, 90.0));
    board
        .service
        .move_to(&mut board.dom, item, &event, Point::new(20.0, 15.0));
    assert_eq!(board.dom.transform(clone), Point::new(20.0, 15.0));

    board.service.stop(&mut board.dom, item);
    assert!(!board.dom.is_attached(clone));
}

#[test]
fn only_one_session_at_a_time() {
    let mut board = board();
    let first = board.a_items[0];
    let second = board.a_items[1];
    assert!(matches!(board.service.start(&mut board.dom, first), DragEffect::Started { .. }));
    let before = board.service.session().cloned();
    let elements = board.dom.element_count();
    assert_eq!(board.service.start(&mut board.dom, second), noop(DragNoopReason::AlreadyDragging));
    assert_eq!(board.service.session().cloned(), before);
    assert_eq!(board.dom.element_count(), elements);
    assert_eq!(board.service.session().map(|s| s.item()), Some(first));
    assert_eq!(board.service.stop(&mut board.dom, second), noop(DragNoopReason::ItemMismatch));
    assert!(board.service.is_dragging());
}

#[test]
fn calls_without_session_are_noops() {
    let mut board = board();
    let item = board.a_items[0];
    assert_eq!(board.service.stop(&mut board.dom, item), noop(DragNoopReason::NotDragging));
    assert_eq!(board.move_to(item, 10.0, 10.0), noop(DragNoopReason::NotDragging));
    assert_eq!(board.service.cancel(&mut board.dom), noop(DragNoopReason::NotDragging));
    assert!(board.a_drops.borrow().is_empty());
}

#[test]
fn orphan_item_cannot_start() {
    let mut board = board();
    let loose = board.dom.append(board.dom.root(), Size::new(50.0, 50.0));
    let item = board.service.registry_mut().register_item(&board.dom, loose).unwrap();
    assert_eq!(
        board.service.start(&mut board.dom, item),
        noop(DragNoopReason::ItemHasNoContainer)
    );
    assert!(!board.service.is_dragging());
}

#[test]
fn pointer_outside_lists_keeps_last_target() {
    let mut board = board();
    let item = board.a_items[1];
    board.service.start(&mut board.dom, item);
    assert_eq!(board.move_to(item, 700.0, 500.0), noop(DragNoopReason::NoContainerUnderPointer));

    let effect = board.service.stop(&mut board.dom, item);
    let event = effect.drop_event().copied().unwrap();
    assert!(event.is_noop());
    assert_eq!(event.container, board.a);
    assert_eq!(board.a_drops.borrow().len(), 1);
}

#[test]
fn unconnected_list_refuses_items() {
    let mut board = board();
    let item = board.a_items[0];
    board.service.start(&mut board.dom, item);
    assert_eq!(board.move_to(item, 500.0, 60.0), noop(DragNoopReason::ConnectionRefused));
    assert_eq!(board.service.placeholder().container(), Some(board.a));
    assert_ne!(board.service.session().map(|s| s.hovered()), Some(board.c));
}

#[test]
fn sort_disabled_destination_appends_without_placeholder() {
    let mut board = board_with(ContainerConfig::default().disable_sort());
    let item = board.a_items[2];
    board.service.start(&mut board.dom, item);

    let moved = board.move_to(item, 300.0, 60.0);
    assert_eq!(
        moved,
        DragEffect::Moved {
            container: board.b,
            index: 4,
            entered: true
        }
    );
    assert!(!board.service.placeholder().is_shown());

    let event = board.service.stop(&mut board.dom, item).drop_event().copied().unwrap();
    assert_eq!((event.previous_index, event.current_index), (2, 4));
    assert_eq!(event.container, board.b);
}

#[test]
fn destination_removed_mid_drag_drops_in_place() {
    let mut board = board();
    let item = board.a_items[1];
    board.service.start(&mut board.dom, item);
    board.move_to(item, 300.0, 160.0);
    assert_eq!(board.service.session().map(|s| s.target_index()), Some(3));
    let placeholder = board.service.placeholder().element().unwrap();

    board.service.registry_mut().remove_container(board.b).unwrap();
    let expected = DropEvent {
        previous_index: 1,
        current_index: 1,
        item,
        container: board.a,
        previous_container: board.a,
    };
    assert_eq!(board.service.stop(&mut board.dom, item), DragEffect::Dropped { event: expected });
    assert!(expected.is_noop());
    assert_eq!(*board.a_drops.borrow(), vec![expected]);
    assert!(board.b_drops.borrow().is_empty());
    assert!(!board.dom.is_attached(placeholder));
}

#[test]
fn cancel_reports_original_slot_to_source() {
    let mut board = board();
    let item = board.a_items[1];
    board.service.start(&mut board.dom, item);
    board.move_to(item, 300.0, 60.0);

    let expected = DropEvent {
        previous_index: 1,
        current_index: 1,
        item,
        container: board.a,
        previous_container: board.a,
    };
    assert_eq!(board.service.cancel(&mut board.dom), DragEffect::Canceled { event: expected });
    assert_eq!(*board.a_drops.borrow(), vec![expected]);
    assert!(board.b_drops.borrow().is_empty());
    for sibling in &board.b_items {
        assert_eq!(board.dom.transform(board.element(*sibling)), Point::ZERO);
    }
}

// ============================================================================
// Controller
// ============================================================================

fn controller(mut board: Board) -> (DragController, Board) {
    let service = std::mem::take(&mut board.service);
    (DragController::with_service(service), board)
}

#[test]
fn controller_coalesces_moves_and_flushes_on_release() {
    let board = board();
    let item = board.a_items[1];
    let (mut ctl, mut board) = controller(board);
    let target = ctl.service().registry().item(item).unwrap().element();
    let t0 = Instant::now();

    let down = PointerEvent::mouse(PointerPhase::Down, Point::new(100.0, 75.0));
    assert!(matches!(ctl.pointer_down(&mut board.dom, target, &down), DragEffect::Started { .. }));
    assert_eq!(ctl.pointer_id(), Some(1));

    let first = PointerEvent::mouse(PointerPhase::Move, Point::new(300.0, 60.0));
    assert_eq!(
        ctl.pointer_move(&mut board.dom, &first, t0),
        DragEffect::Moved {
            container: board.b,
            index: 1,
            entered: true
        }
    );
    let second = PointerEvent::mouse(PointerPhase::Move, Point::new(300.0, 160.0));
    assert_eq!(
        ctl.pointer_move(&mut board.dom, &second, t0 + Duration::from_millis(4)),
        noop(DragNoopReason::Throttled)
    );

    let up = PointerEvent::mouse(PointerPhase::Up, Point::new(300.0, 160.0));
    let effects = ctl.pointer_up(&mut board.dom, &up);
    let expected = DropEvent {
        previous_index: 1,
        current_index: 2,
        item,
        container: board.b,
        previous_container: board.a,
    };
    assert_eq!(
        effects,
        vec![
            DragEffect::Moved {
                container: board.b,
                index: 2,
                entered: false
            },
            DragEffect::Dropped { event: expected },
        ]
    );
    assert!(!ctl.is_dragging());
    assert_eq!(*board.b_drops.borrow(), vec![expected]);
}

#[test]
fn controller_delivers_trailing_move_on_tick() {
    let board = board();
    let item = board.a_items[0];
    let (mut ctl, mut board) = controller(board);
    let target = ctl.service().registry().item(item).unwrap().element();
    let t0 = Instant::now();

    ctl.pointer_down(&mut board.dom, target, &PointerEvent::mouse(PointerPhase::Down, Point::new(100.0, 25.0)));
    ctl.pointer_move(&mut board.dom, &PointerEvent::mouse(PointerPhase::Move, Point::new(100.0, 30.0)), t0);
    ctl.pointer_move(
        &mut board.dom,
        &PointerEvent::mouse(PointerPhase::Move, Point::new(300.0, 60.0)),
        t0 + Duration::from_millis(5),
    );
    assert!(ctl.next_deadline().is_some());
    assert!(ctl.tick(&mut board.dom, t0 + Duration::from_millis(10)).is_empty());

    let effects = ctl.tick(&mut board.dom, t0 + Duration::from_millis(16));
    assert_eq!(
        effects.first(),
        Some(&DragEffect::Moved {
            container: board.b,
            index: 1,
            entered: true
        })
    );
}

#[test]
fn controller_ignores_other_pointers() {
    let board = board();
    let item = board.a_items[0];
    let (mut ctl, mut board) = controller(board);
    let target = ctl.service().registry().item(item).unwrap().element();

    ctl.pointer_down(&mut board.dom, target, &PointerEvent::mouse(PointerPhase::Down, Point::new(10.0, 10.0)));
    let stray = PointerEvent::mouse(PointerPhase::Move, Point::new(300.0, 60.0)).with_pointer_id(7);
    assert_eq!(
        ctl.pointer_move(&mut board.dom, &stray, Instant::now()),
        noop(DragNoopReason::PointerMismatch)
    );
    let stray_up = PointerEvent::mouse(PointerPhase::Up, Point::new(300.0, 60.0)).with_pointer_id(7);
    assert_eq!(ctl.pointer_up(&mut board.dom, &stray_up), vec![noop(DragNoopReason::PointerMismatch)]);
    assert!(ctl.is_dragging());
}

#[test]
fn controller_refreshes_geometry_on_scroll() {
    let board = board();
    let item = board.a_items[0];
    let (mut ctl, mut board) = controller(board);
    let target = ctl.service().registry().item(item).unwrap().element();
    let t0 = Instant::now();

    ctl.pointer_down(&mut board.dom, target, &PointerEvent::mouse(PointerPhase::Down, Point::new(10.0, 10.0)));
    ctl.pointer_move(&mut board.dom, &PointerEvent::mouse(PointerPhase::Move, Point::new(300.0, 60.0)), t0);
    let root = board.dom.scrolling_root();
    assert_eq!(ctl.service().session().map(|s| s.scroll_targets().to_vec()), Some(vec![root]));

    board.dom.set_window_scroll(Point::new(0.0, 20.0));
    let effects = ctl.scroll(&mut board.dom, root, t0 + Duration::from_millis(20));
    match effects.first() {
        Some(DragEffect::Refreshed { scroll_delta, .. }) => assert_eq!(*scroll_delta, Point::new(0.0, 20.0)),
        other => panic!("expected a refresh, got {other:?}"),
    }
    assert!(matches!(effects.get(1), Some(DragEffect::Moved { container, .. }) if *container == board.b));
}

#[test]
fn pointer_down_on_unregistered_element_is_ignored() {
    let board = board();
    let (mut ctl, mut board) = controller(board);
    let root = board.dom.root();
    let stray = board.dom.append(root, Size::new(10.0, 10.0));
    let down = PointerEvent::mouse(PointerPhase::Down, Point::new(1.0, 1.0));
    assert_eq!(ctl.pointer_down(&mut board.dom, stray, &down), noop(DragNoopReason::ItemNotRegistered));
    assert!(!ctl.is_dragging());
}

// ============================================================================
// Debug overlay
// ============================================================================

#[cfg(feature = "debug-overlay")]
#[test]
fn debug_overlay_tracks_hovered_container_and_detaches() {
    use dndkit::service::DEBUG_OVERLAY_CLASS;

    let mut board = board();
    let item = board.a_items[2];
    board.service.start(&mut board.dom, item);
    let overlay = board.service.session().and_then(|s| s.debug_overlay()).unwrap();
    assert!(board.dom.has_class(overlay, DEBUG_OVERLAY_CLASS));
    assert!(board.dom.is_attached(overlay));

    board.move_to(item, 300.0, 60.0);
    let b_el = board.service.registry().container(board.b).unwrap().element();
    assert_eq!(board.dom.rect(overlay), board.dom.rect(b_el));

    board.move_to(item, 100.0, 60.0);
    let a_el = board.service.registry().container(board.a).unwrap().element();
    assert_eq!(board.dom.rect(overlay), board.dom.rect(a_el));

    board.service.stop(&mut board.dom, item);
    assert!(!board.dom.is_attached(overlay));
}
