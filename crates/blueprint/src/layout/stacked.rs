//! Packed stack layout.
//!
//! Children occupy consecutive slots from the stack's top margin with uniform
//! spacing; their list order is their visual order. While one of them is
//! being dragged the rest restack around a gap reserved at the dragged item's
//! would-be slot, which gives the familiar "make room" animation without ever
//! moving the item under the cursor.

use super::{Axis, LayoutSlot, apply_cross, slot_center};

/// Packs all slots in list order from `start`, each `spacing` apart, centered
/// on `cross_center` when given.
pub fn update_positions(
    slots: &mut [LayoutSlot],
    axis: Axis,
    start: f32,
    spacing: f32,
    cross_center: Option<f32>,
) {
    let mut cursor = start;
    for slot in slots.iter_mut() {
        slot.pos = axis.with_main(slot.pos, cursor);
        apply_cross(axis, slot, cross_center);
        cursor += axis.extent(slot.size) + spacing;
    }
}

/// Reflows the stack around `moved` mid-drag.
///
/// The moved slot keeps its dragged position but is re-sorted into the list
/// by its center; every other slot is packed, skipping a gap the size of the
/// moved slot at its list position.
pub fn update_item_move(
    slots: &mut Vec<LayoutSlot>,
    moved: crate::item::ItemId,
    axis: Axis,
    start: f32,
    spacing: f32,
    cross_center: Option<f32>,
) {
    let Some(from) = slots.iter().position(|s| s.id == moved) else {
        return;
    };
    let moved_slot = slots.remove(from);

    let center = slot_center(axis, &moved_slot);
    let to = slots
        .iter()
        .position(|s| slot_center(axis, s) > center)
        .unwrap_or(slots.len());
    slots.insert(to, moved_slot);

    let mut cursor = start;
    for slot in slots.iter_mut() {
        if slot.id == moved {
            // Leave the gap; the dragged item stays under the cursor.
            cursor += axis.extent(slot.size) + spacing;
            continue;
        }
        slot.pos = axis.with_main(slot.pos, cursor);
        apply_cross(axis, slot, cross_center);
        cursor += axis.extent(slot.size) + spacing;
    }
}

/// Settles `moved` into its slot at drag end and packs the whole stack.
pub fn set_item_pos(
    slots: &mut Vec<LayoutSlot>,
    moved: crate::item::ItemId,
    axis: Axis,
    start: f32,
    spacing: f32,
    cross_center: Option<f32>,
) {
    update_item_move(slots, moved, axis, start, spacing, cross_center);
    update_positions(slots, axis, start, spacing, cross_center);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use crate::layout::test_util::{order, slot};

    #[test]
    fn update_positions_packs_from_start() {
        let mut slots = vec![
            slot(1, 0.0, 999.0, 220.0, 80.0),
            slot(2, 0.0, 0.0, 220.0, 100.0),
            slot(3, 0.0, 5.0, 220.0, 80.0),
        ];
        update_positions(&mut slots, Axis::Vertical, 60.0, 30.0, Some(130.0));

        assert_eq!(slots[0].pos.y, 60.0);
        assert_eq!(slots[1].pos.y, 170.0);
        assert_eq!(slots[2].pos.y, 300.0);
        // All centered on the column axis.
        assert!(slots.iter().all(|s| s.pos.x == 20.0));
    }

    #[test]
    fn dragging_below_a_neighbour_swaps_order() {
        let mut slots = vec![
            slot(1, 0.0, 60.0, 220.0, 80.0),
            slot(2, 0.0, 170.0, 220.0, 80.0),
        ];

        // Drag item 1 down past item 2's center.
        slots[0].pos.y = 200.0;
        update_item_move(&mut slots, ItemId::new(1), Axis::Vertical, 60.0, 30.0, None);

        assert_eq!(order(&slots), vec![2, 1]);
        // Item 2 restacked to the top slot, item 1 untouched mid-drag.
        assert_eq!(slots[0].pos.y, 60.0);
        assert_eq!(slots[1].pos.y, 200.0);
    }

    #[test]
    fn gap_is_left_for_the_dragged_item() {
        let mut slots = vec![
            slot(1, 0.0, 60.0, 220.0, 80.0),
            slot(2, 0.0, 170.0, 220.0, 80.0),
            slot(3, 0.0, 280.0, 220.0, 80.0),
        ];

        // Drag item 3 up between 1 and 2.
        slots[2].pos.y = 150.0;
        update_item_move(&mut slots, ItemId::new(3), Axis::Vertical, 60.0, 30.0, None);

        assert_eq!(order(&slots), vec![1, 3, 2]);
        assert_eq!(slots[0].pos.y, 60.0);
        // Item 2 sits below the gap reserved for item 3.
        assert_eq!(slots[2].pos.y, 280.0);
    }

    #[test]
    fn set_item_pos_snaps_the_moved_item_into_its_slot() {
        let mut slots = vec![
            slot(1, 0.0, 60.0, 220.0, 80.0),
            slot(2, 0.0, 170.0, 220.0, 80.0),
        ];

        slots[0].pos.y = 203.0;
        set_item_pos(&mut slots, ItemId::new(1), Axis::Vertical, 60.0, 30.0, None);

        assert_eq!(order(&slots), vec![2, 1]);
        assert_eq!(slots[0].pos.y, 60.0);
        assert_eq!(slots[1].pos.y, 170.0);
    }

    #[test]
    fn horizontal_axis_packs_left_to_right() {
        let mut slots = vec![
            slot(1, 50.0, 0.0, 260.0, 600.0),
            slot(2, 400.0, 0.0, 300.0, 600.0),
        ];
        update_positions(&mut slots, Axis::Horizontal, 0.0, 0.0, None);

        assert_eq!(slots[0].pos.x, 0.0);
        assert_eq!(slots[1].pos.x, 260.0);
    }
}
