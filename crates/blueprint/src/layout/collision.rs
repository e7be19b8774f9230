//! Free-position layout with overlap resolution.
//!
//! Children keep whatever main-axis position they were given; when a moved
//! item lands on a neighbour, the neighbour is pushed just far enough to
//! clear it. Used for interface items in IO columns and for ports on a
//! component side, where the exact vertical placement is meaningful.

use super::{Axis, LayoutSlot, apply_cross};

/// Re-sorts `moved` into the list by position and pushes overlapping
/// neighbours apart.
///
/// Neighbours above the moved slot are pushed up first; a final sweep from
/// `start` pushes everything below the margin back down, so no pair overlaps
/// and nothing sits above the stack's top margin.
pub fn update_item_move(
    slots: &mut Vec<LayoutSlot>,
    moved: crate::item::ItemId,
    axis: Axis,
    start: f32,
    spacing: f32,
    cross: Option<f32>,
) {
    let Some(from) = slots.iter().position(|s| s.id == moved) else {
        return;
    };
    let moved_slot = slots.remove(from);

    let main = axis.main(moved_slot.pos);
    let to = slots
        .iter()
        .position(|s| axis.main(s.pos) > main)
        .unwrap_or(slots.len());
    slots.insert(to, moved_slot);

    // Push the slots above the moved one up, innermost first.
    for i in (0..to).rev() {
        let limit = axis.main(slots[i + 1].pos) - spacing - axis.extent(slots[i].size);
        if axis.main(slots[i].pos) > limit {
            slots[i].pos = axis.with_main(slots[i].pos, limit);
        }
    }

    normalize(slots, axis, start, spacing, cross);
}

/// Places `moved` at `main_pos` on the main axis (cross set from `cross`) and
/// resolves overlaps.
pub fn set_item_pos(
    slots: &mut Vec<LayoutSlot>,
    moved: crate::item::ItemId,
    main_pos: f32,
    axis: Axis,
    start: f32,
    spacing: f32,
    cross: Option<f32>,
) {
    let Some(slot) = slots.iter_mut().find(|s| s.id == moved) else {
        return;
    };
    slot.pos = axis.with_main(slot.pos, main_pos);

    update_item_move(slots, moved, axis, start, spacing, cross);
}

/// Sweeps the sorted list from `start`, pushing any slot that overlaps its
/// predecessor (or sits above the margin) down to the first free position.
fn normalize(slots: &mut [LayoutSlot], axis: Axis, start: f32, spacing: f32, cross: Option<f32>) {
    let mut cursor = start;
    for slot in slots.iter_mut() {
        if axis.main(slot.pos) < cursor {
            slot.pos = axis.with_main(slot.pos, cursor);
        }
        apply_cross(axis, slot, cross);
        cursor = axis.main(slot.pos) + axis.extent(slot.size) + spacing;
    }
}
