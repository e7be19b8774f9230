//! Stack layout engine.
//!
//! Layout is computed over plain [`LayoutSlot`] values extracted from a
//! stack's children, never over the arena itself: the diagram collects the
//! slots, runs a layout function, and writes positions and child order back.
//! That keeps the algorithms free of arena borrows and directly testable.
//!
//! Two disciplines exist, matching [`crate::item::StackStyle`]:
//!
//! - [`stacked`]: children are packed from the stack's top margin with
//!   uniform spacing. Dragging an item reorders the list; everyone else
//!   restacks around a gap left for the dragged item.
//! - [`collision`]: children keep the positions they were given; a moved
//!   item pushes overlapping neighbours out of the way.
//!
//! Both are parameterized over [`Axis`] — columns line up horizontally with
//! the same stacked discipline components use vertically.

use blueprint_core::geometry::{Point, Size};

use crate::item::ItemId;

pub mod collision;
pub mod stacked;

/// Position and extent of one child, detached from the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSlot {
    pub id: ItemId,
    /// Top-left corner in the stack's local frame.
    pub pos: Point,
    pub size: Size,
}

impl LayoutSlot {
    pub fn new(id: ItemId, pos: Point, size: Size) -> Self {
        LayoutSlot { id, pos, size }
    }
}

/// The axis along which a stack arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Main-axis coordinate of a point.
    pub fn main(self, p: Point) -> f32 {
        match self {
            Axis::Horizontal => p.x,
            Axis::Vertical => p.y,
        }
    }

    /// Replaces the main-axis coordinate of a point.
    pub fn with_main(self, p: Point, v: f32) -> Point {
        match self {
            Axis::Horizontal => Point::new(v, p.y),
            Axis::Vertical => Point::new(p.x, v),
        }
    }

    /// Replaces the cross-axis coordinate of a point.
    pub fn with_cross(self, p: Point, v: f32) -> Point {
        match self {
            Axis::Horizontal => Point::new(p.x, v),
            Axis::Vertical => Point::new(v, p.y),
        }
    }

    /// Main-axis extent of a size.
    pub fn extent(self, s: Size) -> f32 {
        match self {
            Axis::Horizontal => s.width,
            Axis::Vertical => s.height,
        }
    }

    /// Cross-axis extent of a size.
    pub fn cross_extent(self, s: Size) -> f32 {
        match self {
            Axis::Horizontal => s.height,
            Axis::Vertical => s.width,
        }
    }
}

/// Main-axis center of a slot.
pub(crate) fn slot_center(axis: Axis, slot: &LayoutSlot) -> f32 {
    axis.main(slot.pos) + axis.extent(slot.size) / 2.0
}

/// Centers a slot's cross-axis position around `cross_center`, if given.
pub(crate) fn apply_cross(axis: Axis, slot: &mut LayoutSlot, cross_center: Option<f32>) {
    if let Some(center) = cross_center {
        slot.pos = axis.with_cross(slot.pos, center - axis.cross_extent(slot.size) / 2.0);
    }
}
