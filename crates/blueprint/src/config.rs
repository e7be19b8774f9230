//! Layout and interaction configuration.
//!
//! All geometric constants of the editor — grid size, stack spacings, margins,
//! default widths, snap radius — flow from [`LayoutConfig`] so that a host can
//! tune them in one place.

use serde::{Deserialize, Serialize};

/// Geometric constants used by the layout engine and interaction controller.
///
/// The defaults reproduce the classic diagram proportions: a 10-unit grid,
/// 30-unit spacing between stacked components, tight 4-unit spacing between
/// interface items in IO columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Side of the snapping grid. All interactive placement snaps to it.
    pub grid_size: f32,
    /// Top margin of a column's content area, below the column header.
    pub column_top_margin: f32,
    /// Vertical spacing between stacked items in a component column.
    pub stack_spacing: f32,
    /// Spacing between interface items in an IO column.
    pub io_spacing: f32,
    /// Spacing between ports stacked on a component side.
    pub port_spacing: f32,
    /// Minimum distance of the first port from the component's top edge.
    pub port_top_margin: f32,
    /// Width of a newly created column.
    pub default_column_width: f32,
    /// Minimum height of a column; columns grow past it to contain their
    /// content.
    pub min_column_height: f32,
    /// Width of a component instance.
    pub component_width: f32,
    /// Minimum height of a component instance.
    pub min_component_height: f32,
    /// Side of the square port glyph.
    pub port_size: f32,
    /// Radius within which a press or a dragged connection end snaps to an
    /// endpoint.
    pub snap_radius: f32,
    /// Length of the stub segment a connection leaves an endpoint with.
    pub connection_stub: f32,
    /// Minimum overlap height before a dragged item is adopted by a stack
    /// beneath the cursor.
    pub reparent_overlap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            grid_size: 10.0,
            column_top_margin: 60.0,
            stack_spacing: 30.0,
            io_spacing: 4.0,
            port_spacing: 10.0,
            port_top_margin: 40.0,
            default_column_width: 260.0,
            min_column_height: 600.0,
            component_width: 220.0,
            min_component_height: 80.0,
            port_size: 10.0,
            snap_radius: 20.0,
            connection_stub: 20.0,
            reparent_overlap: 30.0,
        }
    }
}

impl LayoutConfig {
    /// Sets the snapping grid size.
    pub fn with_grid_size(mut self, grid_size: f32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the spacing between stacked components.
    pub fn with_stack_spacing(mut self, spacing: f32) -> Self {
        self.stack_spacing = spacing;
        self
    }

    /// Sets the endpoint snap radius.
    pub fn with_snap_radius(mut self, radius: f32) -> Self {
        self.snap_radius = radius;
        self
    }
}
