//! The diagram scene: item arena, stacks, connections.
//!
//! [`Diagram`] owns every item and connection and enforces the structural
//! rules — stack admission policies, endpoint compatibility, non-overlap
//! layout. It is a plain value: no callbacks, no interior mutability, so the
//! command log can mutate it through small replayable edits and tests can
//! poke it directly.
//!
//! Positions are stored in the owner's local frame; [`Diagram::scene_pos`]
//! resolves an item's scene position by walking the owner chain. Since stacks
//! only ever translate their children, the resolution is a plain sum of
//! offsets.

use indexmap::IndexMap;
use log::{debug, warn};

use blueprint_core::design::ColumnContent;
use blueprint_core::geometry::{Bounds, Point, Size, segment_distance};

use crate::config::LayoutConfig;
use crate::connection::{Connection, ConnectionId, derive_route};
use crate::endpoint::{self, EndpointType, InterfaceEndpoint};
use crate::error::BlueprintError;
use crate::item::{
    ColumnData, ComponentInstance, Item, ItemBody, ItemId, ItemKind, StackStyle,
};
use crate::layout::{Axis, LayoutSlot, collision, stacked};

/// Side of a component a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    Left,
    Right,
}

/// Snapshot of an endpoint's type state, as recorded by the command log.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeState {
    pub ty: EndpointType,
    pub temporary: bool,
}

/// Where a detached item used to live, for exact reinsertion on undo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub stack: ItemId,
    pub index: usize,
    pub pos: Point,
}

/// Where a detached port used to live on its component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortPlacement {
    pub component: ItemId,
    pub side: PortSide,
    pub index: usize,
    pub pos: Point,
}

/// Layout parameters of one stack, derived from its style and content.
struct StackParams {
    axis: Axis,
    start: f32,
    spacing: f32,
    cross_center: Option<f32>,
    style: StackStyle,
}

/// The editable scene.
#[derive(Debug, Clone)]
pub struct Diagram {
    items: IndexMap<ItemId, Item>,
    connections: IndexMap<ConnectionId, Connection>,
    /// Columns in left-to-right order.
    columns: Vec<ItemId>,
    next_item: u32,
    next_connection: u32,
    config: LayoutConfig,
}

impl Diagram {
    pub fn new(config: LayoutConfig) -> Self {
        Diagram {
            items: IndexMap::new(),
            connections: IndexMap::new(),
            columns: Vec::new(),
            next_item: 0,
            next_connection: 0,
            config,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub(crate) fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter().map(|(id, c)| (*id, c))
    }

    pub fn columns(&self) -> &[ItemId] {
        &self.columns
    }

    /// Inserts an item into the arena without attaching it anywhere.
    ///
    /// Arena entries are never freed: a "deleted" item is merely detached, so
    /// ids held by the undo log stay resolvable.
    pub fn alloc_item(&mut self, item: Item) -> ItemId {
        let id = ItemId::new(self.next_item);
        self.next_item += 1;
        self.items.insert(id, item);
        id
    }

    // ------------------------------------------------------------------
    // Columns

    /// Appends a column at the right edge of the diagram.
    pub fn add_column(&mut self, name: impl Into<String>, content: ColumnContent) -> ItemId {
        let width = self.config.default_column_width;
        let height = self.config.min_column_height;
        let item = Item::new(name, ItemBody::Column(ColumnData::new(content, width)))
            .with_size(Size::new(width, height));
        let id = self.alloc_item(item);
        self.columns.push(id);
        self.layout_columns();
        debug!(column:% = id; "column added");
        id
    }

    /// Re-packs all columns left to right in list order.
    fn layout_columns(&mut self) {
        let mut slots = self.column_slots();
        stacked::update_positions(&mut slots, Axis::Horizontal, 0.0, 0.0, None);
        self.write_column_slots(slots);
    }

    /// Reflows columns around one being dragged; list order follows position.
    pub fn on_move_column(&mut self, column: ItemId, scene_pos: Point) {
        let Some(item) = self.items.get_mut(&column) else {
            return;
        };
        item.pos = Point::new(scene_pos.x, 0.0);

        let mut slots = self.column_slots();
        stacked::update_item_move(&mut slots, column, Axis::Horizontal, 0.0, 0.0, None);
        self.write_column_slots(slots);
    }

    /// Settles a dragged column into its slot.
    pub fn set_column_pos(&mut self, column: ItemId) {
        let mut slots = self.column_slots();
        stacked::set_item_pos(&mut slots, column, Axis::Horizontal, 0.0, 0.0, None);
        self.write_column_slots(slots);
    }

    fn column_slots(&self) -> Vec<LayoutSlot> {
        self.columns
            .iter()
            .filter_map(|id| self.items.get(id).map(|i| LayoutSlot::new(*id, i.pos, i.size)))
            .collect()
    }

    fn write_column_slots(&mut self, slots: Vec<LayoutSlot>) {
        self.columns = slots.iter().map(|s| s.id).collect();
        for slot in slots {
            if let Some(item) = self.items.get_mut(&slot.id) {
                item.pos = slot.pos;
            }
        }
    }

    /// Removes a column from the diagram, recording its slot. The arena
    /// entry survives for undo.
    pub fn detach_column(&mut self, column: ItemId) -> Option<usize> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.columns.remove(index);
        self.layout_columns();
        Some(index)
    }

    /// Reinstates a detached column at an exact slot.
    pub fn attach_column(&mut self, column: ItemId, index: usize) {
        if !self.items.contains_key(&column) {
            warn!(column:% = column; "attach of unknown column ignored");
            return;
        }
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        self.layout_columns();
    }

    /// Restores column list order from column positions, then re-packs.
    /// Used after undo replay, which rewrites positions but not order.
    pub(crate) fn sort_columns(&mut self) {
        let mut cols = self.columns.clone();
        cols.sort_by(|a, b| {
            let xa = self.items.get(a).map(|i| i.pos.x).unwrap_or(0.0);
            let xb = self.items.get(b).map(|i| i.pos.x).unwrap_or(0.0);
            xa.total_cmp(&xb)
        });
        self.columns = cols;
        self.layout_columns();
    }

    /// The column whose horizontal span contains `x`, if any.
    pub fn column_at(&self, x: f32) -> Option<ItemId> {
        self.columns.iter().copied().find(|id| {
            self.items
                .get(id)
                .is_some_and(|c| x >= c.pos.x && x < c.pos.x + c.size.width)
        })
    }

    /// The first column whose policy admits an item of `kind`.
    pub fn column_for(&self, kind: ItemKind) -> Option<ItemId> {
        self.columns.iter().copied().find(|id| {
            self.items
                .get(id)
                .and_then(|c| c.as_stack())
                .is_some_and(|s| s.admits(kind))
        })
    }

    // ------------------------------------------------------------------
    // Stacks

    /// Whether `stack` would admit an item of `kind`.
    pub fn is_item_allowed(&self, stack: ItemId, kind: ItemKind) -> bool {
        self.items
            .get(&stack)
            .and_then(|s| s.as_stack())
            .is_some_and(|s| s.admits(kind))
    }

    /// Attaches `item` to `stack`.
    ///
    /// With `load` set, the item keeps its stored position, is inserted in
    /// position order, and no sibling is repositioned; otherwise it is
    /// appended below the stack's current content.
    pub fn add_item(&mut self, stack: ItemId, item: ItemId, load: bool) -> Result<(), BlueprintError> {
        let kind = self
            .items
            .get(&item)
            .ok_or(BlueprintError::UnknownItem(item))?
            .kind();

        let stack_item = self.items.get(&stack).ok_or(BlueprintError::UnknownItem(stack))?;
        let Some(stack_data) = stack_item.as_stack() else {
            return Err(BlueprintError::UnknownItem(stack));
        };
        if !stack_data.admits(kind) {
            return Err(BlueprintError::DisallowedItem {
                item: self.items[&item].name.clone(),
                stack: stack_item.name.clone(),
            });
        }

        if load {
            let params = self.stack_params(stack);
            let pos = self.items[&item].pos;
            let main = params.as_ref().map_or(pos.y, |p| p.axis.main(pos));
            let children: Vec<ItemId> = self.items[&stack]
                .as_stack()
                .map(|s| s.children.clone())
                .unwrap_or_default();
            let index = children
                .iter()
                .position(|other| {
                    self.items.get(other).is_some_and(|o| {
                        params.as_ref().map_or(o.pos.y, |p| p.axis.main(o.pos)) > main
                    })
                })
                .unwrap_or(children.len());
            self.attach_item(item, Placement { stack, index, pos });
            self.grow_stack_geometry(stack);
        } else {
            let params = self.stack_params(stack);
            let index = self.items[&stack].as_stack().map_or(0, |s| s.children.len());
            let mut pos = self.items[&item].pos;
            if let Some(p) = &params
                && p.style == StackStyle::Stacked
            {
                // Append below the bottom; a fresh item still at the origin
                // would otherwise sort to the top of the stack.
                let bottom = self
                    .stack_slots(stack)
                    .iter()
                    .map(|s| p.axis.main(s.pos) + p.axis.extent(s.size) + p.spacing)
                    .fold(p.start, f32::max);
                pos = p.axis.with_main(pos, bottom);
                if let Some(center) = p.cross_center {
                    let size = self.items[&item].size;
                    pos = p.axis.with_cross(pos, center - p.axis.cross_extent(size) / 2.0);
                }
            }
            self.attach_item(item, Placement { stack, index, pos });
            if params.is_some_and(|p| p.style == StackStyle::Collision) {
                self.settle_item(item);
            }
            self.update_stack_geometry(stack);
        }
        Ok(())
    }

    /// Detaches an item from its owner, recording where it was.
    ///
    /// The arena entry survives; reattach with [`Diagram::attach_item`].
    pub fn detach_item(&mut self, item: ItemId) -> Option<Placement> {
        let owner = self.items.get(&item)?.owner?;
        let pos = self.items[&item].pos;

        let index = {
            let stack = self.items.get_mut(&owner)?.as_stack_mut()?;
            let index = stack.children.iter().position(|c| *c == item)?;
            stack.children.remove(index);
            index
        };
        if let Some(it) = self.items.get_mut(&item) {
            it.owner = None;
        }

        let params = self.stack_params(owner);
        if let Some(p) = params
            && p.style == StackStyle::Stacked
        {
            self.restack(owner);
        }
        self.update_stack_geometry(owner);
        Some(Placement { stack: owner, index, pos })
    }

    /// Reattaches a detached item at an exact slot, as recorded by
    /// [`Diagram::detach_item`]. Used by undo replay.
    pub fn attach_item(&mut self, item: ItemId, at: Placement) {
        let Some(it) = self.items.get_mut(&item) else {
            warn!(item:% = item; "attach of unknown item ignored");
            return;
        };
        it.owner = Some(at.stack);
        it.pos = at.pos;

        let Some(stack) = self.items.get_mut(&at.stack).and_then(|s| s.as_stack_mut()) else {
            warn!(stack:% = at.stack; "attach into non-stack ignored");
            return;
        };
        let index = at.index.min(stack.children.len());
        stack.children.insert(index, item);
    }

    fn stack_params(&self, stack: ItemId) -> Option<StackParams> {
        let item = self.items.get(&stack)?;
        match &item.body {
            ItemBody::Column(col) => Some(match col.content {
                ColumnContent::Components => StackParams {
                    axis: Axis::Vertical,
                    start: self.config.column_top_margin,
                    spacing: self.config.stack_spacing,
                    cross_center: Some(col.width / 2.0),
                    style: StackStyle::Stacked,
                },
                ColumnContent::Io => StackParams {
                    axis: Axis::Vertical,
                    start: self.config.column_top_margin,
                    spacing: self.config.io_spacing,
                    cross_center: Some(col.width / 2.0),
                    style: StackStyle::Collision,
                },
            }),
            ItemBody::Component(c) => c.mapping.as_ref().map(|_| StackParams {
                axis: Axis::Vertical,
                start: self.config.port_top_margin,
                spacing: self.config.stack_spacing,
                cross_center: Some(item.size.width / 2.0),
                style: StackStyle::Stacked,
            }),
            ItemBody::Endpoint(_) => None,
        }
    }

    fn stack_slots(&self, stack: ItemId) -> Vec<LayoutSlot> {
        self.items
            .get(&stack)
            .and_then(|s| s.as_stack())
            .map(|s| {
                s.children
                    .iter()
                    .filter_map(|id| {
                        self.items.get(id).map(|i| LayoutSlot::new(*id, i.pos, i.size))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn write_stack_slots(&mut self, stack: ItemId, slots: Vec<LayoutSlot>) {
        if let Some(data) = self.items.get_mut(&stack).and_then(|s| s.as_stack_mut()) {
            data.children = slots.iter().map(|s| s.id).collect();
        }
        let mut moved_endpoints = Vec::new();
        for slot in slots {
            if let Some(item) = self.items.get_mut(&slot.id) {
                if item.pos != slot.pos && item.kind() == ItemKind::Endpoint {
                    moved_endpoints.push(slot.id);
                }
                item.pos = slot.pos;
            }
        }
        for id in moved_endpoints {
            self.reroute_endpoint(id);
        }
    }

    /// Restores a stack's child order from child positions. Used after undo
    /// replay.
    pub(crate) fn sort_stack(&mut self, stack: ItemId) {
        let Some(params) = self.stack_params(stack) else {
            return;
        };
        let mut slots = self.stack_slots(stack);
        slots.sort_by(|a, b| params.axis.main(a.pos).total_cmp(&params.axis.main(b.pos)));
        self.write_stack_slots(stack, slots);
    }

    /// Restores a component's port list order from port positions.
    pub(crate) fn sort_ports(&mut self, component: ItemId) {
        for side in [PortSide::Left, PortSide::Right] {
            let mut slots = self.port_list_slots(component, side);
            slots.sort_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
            self.write_port_slots(component, side, slots);
        }
    }

    /// Packs a stacked stack in its current child order.
    pub(crate) fn restack(&mut self, stack: ItemId) {
        let Some(params) = self.stack_params(stack) else {
            return;
        };
        if params.style != StackStyle::Stacked {
            return;
        }
        let mut slots = self.stack_slots(stack);
        stacked::update_positions(
            &mut slots,
            params.axis,
            params.start,
            params.spacing,
            params.cross_center,
        );
        self.write_stack_slots(stack, slots);
    }

    /// Reflows a stack around `item` mid-drag. `item.pos` is the dragged
    /// position in the stack's local frame.
    pub fn on_move_item(&mut self, item: ItemId) {
        let Some(owner) = self.items.get(&item).and_then(|i| i.owner) else {
            return;
        };
        let Some(params) = self.stack_params(owner) else {
            return;
        };
        let mut slots = self.stack_slots(owner);
        match params.style {
            StackStyle::Stacked => stacked::update_item_move(
                &mut slots,
                item,
                params.axis,
                params.start,
                params.spacing,
                params.cross_center,
            ),
            StackStyle::Collision => collision::update_item_move(
                &mut slots,
                item,
                params.axis,
                params.start,
                params.spacing,
                params.cross_center,
            ),
        }
        self.write_stack_slots(owner, slots);
    }

    /// Settles a dragged item at drag end: snaps it into its slot (stacked)
    /// or to the grid at its dropped position (collision).
    pub fn settle_item(&mut self, item: ItemId) {
        let Some(owner) = self.items.get(&item).and_then(|i| i.owner) else {
            return;
        };
        let Some(params) = self.stack_params(owner) else {
            return;
        };
        let mut slots = self.stack_slots(owner);
        match params.style {
            StackStyle::Stacked => stacked::set_item_pos(
                &mut slots,
                item,
                params.axis,
                params.start,
                params.spacing,
                params.cross_center,
            ),
            StackStyle::Collision => {
                let main = slots
                    .iter()
                    .find(|s| s.id == item)
                    .map(|s| params.axis.main(s.pos))
                    .unwrap_or(params.start);
                let snapped = (main / self.config.grid_size).round() * self.config.grid_size;
                collision::set_item_pos(
                    &mut slots,
                    item,
                    snapped.max(params.start),
                    params.axis,
                    params.start,
                    params.spacing,
                    params.cross_center,
                );
            }
        }
        self.write_stack_slots(owner, slots);
        self.update_stack_geometry(owner);
    }

    /// Grows the stack owner to contain its children, re-packing each
    /// enclosing stack on the way up.
    pub(crate) fn update_stack_geometry(&mut self, stack: ItemId) {
        if let Some(owner) = self.fit_stack_size(stack) {
            self.restack(owner);
            self.update_stack_geometry(owner);
        }
    }

    /// Size propagation for load: owners grow to contain their children but
    /// nothing is re-packed, so stored positions stay where the design put
    /// them.
    pub(crate) fn grow_stack_geometry(&mut self, stack: ItemId) {
        if let Some(owner) = self.fit_stack_size(stack) {
            self.grow_stack_geometry(owner);
        }
    }

    /// Resizes `stack` to contain its children; returns the owner to
    /// propagate to when the resized stack is itself a stacked child.
    fn fit_stack_size(&mut self, stack: ItemId) -> Option<ItemId> {
        let params = self.stack_params(stack)?;
        let bottom = self
            .stack_slots(stack)
            .iter()
            .map(|s| params.axis.main(s.pos) + params.axis.extent(s.size))
            .fold(0.0f32, f32::max);

        let column_margin = self.config.column_top_margin;
        let spacing = self.config.stack_spacing;
        let min_height = self.config.min_component_height;
        let min_column = self.config.min_column_height;

        let mut propagate = None;
        if let Some(item) = self.items.get_mut(&stack) {
            match item.kind() {
                ItemKind::Column => {
                    item.size.height = (bottom + column_margin).max(min_column);
                }
                ItemKind::Component => {
                    item.size.height = (bottom + spacing).max(min_height);
                    propagate = item.owner;
                }
                ItemKind::Endpoint => {}
            }
        }
        propagate
    }

    // ------------------------------------------------------------------
    // Components and ports

    /// Creates a component instance item sized per configuration. The caller
    /// attaches it to a stack with [`Diagram::add_item`].
    pub fn create_component(
        &mut self,
        name: impl Into<String>,
        instance: ComponentInstance,
    ) -> ItemId {
        let size = Size::new(self.config.component_width, self.config.min_component_height);
        self.alloc_item(Item::new(name, ItemBody::Component(instance)).with_size(size))
    }

    /// A draft instance name not used by any component item on the diagram.
    pub fn unique_instance_name(&self, base: &str) -> String {
        let taken: Vec<&str> = self
            .items
            .values()
            .filter(|i| i.kind() == ItemKind::Component)
            .map(|i| i.name.as_str())
            .collect();
        unique_name(base, &taken)
    }

    /// A port name not used by any port of `component`.
    pub fn unique_port_name(&self, component: ItemId, base: &str) -> String {
        let taken: Vec<&str> = self
            .items
            .get(&component)
            .and_then(|i| i.as_component())
            .map(|c| {
                c.left_ports
                    .iter()
                    .chain(&c.right_ports)
                    .filter_map(|id| self.items.get(id).map(|p| p.name.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        unique_name(base, &taken)
    }

    /// Adds a port to a component at a local position; the side follows the
    /// drop point. Returns the new port's id.
    pub fn add_port(
        &mut self,
        component: ItemId,
        endpoint: InterfaceEndpoint,
        name: impl Into<String>,
        local_pos: Point,
    ) -> Result<ItemId, BlueprintError> {
        let id = self.insert_port(component, endpoint, name, local_pos, false)?;
        self.settle_port(id);
        self.update_component_size(component);
        Ok(id)
    }

    /// Adds a port carrying a trusted stored position. The port joins the
    /// side list in position order and enclosing stacks only grow, so items
    /// loaded earlier never move.
    pub fn load_port(
        &mut self,
        component: ItemId,
        endpoint: InterfaceEndpoint,
        name: impl Into<String>,
        local_pos: Point,
    ) -> Result<ItemId, BlueprintError> {
        let id = self.insert_port(component, endpoint, name, local_pos, true)?;
        if let Some(owner) = self.fit_component_size(component) {
            self.grow_stack_geometry(owner);
        }
        Ok(id)
    }

    fn insert_port(
        &mut self,
        component: ItemId,
        endpoint: InterfaceEndpoint,
        name: impl Into<String>,
        local_pos: Point,
        ordered: bool,
    ) -> Result<ItemId, BlueprintError> {
        let width = self
            .items
            .get(&component)
            .ok_or(BlueprintError::UnknownItem(component))?
            .size
            .width;
        let side = if local_pos.x < width / 2.0 {
            PortSide::Left
        } else {
            PortSide::Right
        };

        let mut endpoint = endpoint;
        endpoint.direction = match side {
            PortSide::Left => Point::new(-1.0, 0.0),
            PortSide::Right => Point::new(1.0, 0.0),
        };

        let edge_x = match side {
            PortSide::Left => 0.0,
            PortSide::Right => width,
        };
        let pos = Point::new(edge_x, local_pos.y.max(self.config.port_top_margin));
        let size = Size::new(self.config.port_size, self.config.port_size);
        let item = Item::new(name, ItemBody::Endpoint(endpoint))
            .with_pos(pos)
            .with_size(size);
        let id = self.alloc_item(item);

        if let Some(it) = self.items.get_mut(&id) {
            it.owner = Some(component);
        }

        let list: Vec<ItemId> = self
            .items
            .get(&component)
            .and_then(|i| i.as_component())
            .map(|c| match side {
                PortSide::Left => c.left_ports.clone(),
                PortSide::Right => c.right_ports.clone(),
            })
            .unwrap_or_default();
        let index = if ordered {
            list.iter()
                .position(|other| self.items.get(other).is_some_and(|o| o.pos.y > pos.y))
                .unwrap_or(list.len())
        } else {
            list.len()
        };
        if let Some(c) = self.items.get_mut(&component).and_then(|i| i.as_component_mut()) {
            let list = match side {
                PortSide::Left => &mut c.left_ports,
                PortSide::Right => &mut c.right_ports,
            };
            let index = index.min(list.len());
            list.insert(index, id);
        }
        Ok(id)
    }

    /// Current slot of a stack-attached item, as a [`Placement`].
    pub fn placement_of(&self, item: ItemId) -> Option<Placement> {
        let it = self.items.get(&item)?;
        let stack = it.owner?;
        let index = self
            .items
            .get(&stack)?
            .as_stack()?
            .children
            .iter()
            .position(|c| *c == item)?;
        Some(Placement {
            stack,
            index,
            pos: it.pos,
        })
    }

    /// Current slot of a port on its component.
    pub fn port_placement(&self, port: ItemId) -> Option<PortPlacement> {
        let it = self.items.get(&port)?;
        let component = it.owner?;
        let side = self.port_side(port)?;
        let c = self.items.get(&component)?.as_component()?;
        let list = match side {
            PortSide::Left => &c.left_ports,
            PortSide::Right => &c.right_ports,
        };
        let index = list.iter().position(|p| *p == port)?;
        Some(PortPlacement {
            component,
            side,
            index,
            pos: it.pos,
        })
    }

    /// Detaches a port from its component, recording where it was.
    pub fn detach_port(&mut self, port: ItemId) -> Option<PortPlacement> {
        let at = self.port_placement(port)?;
        if let Some(c) = self
            .items
            .get_mut(&at.component)
            .and_then(|i| i.as_component_mut())
        {
            c.left_ports.retain(|p| *p != port);
            c.right_ports.retain(|p| *p != port);
        }
        if let Some(it) = self.items.get_mut(&port) {
            it.owner = None;
        }
        self.update_component_size(at.component);
        Some(at)
    }

    /// Reattaches a detached port at an exact slot.
    pub fn attach_port(&mut self, port: ItemId, at: PortPlacement) {
        let direction = match at.side {
            PortSide::Left => Point::new(-1.0, 0.0),
            PortSide::Right => Point::new(1.0, 0.0),
        };
        if let Some(it) = self.items.get_mut(&port) {
            it.owner = Some(at.component);
            it.pos = at.pos;
            if let Some(ep) = it.as_endpoint_mut() {
                ep.direction = direction;
            }
        }
        if let Some(c) = self
            .items
            .get_mut(&at.component)
            .and_then(|i| i.as_component_mut())
        {
            let list = match at.side {
                PortSide::Left => &mut c.left_ports,
                PortSide::Right => &mut c.right_ports,
            };
            let index = at.index.min(list.len());
            list.insert(index, port);
        }
        self.update_component_size(at.component);
    }

    /// Moves a port to the other side of its component mid-drag, keeping its
    /// vertical position.
    pub fn switch_port_side(&mut self, port: ItemId) {
        let Some(at) = self.detach_port(port) else {
            return;
        };
        let (side, x) = match at.side {
            PortSide::Left => (
                PortSide::Right,
                self.items.get(&at.component).map(|c| c.size.width).unwrap_or(0.0),
            ),
            PortSide::Right => (PortSide::Left, 0.0),
        };
        let list_len = self
            .items
            .get(&at.component)
            .and_then(|i| i.as_component())
            .map(|c| match side {
                PortSide::Left => c.left_ports.len(),
                PortSide::Right => c.right_ports.len(),
            })
            .unwrap_or(0);
        self.attach_port(
            port,
            PortPlacement {
                component: at.component,
                side,
                index: list_len,
                pos: Point::new(x, at.pos.y),
            },
        );
    }

    /// An interface name not used by any item stacked on `column`.
    pub fn unique_interface_name(&self, column: ItemId, base: &str) -> String {
        let taken: Vec<&str> = self
            .items
            .get(&column)
            .and_then(|i| i.as_stack())
            .map(|s| {
                s.children
                    .iter()
                    .filter_map(|id| self.items.get(id).map(|c| c.name.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        unique_name(base, &taken)
    }

    /// The side a port sits on, from its component's port lists.
    pub fn port_side(&self, port: ItemId) -> Option<PortSide> {
        let owner = self.items.get(&port)?.owner?;
        let c = self.items.get(&owner)?.as_component()?;
        if c.left_ports.contains(&port) {
            Some(PortSide::Left)
        } else if c.right_ports.contains(&port) {
            Some(PortSide::Right)
        } else {
            None
        }
    }

    fn port_list_slots(&self, component: ItemId, side: PortSide) -> Vec<LayoutSlot> {
        self.items
            .get(&component)
            .and_then(|i| i.as_component())
            .map(|c| match side {
                PortSide::Left => &c.left_ports,
                PortSide::Right => &c.right_ports,
            })
            .map(|list| {
                list.iter()
                    .filter_map(|id| {
                        self.items.get(id).map(|i| LayoutSlot::new(*id, i.pos, i.size))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn write_port_slots(&mut self, component: ItemId, side: PortSide, slots: Vec<LayoutSlot>) {
        if let Some(c) = self.items.get_mut(&component).and_then(|i| i.as_component_mut()) {
            let list = match side {
                PortSide::Left => &mut c.left_ports,
                PortSide::Right => &mut c.right_ports,
            };
            *list = slots.iter().map(|s| s.id).collect();
        }
        let ids: Vec<ItemId> = slots.iter().map(|s| s.id).collect();
        for slot in slots {
            if let Some(item) = self.items.get_mut(&slot.id) {
                item.pos = slot.pos;
            }
        }
        for id in ids {
            self.reroute_endpoint(id);
        }
    }

    /// Reflows a component side around a dragged port.
    pub fn on_move_port(&mut self, port: ItemId) {
        let Some(owner) = self.items.get(&port).and_then(|i| i.owner) else {
            return;
        };
        let Some(side) = self.port_side(port) else {
            return;
        };
        let mut slots = self.port_list_slots(owner, side);
        collision::update_item_move(
            &mut slots,
            port,
            Axis::Vertical,
            self.config.port_top_margin,
            self.config.port_spacing,
            None,
        );
        self.write_port_slots(owner, side, slots);
    }

    /// Settles a dragged port and grows the component to fit.
    pub fn settle_port(&mut self, port: ItemId) {
        let Some(owner) = self.items.get(&port).and_then(|i| i.owner) else {
            return;
        };
        let Some(side) = self.port_side(port) else {
            return;
        };
        let y = self.items.get(&port).map(|i| i.pos.y).unwrap_or_default();
        let snapped = (y / self.config.grid_size).round() * self.config.grid_size;

        let mut slots = self.port_list_slots(owner, side);
        collision::set_item_pos(
            &mut slots,
            port,
            snapped.max(self.config.port_top_margin),
            Axis::Vertical,
            self.config.port_top_margin,
            self.config.port_spacing,
            None,
        );
        self.write_port_slots(owner, side, slots);
        self.update_component_size(owner);
    }

    /// Grows a component to contain its lowest port, then propagates the
    /// size change up through its stack.
    pub fn update_component_size(&mut self, component: ItemId) {
        if let Some(owner) = self.fit_component_size(component) {
            self.restack(owner);
            self.update_stack_geometry(owner);
        }
    }

    /// Resizes a component to contain its ports; returns the owner to
    /// propagate to when the height changed.
    fn fit_component_size(&mut self, component: ItemId) -> Option<ItemId> {
        let c = self.items.get(&component).and_then(|i| i.as_component())?;
        let lowest = c
            .left_ports
            .iter()
            .chain(&c.right_ports)
            .filter_map(|id| self.items.get(id))
            .map(|p| p.pos.y + p.size.height / 2.0)
            .fold(0.0f32, f32::max);

        let height = (lowest + self.config.port_spacing).max(self.config.min_component_height);
        let mut propagate = None;
        if let Some(item) = self.items.get_mut(&component)
            && item.size.height != height
        {
            item.size.height = height;
            propagate = item.owner;
        }
        propagate
    }

    // ------------------------------------------------------------------
    // Coordinates and hit testing

    /// Scene position of an item: the sum of local positions up the owner
    /// chain. Stacks carry translation-only transforms, nothing else.
    pub fn scene_pos(&self, id: ItemId) -> Point {
        let mut pos = Point::default();
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let Some(item) = self.items.get(&cur) else {
                break;
            };
            pos = pos.add(item.pos);
            cursor = item.owner;
        }
        pos
    }

    /// Maps a scene point into `stack`'s local frame.
    pub fn map_from_scene(&self, stack: ItemId, scene: Point) -> Point {
        scene.sub(self.scene_pos(stack))
    }

    /// Scene bounds of an item. Endpoint glyphs are centered on their
    /// position; everything else hangs from its top-left corner.
    pub fn scene_bounds(&self, id: ItemId) -> Option<Bounds> {
        let item = self.items.get(&id)?;
        let pos = self.scene_pos(id);
        Some(match item.kind() {
            ItemKind::Endpoint => Bounds::new(
                Point::new(pos.x - item.size.width / 2.0, pos.y - item.size.height / 2.0),
                item.size,
            ),
            _ => Bounds::new(pos, item.size),
        })
    }

    /// The topmost item under a scene point. Endpoints win over components,
    /// components over columns, and a mapped child over its host.
    pub fn item_at(&self, scene: Point) -> Option<ItemId> {
        let hit = |kind: ItemKind| {
            self.items
                .keys()
                .copied()
                .filter(|id| {
                    self.items[id].kind() == kind
                        && self.is_attached(*id)
                        && self.scene_bounds(*id).is_some_and(|b| b.contains(scene))
                })
                .max_by_key(|id| self.nesting_depth(*id))
        };
        hit(ItemKind::Endpoint)
            .or_else(|| hit(ItemKind::Component))
            .or_else(|| hit(ItemKind::Column))
    }

    fn nesting_depth(&self, id: ItemId) -> usize {
        let mut depth = 0;
        let mut cursor = self.items.get(&id).and_then(|i| i.owner);
        while let Some(cur) = cursor {
            depth += 1;
            cursor = self.items.get(&cur).and_then(|i| i.owner);
        }
        depth
    }

    /// The nearest attached endpoint within `radius` of a scene point.
    pub fn endpoint_near(&self, scene: Point, radius: f32) -> Option<ItemId> {
        self.items
            .iter()
            .filter(|(id, item)| item.kind() == ItemKind::Endpoint && self.is_attached(**id))
            .map(|(id, _)| (*id, self.scene_pos(*id).distance_to(scene)))
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// The nearest connection whose route passes within `radius` of a scene
    /// point.
    pub fn connection_near(&self, scene: Point, radius: f32) -> Option<ConnectionId> {
        self.connections
            .iter()
            .filter_map(|(id, c)| {
                c.route
                    .windows(2)
                    .map(|seg| segment_distance(scene, seg[0], seg[1]))
                    .min_by(f32::total_cmp)
                    .map(|d| (*id, d))
            })
            .filter(|(_, d)| *d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// True when the item is reachable from a column (or is a column): it is
    /// on the diagram, not a detached arena resident awaiting undo.
    pub fn is_attached(&self, id: ItemId) -> bool {
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let Some(item) = self.items.get(&cur) else {
                return false;
            };
            match item.owner {
                Some(owner) => cursor = Some(owner),
                None => return self.columns.contains(&cur),
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Connections

    /// Whether a connection from `a` to `b` may finalize.
    ///
    /// Checks identity rules first (distinct endpoints, distinct components,
    /// at most one hierarchical end), then type compatibility.
    pub fn can_connect(&self, a: ItemId, b: ItemId) -> bool {
        if a == b {
            return false;
        }
        let (Some(ia), Some(ib)) = (self.items.get(&a), self.items.get(&b)) else {
            return false;
        };
        let (Some(ea), Some(eb)) = (ia.as_endpoint(), ib.as_endpoint()) else {
            return false;
        };
        if ia.owner.is_some() && ia.owner == ib.owner {
            return false;
        }
        if ea.hierarchical && eb.hierarchical {
            return false;
        }
        endpoint::compatible(ea, eb)
    }

    /// Finalizes a connection between two compatible endpoints.
    ///
    /// Undefined ends adopt a definition derived from their peer; the adopted
    /// type stays temporary, so it reverts if the connection is undone.
    pub fn connect_ends(&mut self, a: ItemId, b: ItemId) -> Option<ConnectionId> {
        if !self.can_connect(a, b) {
            return None;
        }
        let name = format!(
            "{}_to_{}",
            self.items.get(&a).map(|i| i.name.as_str()).unwrap_or(""),
            self.items.get(&b).map(|i| i.name.as_str()).unwrap_or(""),
        );
        let id = ConnectionId::new(self.next_connection);
        self.next_connection += 1;

        let mut conn = Connection::new(name, a, b);
        conn.route = self.route_between(a, b);
        self.connections.insert(id, conn);

        for end in [a, b] {
            if let Some(ep) = self.items.get_mut(&end).and_then(|i| i.as_endpoint_mut()) {
                ep.connections.push(id);
            }
        }
        self.adopt_types(a, b);
        self.adopt_types(b, a);
        debug!(connection:% = id; "connection finalized");
        Some(id)
    }

    /// Makes an undefined endpoint adopt the definition its typed peer
    /// implies.
    fn adopt_types(&mut self, end: ItemId, peer: ItemId) {
        let end_hier = self
            .items
            .get(&end)
            .and_then(|i| i.as_endpoint())
            .is_some_and(|e| e.hierarchical);
        let Some(peer_ep) = self.items.get(&peer).and_then(|i| i.as_endpoint()) else {
            return;
        };
        let derived = peer_ep.ty.derived_for_peer(peer_ep.hierarchical || end_hier);
        let Some(ep) = self.items.get_mut(&end).and_then(|i| i.as_endpoint_mut()) else {
            return;
        };
        if ep.ty.is_undefined() && !derived.is_undefined() {
            ep.ty = derived;
        }
    }

    /// Current snapshot of an endpoint's type state.
    pub fn endpoint_state(&self, endpoint: ItemId) -> Option<TypeState> {
        self.items.get(&endpoint).and_then(|i| i.as_endpoint()).map(|e| TypeState {
            ty: e.ty.clone(),
            temporary: e.temporary,
        })
    }

    /// Overwrites an endpoint's type state; used by undo replay.
    pub fn force_endpoint_state(&mut self, endpoint: ItemId, state: TypeState) {
        let Some(ep) = self.items.get_mut(&endpoint).and_then(|i| i.as_endpoint_mut()) else {
            warn!(endpoint:% = endpoint; "type restore on unknown endpoint ignored");
            return;
        };
        ep.ty = state.ty;
        ep.temporary = state.temporary;
    }

    /// Installs an explicit type on an endpoint and renegotiates its
    /// connections.
    ///
    /// Every connection is logically detached, the new definition locked in,
    /// then each connection re-validated: still-compatible peers re-adopt
    /// where undefined, incompatible connections are dropped. Returns the
    /// dropped connection ids.
    pub fn set_endpoint_type(&mut self, endpoint: ItemId, ty: EndpointType) -> Vec<ConnectionId> {
        let Some(ep) = self.items.get(&endpoint).and_then(|i| i.as_endpoint()) else {
            return Vec::new();
        };
        let conn_ids = ep.connections.clone();

        // Revert temporary peers so they renegotiate against the new type.
        for id in &conn_ids {
            let Some(peer) = self.connections.get(id).and_then(|c| c.other(endpoint)) else {
                continue;
            };
            if let Some(peer_ep) = self.items.get_mut(&peer).and_then(|i| i.as_endpoint_mut())
                && peer_ep.temporary
                && peer_ep.connections.len() == 1
            {
                peer_ep.ty = EndpointType::Undefined;
            }
        }

        if let Some(ep) = self.items.get_mut(&endpoint).and_then(|i| i.as_endpoint_mut()) {
            let undefined = ty.is_undefined();
            ep.ty = ty;
            ep.temporary = undefined;
        }

        let mut dropped = Vec::new();
        for id in conn_ids {
            let Some(peer) = self.connections.get(&id).and_then(|c| c.other(endpoint)) else {
                continue;
            };
            let compatible = {
                let (Some(a), Some(b)) = (
                    self.items.get(&endpoint).and_then(|i| i.as_endpoint()),
                    self.items.get(&peer).and_then(|i| i.as_endpoint()),
                ) else {
                    continue;
                };
                endpoint::compatible_ignoring_saturation(a, b)
            };
            if compatible {
                self.adopt_types(peer, endpoint);
            } else {
                self.remove_connection(id);
                dropped.push(id);
            }
        }
        dropped
    }

    /// Removes a connection, reverting temporary ends that lost their last
    /// link. Returns the removed record for the undo log.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.shift_remove(&id)?;
        for end in [conn.endpoints.0, conn.endpoints.1] {
            if let Some(ep) = self.items.get_mut(&end).and_then(|i| i.as_endpoint_mut()) {
                ep.connections.retain(|c| *c != id);
                ep.on_disconnect();
            }
        }
        Some(conn)
    }

    /// Removes a connection without touching endpoint types; used by undo
    /// replay, which restores types through its own edits.
    pub fn remove_connection_raw(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.shift_remove(&id)?;
        for end in [conn.endpoints.0, conn.endpoints.1] {
            if let Some(ep) = self.items.get_mut(&end).and_then(|i| i.as_endpoint_mut()) {
                ep.connections.retain(|c| *c != id);
            }
        }
        Some(conn)
    }

    /// Reinstates a connection under its original id; used by undo replay.
    /// Endpoint types are restored separately by the log's type edits.
    pub fn insert_connection_raw(&mut self, id: ConnectionId, conn: Connection) {
        for end in [conn.endpoints.0, conn.endpoints.1] {
            if let Some(ep) = self.items.get_mut(&end).and_then(|i| i.as_endpoint_mut()) {
                ep.connections.push(id);
            }
        }
        self.next_connection = self.next_connection.max(id.raw() + 1);
        self.connections.insert(id, conn);
    }

    /// Connections attached to any endpoint of `item` (the item itself, its
    /// ports, or its mapped children's ports).
    pub fn connections_of(&self, item: ItemId) -> Vec<ConnectionId> {
        let mut endpoints = Vec::new();
        self.collect_endpoints(item, &mut endpoints);
        self.connections
            .iter()
            .filter(|(_, c)| endpoints.contains(&c.endpoints.0) || endpoints.contains(&c.endpoints.1))
            .map(|(id, _)| *id)
            .collect()
    }

    fn collect_endpoints(&self, item: ItemId, out: &mut Vec<ItemId>) {
        let Some(it) = self.items.get(&item) else {
            return;
        };
        match &it.body {
            ItemBody::Endpoint(_) => out.push(item),
            ItemBody::Component(c) => {
                out.extend(c.left_ports.iter().chain(&c.right_ports));
                if let Some(m) = &c.mapping {
                    for child in &m.children {
                        self.collect_endpoints(*child, out);
                    }
                }
            }
            ItemBody::Column(c) => {
                for child in &c.stack.children {
                    self.collect_endpoints(*child, out);
                }
            }
        }
    }

    /// Default orthogonal route between two endpoints' scene positions.
    pub fn route_between(&self, a: ItemId, b: ItemId) -> Vec<Point> {
        let dir = |id: ItemId| {
            self.items
                .get(&id)
                .and_then(|i| i.as_endpoint())
                .map(|e| e.direction)
                .unwrap_or(Point::new(1.0, 0.0))
        };
        derive_route(
            self.scene_pos(a),
            dir(a),
            self.scene_pos(b),
            dir(b),
            self.config.connection_stub,
        )
    }

    /// Re-derives the routes of every connection touching `endpoint`.
    pub fn reroute_endpoint(&mut self, endpoint: ItemId) {
        let ids: Vec<ConnectionId> = self
            .items
            .get(&endpoint)
            .and_then(|i| i.as_endpoint())
            .map(|e| e.connections.clone())
            .unwrap_or_default();
        for id in ids {
            if let Some((a, b)) = self.connections.get(&id).map(|c| c.endpoints) {
                let route = self.route_between(a, b);
                if let Some(conn) = self.connections.get_mut(&id) {
                    conn.route = route;
                }
            }
        }
    }

    /// Re-derives routes for every connection touching `item` or anything it
    /// contains. Called after a drag moves a component or column.
    pub fn reroute_item(&mut self, item: ItemId) {
        let mut endpoints = Vec::new();
        self.collect_endpoints(item, &mut endpoints);
        for ep in endpoints {
            self.reroute_endpoint(ep);
        }
    }
}

/// Picks `base`, or `base_N` for the smallest `N >= 1` not in `taken`.
fn unique_name(base: &str, taken: &[&str]) -> String {
    if !taken.contains(&base) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.iter().any(|t| **t == candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{ServiceInterface, ServiceRole};

    fn diagram_with_columns() -> (Diagram, ItemId, ItemId) {
        let mut d = Diagram::new(LayoutConfig::default());
        let hw = d.add_column("HW", ColumnContent::Components);
        let io = d.add_column("IO", ColumnContent::Io);
        (d, hw, io)
    }

    fn add_component(d: &mut Diagram, column: ItemId, name: &str) -> ItemId {
        let id = d.create_component(name, ComponentInstance::draft());
        d.add_item(column, id, false).unwrap();
        id
    }

    #[test]
    fn columns_pack_left_to_right() {
        let (d, hw, io) = diagram_with_columns();
        assert_eq!(d.item(hw).unwrap().pos.x, 0.0);
        assert_eq!(d.item(io).unwrap().pos.x, 260.0);
    }

    #[test]
    fn components_stack_below_the_column_margin() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");

        assert_eq!(d.item(a).unwrap().pos.y, 60.0);
        assert_eq!(d.item(b).unwrap().pos.y, 170.0);
        // Centered in the column.
        assert_eq!(d.item(a).unwrap().pos.x, 20.0);
    }

    #[test]
    fn added_items_append_in_order() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");
        let c = add_component(&mut d, hw, "c");

        let children = d.item(hw).unwrap().as_stack().unwrap().children.clone();
        assert_eq!(children, vec![a, b, c]);
        assert!(d.item(a).unwrap().pos.y < d.item(b).unwrap().pos.y);
        assert!(d.item(b).unwrap().pos.y < d.item(c).unwrap().pos.y);
    }

    #[test]
    fn new_columns_take_the_configured_minimum_height() {
        let (d, hw, _) = diagram_with_columns();
        assert_eq!(d.item(hw).unwrap().size.height, d.config().min_column_height);
    }

    #[test]
    fn load_attach_keeps_stored_sibling_positions() {
        let (mut d, hw, _) = diagram_with_columns();

        let host = d.create_component("host", ComponentInstance::draft().with_mapping());
        if let Some(i) = d.item_mut(host) {
            i.pos = Point::new(20.0, 60.0);
        }
        d.add_item(hw, host, true).unwrap();
        let below = d.create_component("below", ComponentInstance::draft());
        if let Some(i) = d.item_mut(below) {
            i.pos = Point::new(20.0, 200.0);
        }
        d.add_item(hw, below, true).unwrap();

        // A mapped child grows the host; the stored sibling stays put.
        let sw = d.create_component("sw", ComponentInstance::draft());
        if let Some(i) = d.item_mut(sw) {
            i.pos = Point::new(0.0, 40.0);
        }
        d.add_item(host, sw, true).unwrap();

        assert!(d.item(host).unwrap().size.height > d.config().min_component_height);
        assert_eq!(d.item(below).unwrap().pos.y, 200.0);
    }

    #[test]
    fn loaded_port_keeps_stored_sibling_positions() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = d.create_component("a", ComponentInstance::draft());
        if let Some(i) = d.item_mut(a) {
            i.pos = Point::new(20.0, 60.0);
        }
        d.add_item(hw, a, true).unwrap();
        let below = d.create_component("below", ComponentInstance::draft());
        if let Some(i) = d.item_mut(below) {
            i.pos = Point::new(20.0, 300.0);
        }
        d.add_item(hw, below, true).unwrap();

        // A deep port grows the component; the stored sibling stays put.
        d.load_port(
            a,
            InterfaceEndpoint::undefined(false, Point::default()),
            "deep",
            Point::new(0.0, 150.0),
        )
        .unwrap();

        assert!(d.item(a).unwrap().size.height > d.config().min_component_height);
        assert_eq!(d.item(below).unwrap().pos.y, 300.0);
    }

    #[test]
    fn io_column_rejects_components() {
        let (mut d, _, io) = diagram_with_columns();
        let c = d.create_component("a", ComponentInstance::draft());
        let err = d.add_item(io, c, false).unwrap_err();
        assert!(matches!(err, BlueprintError::DisallowedItem { .. }));
    }

    #[test]
    fn detach_records_slot_and_attach_restores_it() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");

        let place = d.detach_item(a).unwrap();
        assert_eq!(place.stack, hw);
        assert_eq!(place.index, 0);
        assert!(!d.is_attached(a));
        // b restacked to the top.
        assert_eq!(d.item(b).unwrap().pos.y, 60.0);

        d.attach_item(a, place);
        d.restack(hw);
        assert_eq!(d.item(a).unwrap().pos.y, 60.0);
        assert_eq!(d.item(b).unwrap().pos.y, 170.0);
    }

    #[test]
    fn scene_pos_sums_the_owner_chain() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let port = d
            .add_port(
                a,
                InterfaceEndpoint::undefined(false, Point::default()),
                "p",
                Point::new(220.0, 50.0),
            )
            .unwrap();

        let scene = d.scene_pos(port);
        let comp = d.item(a).unwrap();
        assert_eq!(scene.x, comp.pos.x + 220.0);
        assert_eq!(scene.y, comp.pos.y + 50.0);
    }

    #[test]
    fn port_side_follows_drop_point() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let left = d
            .add_port(
                a,
                InterfaceEndpoint::undefined(false, Point::default()),
                "l",
                Point::new(10.0, 50.0),
            )
            .unwrap();
        let right = d
            .add_port(
                a,
                InterfaceEndpoint::undefined(false, Point::default()),
                "r",
                Point::new(210.0, 50.0),
            )
            .unwrap();

        assert_eq!(d.port_side(left), Some(PortSide::Left));
        assert_eq!(d.port_side(right), Some(PortSide::Right));
        assert_eq!(d.item(left).unwrap().pos.x, 0.0);
        assert_eq!(d.item(right).unwrap().pos.x, 220.0);
        // Direction vectors point away from the component.
        assert_eq!(d.item(left).unwrap().as_endpoint().unwrap().direction.x, -1.0);
        assert_eq!(d.item(right).unwrap().as_endpoint().unwrap().direction.x, 1.0);
    }

    #[test]
    fn component_grows_to_contain_its_ports() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let before = d.item(a).unwrap().size.height;

        d.add_port(
            a,
            InterfaceEndpoint::undefined(false, Point::default()),
            "low",
            Point::new(0.0, 300.0),
        )
        .unwrap();

        assert!(d.item(a).unwrap().size.height > before);
    }

    #[test]
    fn unique_names_get_numeric_suffixes() {
        let (mut d, hw, _) = diagram_with_columns();
        add_component(&mut d, hw, "instance");
        add_component(&mut d, hw, "instance_1");

        assert_eq!(d.unique_instance_name("instance"), "instance_2");
        assert_eq!(d.unique_instance_name("other"), "other");
    }

    #[test]
    fn connect_adopts_type_on_undefined_end() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");
        let pa = d
            .add_port(
                a,
                InterfaceEndpoint::typed(
                    EndpointType::Service(ServiceInterface {
                        service_type: None,
                        role: ServiceRole::Provider,
                    }),
                    false,
                    Point::default(),
                ),
                "svc",
                Point::new(220.0, 50.0),
            )
            .unwrap();
        let pb = d
            .add_port(
                b,
                InterfaceEndpoint::undefined(false, Point::default()),
                "draft",
                Point::new(0.0, 50.0),
            )
            .unwrap();

        let id = d.connect_ends(pa, pb).unwrap();
        let adopted = d.item(pb).unwrap().as_endpoint().unwrap();
        assert_eq!(
            adopted.ty.as_service().unwrap().role,
            ServiceRole::Requester
        );
        assert!(adopted.temporary);

        // Removing the connection reverts the adopted type.
        d.remove_connection(id).unwrap();
        assert!(d.item(pb).unwrap().as_endpoint().unwrap().ty.is_undefined());
    }

    #[test]
    fn same_component_endpoints_cannot_connect() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let p1 = d
            .add_port(a, InterfaceEndpoint::undefined(false, Point::default()), "p1", Point::new(0.0, 50.0))
            .unwrap();
        let p2 = d
            .add_port(a, InterfaceEndpoint::undefined(false, Point::default()), "p2", Point::new(220.0, 50.0))
            .unwrap();

        assert!(!d.can_connect(p1, p2));
        assert!(!d.can_connect(p1, p1));
    }

    #[test]
    fn routes_follow_moved_endpoints() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");
        let pa = d
            .add_port(a, InterfaceEndpoint::undefined(false, Point::default()), "pa", Point::new(220.0, 50.0))
            .unwrap();
        let pb = d
            .add_port(b, InterfaceEndpoint::undefined(false, Point::default()), "pb", Point::new(0.0, 50.0))
            .unwrap();
        let id = d.connect_ends(pa, pb).unwrap();
        let before = d.connection(id).unwrap().route.clone();

        if let Some(p) = d.item_mut(pb) {
            p.pos.y = 120.0;
        }
        d.settle_port(pb);

        let after = &d.connection(id).unwrap().route;
        assert_ne!(&before, after);
        assert_eq!(after.first().copied(), Some(d.scene_pos(pa)));
        assert_eq!(after.last().copied(), Some(d.scene_pos(pb)));
    }

    #[test]
    fn item_at_prefers_endpoints_over_their_component() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let port = d
            .add_port(a, InterfaceEndpoint::undefined(false, Point::default()), "p", Point::new(0.0, 50.0))
            .unwrap();

        let at_port = d.scene_pos(port);
        assert_eq!(d.item_at(at_port), Some(port));

        let inside = d.scene_pos(a).add(Point::new(100.0, 30.0));
        assert_eq!(d.item_at(inside), Some(a));
    }

    #[test]
    fn retyping_drops_incompatible_connections() {
        let (mut d, hw, _) = diagram_with_columns();
        let a = add_component(&mut d, hw, "a");
        let b = add_component(&mut d, hw, "b");
        let pa = d
            .add_port(a, InterfaceEndpoint::undefined(false, Point::default()), "pa", Point::new(220.0, 50.0))
            .unwrap();
        let pb = d
            .add_port(
                b,
                InterfaceEndpoint::typed(
                    EndpointType::Service(ServiceInterface {
                        service_type: None,
                        role: ServiceRole::Provider,
                    }),
                    false,
                    Point::default(),
                ),
                "pb",
                Point::new(0.0, 50.0),
            )
            .unwrap();
        let id = d.connect_ends(pa, pb).unwrap();

        // Retype the adopted end to clash with the provider peer.
        let dropped = d.set_endpoint_type(
            pa,
            EndpointType::Service(ServiceInterface {
                service_type: None,
                role: ServiceRole::Provider,
            }),
        );
        assert_eq!(dropped, vec![id]);
        assert!(d.connection(id).is_none());
    }
}
