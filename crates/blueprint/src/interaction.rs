//! Modal pointer interaction.
//!
//! [`Interaction`] turns a stream of pointer presses, moves and releases into
//! diagram mutations, according to the active [`Mode`]:
//!
//! - **Select**: press picks an item or connection; dragging moves items
//!   through their stack's layout, switching stacks (and component sides, for
//!   ports) when the drop point calls for it.
//! - **Connect**: a first press anchors a pending connection and highlights
//!   every compatible endpoint; a second press on a compatible endpoint
//!   finalizes it, anywhere else discards it. No drag is required.
//! - **Draft**: a press creates a draft where it lands — a component on a
//!   component column, a port on a component, an interface item on an IO
//!   column.
//!
//! Mutations are applied to the diagram immediately (so a host can render
//! every intermediate state) and handed back as a [`Transaction`] in the
//! release [`Outcome`]; the caller commits it to the log. A gesture that
//! ends up changing nothing produces no transaction.

use log::{debug, trace};

use blueprint_core::geometry::{Bounds, Point};

use crate::command::{Edit, Transaction};
use crate::connection::{ConnectionId, derive_route};
use crate::diagram::{Diagram, Placement, PortPlacement, PortSide};
use crate::endpoint::InterfaceEndpoint;
use crate::item::{ComponentInstance, Item, ItemBody, ItemId, ItemKind};

/// The active interaction tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    Connect,
    Draft,
}

/// Pointer button of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Other,
}

/// What the user currently has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Item(ItemId),
    Connection(ConnectionId),
}

/// Something the host should surface after a gesture step.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ModeChanged(Mode),
    SelectionChanged(Option<Selection>),
    ContentChanged,
    /// The gesture was discarded; the string says why.
    Rejected(String),
}

/// Result of one gesture step.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Committed by the caller when present.
    pub transaction: Option<Transaction>,
    pub events: Vec<Event>,
}

impl Outcome {
    fn event(event: Event) -> Self {
        Outcome {
            transaction: None,
            events: vec![event],
        }
    }
}

/// Where the dragged item was when the drag started.
#[derive(Debug, Clone, Copy)]
enum DragOrigin {
    Stack(Placement),
    Port(PortPlacement),
    Column(Point),
}

#[derive(Debug)]
struct DragState {
    item: ItemId,
    /// Cursor scene position minus item scene position at press time.
    grab_offset: Point,
    origin: DragOrigin,
    /// Positions of every attached item at press time; diffed at release to
    /// record the moves of displaced siblings.
    snapshot: Vec<(ItemId, Point)>,
    moved: bool,
}

/// A connection being drawn in Connect mode.
#[derive(Debug, Clone)]
pub struct PendingConnection {
    pub anchor: ItemId,
    /// Cursor position of the free end.
    pub free: Point,
    /// Compatible endpoint the free end currently snaps to.
    pub snapped: Option<ItemId>,
    /// Preview route for rendering.
    pub route: Vec<Point>,
}

/// The interaction state machine.
#[derive(Debug, Default)]
pub struct Interaction {
    mode: Mode,
    selection: Option<Selection>,
    drag: Option<DragState>,
    pending: Option<PendingConnection>,
    /// Endpoints compatible with the pending connection's anchor.
    highlights: Vec<ItemId>,
}

impl Interaction {
    pub fn new() -> Self {
        Interaction::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// The connection preview, when Connect mode has an anchored end.
    pub fn pending_connection(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    /// Endpoints a host should highlight as valid targets.
    pub fn highlights(&self) -> &[ItemId] {
        &self.highlights
    }

    /// Switches tools. Leaving Connect discards any pending connection.
    pub fn set_mode(&mut self, mode: Mode) -> Outcome {
        if mode == self.mode {
            return Outcome::default();
        }
        self.pending = None;
        self.highlights.clear();
        self.drag = None;
        self.mode = mode;
        debug!(mode:? = mode; "interaction mode changed");
        Outcome::event(Event::ModeChanged(mode))
    }

    pub fn on_press(
        &mut self,
        diagram: &mut Diagram,
        scene: Point,
        button: PointerButton,
    ) -> Outcome {
        if button == PointerButton::Other {
            // Cancel whatever is half-done.
            if self.pending.take().is_some() {
                self.highlights.clear();
                return Outcome::event(Event::Rejected("connection discarded".into()));
            }
            self.drag = None;
            return Outcome::default();
        }

        match self.mode {
            Mode::Select => self.press_select(diagram, scene),
            Mode::Connect => self.press_connect(diagram, scene),
            Mode::Draft => self.press_draft(diagram, scene),
        }
    }

    pub fn on_move(&mut self, diagram: &mut Diagram, scene: Point) {
        trace!(x = scene.x, y = scene.y; "pointer move");
        match self.mode {
            Mode::Select => self.move_drag(diagram, scene),
            Mode::Connect => self.move_pending(diagram, scene),
            Mode::Draft => {}
        }
    }

    pub fn on_release(&mut self, diagram: &mut Diagram, scene: Point) -> Outcome {
        if self.mode != Mode::Select {
            return Outcome::default();
        }
        self.release_drag(diagram, scene)
    }

    // ------------------------------------------------------------------
    // Select mode

    fn press_select(&mut self, diagram: &mut Diagram, scene: Point) -> Outcome {
        let picked = diagram
            .item_at(scene)
            .map(Selection::Item)
            .or_else(|| {
                diagram
                    .connection_near(scene, diagram.config().snap_radius)
                    .map(Selection::Connection)
            });

        let changed = picked != self.selection;
        self.selection = picked;

        if let Some(Selection::Item(item)) = picked {
            let origin = match diagram.item(item).map(|i| i.kind()) {
                Some(ItemKind::Column) => {
                    diagram.item(item).map(|i| DragOrigin::Column(i.pos))
                }
                Some(ItemKind::Endpoint) => {
                    // Ports drag along their component edge; hierarchical
                    // interfaces drag within their column stack.
                    diagram
                        .port_placement(item)
                        .map(DragOrigin::Port)
                        .or_else(|| diagram.placement_of(item).map(DragOrigin::Stack))
                }
                Some(ItemKind::Component) => diagram.placement_of(item).map(DragOrigin::Stack),
                None => None,
            };
            if let Some(origin) = origin {
                self.drag = Some(DragState {
                    item,
                    grab_offset: scene.sub(diagram.scene_pos(item)),
                    origin,
                    snapshot: snapshot(diagram),
                    moved: false,
                });
            }
        }

        if changed {
            Outcome::event(Event::SelectionChanged(picked))
        } else {
            Outcome::default()
        }
    }

    fn move_drag(&mut self, diagram: &mut Diagram, scene: Point) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        drag.moved = true;
        let item = drag.item;
        let target_scene = scene.sub(drag.grab_offset);

        match drag.origin {
            DragOrigin::Column(_) => {
                diagram.on_move_column(item, target_scene);
                diagram.reroute_item(item);
            }
            DragOrigin::Port(_) => {
                let Some(component) = diagram.item(item).and_then(|i| i.owner) else {
                    return;
                };
                let local = diagram.map_from_scene(component, scene);
                let width = diagram.item(component).map(|c| c.size.width).unwrap_or(0.0);
                let want_left = local.x < width / 2.0;
                if diagram.port_side(item) == Some(PortSide::Right) && want_left
                    || diagram.port_side(item) == Some(PortSide::Left) && !want_left
                {
                    diagram.switch_port_side(item);
                }
                if let Some(it) = diagram.item_mut(item) {
                    it.pos.y = local.y;
                }
                diagram.on_move_port(item);
                diagram.reroute_endpoint(item);
            }
            DragOrigin::Stack(_) => {
                let kind = diagram.item(item).map(|i| i.kind());
                if let Some(target) = drag_target_stack(diagram, item, target_scene, kind)
                    && diagram.item(item).and_then(|i| i.owner) != Some(target)
                {
                    diagram.detach_item(item);
                    let local = diagram.map_from_scene(target, target_scene);
                    let index = diagram
                        .item(target)
                        .and_then(|s| s.as_stack())
                        .map(|s| s.children.len())
                        .unwrap_or(0);
                    diagram.attach_item(
                        item,
                        Placement {
                            stack: target,
                            index,
                            pos: local,
                        },
                    );
                }
                if let Some(owner) = diagram.item(item).and_then(|i| i.owner) {
                    let local = diagram.map_from_scene(owner, target_scene);
                    if let Some(it) = diagram.item_mut(item) {
                        it.pos = local;
                    }
                    diagram.on_move_item(item);
                }
                diagram.reroute_item(item);
            }
        }
    }

    fn release_drag(&mut self, diagram: &mut Diagram, _scene: Point) -> Outcome {
        let Some(drag) = self.drag.take() else {
            return Outcome::default();
        };
        if !drag.moved {
            return Outcome::default();
        }
        let item = drag.item;

        // Settle the dragged item into its final slot.
        match drag.origin {
            DragOrigin::Column(_) => diagram.set_column_pos(item),
            DragOrigin::Port(_) => diagram.settle_port(item),
            DragOrigin::Stack(_) => diagram.settle_item(item),
        }
        diagram.reroute_item(item);

        let mut tx = Transaction::new();
        match drag.origin {
            DragOrigin::Column(old) => {
                if let Some(it) = diagram.item(item) {
                    tx.push(Edit::Move {
                        item,
                        old,
                        new: it.pos,
                    });
                }
            }
            DragOrigin::Port(old) => {
                if let Some(now) = diagram.port_placement(item) {
                    if now.side == old.side {
                        tx.push(Edit::Move {
                            item,
                            old: old.pos,
                            new: now.pos,
                        });
                    } else {
                        tx.push(Edit::RemovePort { port: item, at: old });
                        tx.push(Edit::AddPort { port: item, at: now });
                    }
                }
            }
            DragOrigin::Stack(old) => {
                if let Some(now) = diagram.placement_of(item) {
                    if now.stack == old.stack {
                        tx.push(Edit::Move {
                            item,
                            old: old.pos,
                            new: now.pos,
                        });
                    } else {
                        tx.push(Edit::Reparent {
                            item,
                            old,
                            new: now,
                        });
                    }
                }
            }
        }

        // Displaced siblings (restacked neighbours, pushed ports).
        for (id, old_pos) in drag.snapshot {
            if id == item {
                continue;
            }
            if let Some(it) = diagram.item(id)
                && it.pos != old_pos
            {
                tx.push(Edit::Move {
                    item: id,
                    old: old_pos,
                    new: it.pos,
                });
            }
        }

        if tx.is_empty() {
            Outcome::default()
        } else {
            Outcome {
                transaction: Some(tx),
                events: vec![Event::ContentChanged],
            }
        }
    }

    // ------------------------------------------------------------------
    // Connect mode

    fn press_connect(&mut self, diagram: &mut Diagram, scene: Point) -> Outcome {
        let radius = diagram.config().snap_radius;

        if let Some(pending) = self.pending.take() {
            self.highlights.clear();
            let target = diagram
                .endpoint_near(scene, radius)
                .filter(|t| diagram.can_connect(pending.anchor, *t));
            let Some(target) = target else {
                return Outcome::event(Event::Rejected("no compatible endpoint here".into()));
            };
            return finalize_connection(diagram, pending.anchor, target);
        }

        let Some(anchor) = diagram.endpoint_near(scene, radius) else {
            return Outcome::default();
        };

        self.highlights = diagram
            .items()
            .filter(|(id, item)| {
                item.kind() == ItemKind::Endpoint
                    && diagram.is_attached(*id)
                    && diagram.can_connect(anchor, *id)
            })
            .map(|(id, _)| id)
            .collect();

        let route = preview_route(diagram, anchor, scene, None);
        self.pending = Some(PendingConnection {
            anchor,
            free: scene,
            snapped: None,
            route,
        });
        Outcome::default()
    }

    fn move_pending(&mut self, diagram: &Diagram, scene: Point) {
        let radius = diagram.config().snap_radius;
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.free = scene;
        pending.snapped = diagram
            .endpoint_near(scene, radius)
            .filter(|t| diagram.can_connect(pending.anchor, *t));
        pending.route = preview_route(diagram, pending.anchor, scene, pending.snapped);
    }

    // ------------------------------------------------------------------
    // Draft mode

    fn press_draft(&mut self, diagram: &mut Diagram, scene: Point) -> Outcome {
        match diagram.item_at(scene) {
            Some(hit) => match diagram.item(hit).map(|i| i.kind()) {
                Some(ItemKind::Component) => draft_port(diagram, hit, scene),
                Some(ItemKind::Column) => draft_into_column(diagram, hit, scene),
                _ => Outcome::default(),
            },
            None => Outcome::default(),
        }
    }
}

/// All attached item positions, for diffing at drag end.
fn snapshot(diagram: &Diagram) -> Vec<(ItemId, Point)> {
    diagram
        .items()
        .filter(|(id, _)| diagram.is_attached(*id))
        .map(|(id, item)| (id, item.pos))
        .collect()
}

/// The stack a dragged item should live in at this cursor position: a
/// mapping-capable component under sufficient overlap first, else the column
/// under the item's center.
fn drag_target_stack(
    diagram: &Diagram,
    item: ItemId,
    target_scene: Point,
    kind: Option<ItemKind>,
) -> Option<ItemId> {
    let kind = kind?;
    let size = diagram.item(item)?.size;
    let dragged = Bounds::new(target_scene, size);

    if kind == ItemKind::Component {
        let overlap = diagram.config().reparent_overlap;
        let host = diagram
            .items()
            .filter(|(id, other)| {
                *id != item
                    && other.kind() == ItemKind::Component
                    && other.as_component().is_some_and(|c| c.mapping.is_some())
                    && diagram.is_attached(*id)
                    && diagram.is_item_allowed(*id, kind)
            })
            .find(|(id, _)| {
                diagram
                    .scene_bounds(*id)
                    .and_then(|b| b.intersection(dragged))
                    .is_some_and(|i| i.height() >= overlap)
            })
            .map(|(id, _)| id);
        if let Some(host) = host {
            return Some(host);
        }
    }

    let center_x = target_scene.x + size.width / 2.0;
    diagram
        .column_at(center_x)
        .filter(|col| diagram.is_item_allowed(*col, kind))
}

/// Route previewed while a connection is being drawn: to the snapped
/// endpoint when there is one, else to the cursor.
fn preview_route(
    diagram: &Diagram,
    anchor: ItemId,
    free: Point,
    snapped: Option<ItemId>,
) -> Vec<Point> {
    if let Some(target) = snapped {
        return diagram.route_between(anchor, target);
    }
    let a = diagram.scene_pos(anchor);
    let dir_a = diagram
        .item(anchor)
        .and_then(|i| i.as_endpoint())
        .map(|e| e.direction)
        .unwrap_or(Point::new(1.0, 0.0));
    let dir_b = Point::new(if free.x < a.x { 1.0 } else { -1.0 }, 0.0);
    derive_route(a, dir_a, free, dir_b, diagram.config().connection_stub)
}

/// Finalizes a pending connection, recording the connection and any type
/// adoption in a transaction.
fn finalize_connection(diagram: &mut Diagram, anchor: ItemId, target: ItemId) -> Outcome {
    let before_a = diagram.endpoint_state(anchor);
    let before_b = diagram.endpoint_state(target);
    let Some(id) = diagram.connect_ends(anchor, target) else {
        return Outcome::event(Event::Rejected("endpoints are not compatible".into()));
    };

    let mut tx = Transaction::new();
    if let Some(connection) = diagram.connection(id).cloned() {
        tx.push(Edit::AddConnection { id, connection });
    }
    for (end, before) in [(anchor, before_a), (target, before_b)] {
        if let (Some(old), Some(new)) = (before, diagram.endpoint_state(end)) {
            tx.push(Edit::Retype {
                endpoint: end,
                old,
                new,
            });
        }
    }
    Outcome {
        transaction: Some(tx),
        events: vec![Event::ContentChanged],
    }
}

/// Creates a draft port where a Draft-mode press lands on a component.
fn draft_port(diagram: &mut Diagram, component: ItemId, scene: Point) -> Outcome {
    let local = diagram.map_from_scene(component, scene);
    let name = diagram.unique_port_name(component, "interface");
    let port = match diagram.add_port(
        component,
        InterfaceEndpoint::undefined(false, Point::default()),
        name,
        local,
    ) {
        Ok(port) => port,
        Err(e) => return Outcome::event(Event::Rejected(e.to_string())),
    };

    let mut tx = Transaction::new();
    if let Some(at) = diagram.port_placement(port) {
        tx.push(Edit::AddPort { port, at });
    }
    Outcome {
        transaction: Some(tx),
        events: vec![Event::ContentChanged],
    }
}

/// Creates a draft component or interface item where a Draft-mode press
/// lands on a column, depending on what the column admits.
fn draft_into_column(diagram: &mut Diagram, column: ItemId, scene: Point) -> Outcome {
    let local = diagram.map_from_scene(column, scene);

    let item = if diagram.is_item_allowed(column, ItemKind::Component) {
        let name = diagram.unique_instance_name("instance");
        let id = diagram.create_component(name, ComponentInstance::draft());
        if let Some(it) = diagram.item_mut(id) {
            it.pos = Point::new(local.x - it.size.width / 2.0, local.y);
        }
        id
    } else if diagram.is_item_allowed(column, ItemKind::Endpoint) {
        let name = diagram.unique_interface_name(column, "interface");
        // Interfaces on the leftmost column face out of the diagram.
        let direction = if diagram.columns().first() == Some(&column) {
            Point::new(-1.0, 0.0)
        } else {
            Point::new(1.0, 0.0)
        };
        let size = diagram.config().port_size;
        diagram.alloc_item(
            Item::new(name, ItemBody::Endpoint(InterfaceEndpoint::undefined(true, direction)))
                .with_pos(local.snapped(diagram.config().grid_size))
                .with_size(blueprint_core::geometry::Size::new(size, size)),
        )
    } else {
        return Outcome::event(Event::Rejected("column accepts nothing here".into()));
    };

    if let Err(e) = diagram.add_item(column, item, false) {
        return Outcome::event(Event::Rejected(e.to_string()));
    }

    let mut tx = Transaction::new();
    if let Some(at) = diagram.placement_of(item) {
        tx.push(Edit::AddItem { item, at });
    }
    Outcome {
        transaction: Some(tx),
        events: vec![Event::ContentChanged],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::endpoint::{EndpointType, ServiceInterface, ServiceRole};
    use blueprint_core::design::ColumnContent;

    fn setup() -> (Diagram, ItemId, ItemId) {
        let mut d = Diagram::new(LayoutConfig::default());
        let hw = d.add_column("HW", ColumnContent::Components);
        let io = d.add_column("IO", ColumnContent::Io);
        (d, hw, io)
    }

    fn provider_port(d: &mut Diagram, component: ItemId, name: &str, x: f32) -> ItemId {
        d.add_port(
            component,
            InterfaceEndpoint::typed(
                EndpointType::Service(ServiceInterface {
                    service_type: None,
                    role: ServiceRole::Provider,
                }),
                false,
                Point::default(),
            ),
            name,
            Point::new(x, 50.0),
        )
        .unwrap()
    }

    #[test]
    fn draft_press_on_component_column_creates_an_instance() {
        let (mut d, hw, _) = setup();
        let mut ix = Interaction::new();
        ix.set_mode(Mode::Draft);

        let out = ix.on_press(&mut d, Point::new(130.0, 200.0), PointerButton::Left);
        assert!(out.transaction.is_some());

        let stack = d.item(hw).unwrap().as_stack().unwrap();
        assert_eq!(stack.children.len(), 1);
        let draft = d.item(stack.children[0]).unwrap();
        assert_eq!(draft.name, "instance");
        assert!(draft.as_component().unwrap().component_ref.is_none());
    }

    #[test]
    fn draft_press_on_io_column_creates_a_hierarchical_interface() {
        let (mut d, _, io) = setup();
        let mut ix = Interaction::new();
        ix.set_mode(Mode::Draft);

        ix.on_press(&mut d, Point::new(390.0, 200.0), PointerButton::Left);

        let stack = d.item(io).unwrap().as_stack().unwrap();
        assert_eq!(stack.children.len(), 1);
        let ep = d.item(stack.children[0]).unwrap().as_endpoint().unwrap();
        assert!(ep.hierarchical);
        assert!(ep.ty.is_undefined());
    }

    #[test]
    fn two_press_connect_finalizes_on_a_compatible_target() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let b = d.create_component("b", ComponentInstance::draft());
        d.add_item(hw, b, false).unwrap();
        let pa = provider_port(&mut d, a, "svc", 220.0);
        let pb = d
            .add_port(
                b,
                InterfaceEndpoint::undefined(false, Point::default()),
                "draft",
                Point::new(0.0, 50.0),
            )
            .unwrap();

        let mut ix = Interaction::new();
        ix.set_mode(Mode::Connect);

        let first = d.scene_pos(pa);
        ix.on_press(&mut d, first, PointerButton::Left);
        assert!(ix.pending_connection().is_some());
        assert!(ix.highlights().contains(&pb));

        let second = d.scene_pos(pb);
        let out = ix.on_press(&mut d, second, PointerButton::Left);
        assert!(out.transaction.is_some());
        assert!(ix.pending_connection().is_none());
        assert_eq!(d.connections().count(), 1);
    }

    #[test]
    fn second_press_away_from_a_target_discards_the_pending_connection() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let pa = provider_port(&mut d, a, "svc", 220.0);

        let mut ix = Interaction::new();
        ix.set_mode(Mode::Connect);
        let first = d.scene_pos(pa);
        ix.on_press(&mut d, first, PointerButton::Left);

        let out = ix.on_press(&mut d, Point::new(900.0, 900.0), PointerButton::Left);
        assert!(out.transaction.is_none());
        assert!(matches!(out.events.first(), Some(Event::Rejected(_))));
        assert!(ix.pending_connection().is_none());
        assert!(ix.highlights().is_empty());
        assert_eq!(d.connections().count(), 0);
    }

    #[test]
    fn leaving_connect_mode_discards_the_pending_connection() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let pa = provider_port(&mut d, a, "svc", 220.0);

        let mut ix = Interaction::new();
        ix.set_mode(Mode::Connect);
        let first = d.scene_pos(pa);
        ix.on_press(&mut d, first, PointerButton::Left);
        assert!(ix.pending_connection().is_some());

        let out = ix.set_mode(Mode::Select);
        assert_eq!(out.events, vec![Event::ModeChanged(Mode::Select)]);
        assert!(ix.pending_connection().is_none());
    }

    #[test]
    fn pending_connection_snaps_to_compatible_endpoints() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let b = d.create_component("b", ComponentInstance::draft());
        d.add_item(hw, b, false).unwrap();
        let pa = provider_port(&mut d, a, "svc", 220.0);
        let pb = d
            .add_port(
                b,
                InterfaceEndpoint::undefined(false, Point::default()),
                "draft",
                Point::new(0.0, 50.0),
            )
            .unwrap();

        let mut ix = Interaction::new();
        ix.set_mode(Mode::Connect);
        let first = d.scene_pos(pa);
        ix.on_press(&mut d, first, PointerButton::Left);

        // Hover just off the target, inside the snap radius.
        let near = d.scene_pos(pb).add(Point::new(5.0, 5.0));
        ix.on_move(&mut d, near);
        assert_eq!(ix.pending_connection().unwrap().snapped, Some(pb));

        // And far away, no snap.
        ix.on_move(&mut d, Point::new(900.0, 900.0));
        assert_eq!(ix.pending_connection().unwrap().snapped, None);
    }

    #[test]
    fn drag_within_a_stack_yields_a_move_transaction() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let b = d.create_component("b", ComponentInstance::draft());
        d.add_item(hw, b, false).unwrap();

        let mut ix = Interaction::new();
        let grab = d.scene_pos(a).add(Point::new(10.0, 10.0));
        ix.on_press(&mut d, grab, PointerButton::Left);
        ix.on_move(&mut d, grab.add(Point::new(0.0, 300.0)));
        let out = ix.on_release(&mut d, grab.add(Point::new(0.0, 300.0)));

        let tx = out.transaction.expect("drag produced a transaction");
        assert!(tx
            .edits()
            .iter()
            .any(|e| matches!(e, Edit::Move { item, .. } if *item == a)));
        // b was displaced and recorded too.
        assert!(tx
            .edits()
            .iter()
            .any(|e| matches!(e, Edit::Move { item, .. } if *item == b)));
        let stack = d.item(hw).unwrap().as_stack().unwrap();
        assert_eq!(stack.children, vec![b, a]);
    }

    #[test]
    fn drag_into_another_column_yields_a_reparent() {
        let (mut d, hw, _) = setup();
        let sw = d.add_column("SW", ColumnContent::Components);
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();

        let mut ix = Interaction::new();
        let grab = d.scene_pos(a).add(Point::new(10.0, 10.0));
        let sw_x = d.item(sw).unwrap().pos.x;
        ix.on_press(&mut d, grab, PointerButton::Left);
        ix.on_move(&mut d, Point::new(sw_x + 130.0, 200.0));
        let out = ix.on_release(&mut d, Point::new(sw_x + 130.0, 200.0));

        let tx = out.transaction.expect("drag produced a transaction");
        assert!(tx.edits().iter().any(
            |e| matches!(e, Edit::Reparent { item, old, new }
                if *item == a && old.stack == hw && new.stack == sw)
        ));
        assert_eq!(d.item(a).unwrap().owner, Some(sw));
    }

    #[test]
    fn press_without_movement_changes_selection_only() {
        let (mut d, hw, _) = setup();
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();

        let mut ix = Interaction::new();
        let inside = d.scene_pos(a).add(Point::new(50.0, 30.0));
        let out = ix.on_press(&mut d, inside, PointerButton::Left);
        assert_eq!(
            out.events,
            vec![Event::SelectionChanged(Some(Selection::Item(a)))]
        );

        let out = ix.on_release(&mut d, inside);
        assert!(out.transaction.is_none());
    }
}
