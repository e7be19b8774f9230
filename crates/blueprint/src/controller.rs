//! The diagram controller: persistence, gestures, notifications.
//!
//! [`DiagramController`] ties the pieces together for a host application. It
//! owns the [`Diagram`], the [`CommandLog`] and the [`Interaction`] state
//! machine, resolves component references through a [`LibraryService`], and
//! queues [`Notification`]s instead of calling back into the host — the host
//! drains the queue after each call and decides what to repaint.
//!
//! Loading is tolerant by design: a reference the library cannot resolve
//! becomes a placeholder draft instance, a connection with a missing end is
//! dropped, and each such degradation is reported as an error notification.
//! Saving walks the live diagram back into a [`Design`] value.

use std::collections::VecDeque;

use log::{info, warn};

use blueprint_core::design::{
    ColumnContent, ColumnRecord, ConnectionRecord, Design, EndpointRef, InstanceRecord,
    InterfaceRecord,
};
use blueprint_core::geometry::{Point, Size};

use crate::command::{CommandLog, Edit, Transaction};
use crate::config::LayoutConfig;
use crate::connection::ConnectionId;
use crate::diagram::Diagram;
use crate::endpoint::{EndpointType, InterfaceEndpoint};
use crate::error::BlueprintError;
use crate::interaction::{Event, Interaction, Mode, Outcome, PointerButton, Selection};
use crate::item::{ComponentInstance, Item, ItemBody, ItemId, ItemKind};
use crate::library::{ComponentKind, LibraryService};

/// Something the host should react to. Queued, never called back.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The diagram changed; repaint and mark the document dirty.
    ContentChanged,
    SelectionChanged(Option<Selection>),
    ModeChanged(Mode),
    /// Something degraded or was refused; show it to the user.
    Error(String),
    Notice(String),
}

/// Editor facade over one diagram.
pub struct DiagramController<L> {
    diagram: Diagram,
    log: CommandLog,
    interaction: Interaction,
    library: L,
    notifications: VecDeque<Notification>,
}

impl<L: LibraryService> DiagramController<L> {
    pub fn new(library: L, config: LayoutConfig) -> Self {
        DiagramController {
            diagram: Diagram::new(config),
            log: CommandLog::new(),
            interaction: Interaction::new(),
            library,
            notifications: VecDeque::new(),
        }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Pending notifications, oldest first. Clears the queue.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn notify(&mut self, n: Notification) {
        self.notifications.push_back(n);
    }

    fn absorb(&mut self, outcome: Outcome) {
        if let Some(tx) = outcome.transaction {
            self.log.commit(tx);
        }
        for event in outcome.events {
            let n = match event {
                Event::ModeChanged(m) => Notification::ModeChanged(m),
                Event::SelectionChanged(s) => Notification::SelectionChanged(s),
                Event::ContentChanged => Notification::ContentChanged,
                Event::Rejected(why) => Notification::Notice(why),
            };
            self.notify(n);
        }
    }

    // ------------------------------------------------------------------
    // Gestures

    pub fn set_mode(&mut self, mode: Mode) {
        let outcome = self.interaction.set_mode(mode);
        self.absorb(outcome);
    }

    pub fn on_press(&mut self, scene: Point, button: PointerButton) {
        let outcome = self.interaction.on_press(&mut self.diagram, scene, button);
        self.absorb(outcome);
    }

    pub fn on_move(&mut self, scene: Point) {
        self.interaction.on_move(&mut self.diagram, scene);
    }

    pub fn on_release(&mut self, scene: Point) {
        let outcome = self.interaction.on_release(&mut self.diagram, scene);
        self.absorb(outcome);
    }

    // ------------------------------------------------------------------
    // Undo/redo

    pub fn undo(&mut self) -> bool {
        if self.log.undo(&mut self.diagram) {
            self.notify(Notification::ContentChanged);
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.log.redo(&mut self.diagram) {
            self.notify(Notification::ContentChanged);
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    // ------------------------------------------------------------------
    // Edit operations outside the pointer gestures

    /// Adds a column at the right edge, as an undoable step.
    pub fn add_column(&mut self, name: impl Into<String>, content: ColumnContent) -> ItemId {
        let id = self.diagram.add_column(name, content);
        let index = self.diagram.columns().len() - 1;
        let mut tx = Transaction::new();
        tx.push(Edit::AddColumn { column: id, index });
        self.log.commit(tx);
        self.notify(Notification::ContentChanged);
        id
    }

    /// Installs an explicit type on an endpoint, renegotiating its
    /// connections; incompatible ones are removed. Undoable as one step.
    pub fn set_endpoint_type(&mut self, endpoint: ItemId, ty: EndpointType) {
        let Some(before) = self.diagram.endpoint_state(endpoint) else {
            return;
        };
        // Snapshot everything the renegotiation may touch.
        let conns: Vec<_> = self
            .diagram
            .item(endpoint)
            .and_then(|i| i.as_endpoint())
            .map(|e| e.connections.clone())
            .unwrap_or_default();
        let snapshots: Vec<_> = conns
            .iter()
            .filter_map(|id| self.diagram.connection(*id).cloned().map(|c| (*id, c)))
            .collect();
        let peers: Vec<_> = snapshots
            .iter()
            .filter_map(|(_, c)| c.other(endpoint))
            .collect();
        let peer_states: Vec<_> = peers
            .iter()
            .filter_map(|p| self.diagram.endpoint_state(*p).map(|s| (*p, s)))
            .collect();

        let dropped = self.diagram.set_endpoint_type(endpoint, ty);

        let mut tx = Transaction::new();
        for (id, conn) in snapshots {
            if dropped.contains(&id) {
                tx.push(Edit::RemoveConnection { id, connection: conn });
            }
        }
        if let Some(after) = self.diagram.endpoint_state(endpoint) {
            tx.push(Edit::Retype {
                endpoint,
                old: before,
                new: after,
            });
        }
        for (peer, old) in peer_states {
            if let Some(new) = self.diagram.endpoint_state(peer) {
                tx.push(Edit::Retype {
                    endpoint: peer,
                    old,
                    new,
                });
            }
        }
        if !dropped.is_empty() {
            self.notify(Notification::Notice(format!(
                "{} connection(s) removed: no longer compatible",
                dropped.len()
            )));
        }
        self.log.commit(tx);
        self.notify(Notification::ContentChanged);
    }

    /// Deletes whatever is selected, as one undoable step.
    pub fn delete_selection(&mut self) {
        match self.interaction.selection() {
            Some(Selection::Connection(id)) => {
                let mut tx = Transaction::new();
                self.record_connection_removal(id, &mut tx);
                self.log.commit(tx);
                self.notify(Notification::ContentChanged);
            }
            Some(Selection::Item(item)) => self.delete_item(item),
            None => {}
        }
    }

    fn delete_item(&mut self, item: ItemId) {
        let Some(kind) = self.diagram.item(item).map(|i| i.kind()) else {
            return;
        };
        let mut tx = Transaction::new();
        match kind {
            ItemKind::Column => {
                let occupied = self
                    .diagram
                    .item(item)
                    .and_then(|i| i.as_stack())
                    .is_some_and(|s| !s.children.is_empty());
                if occupied {
                    self.notify(Notification::Notice(
                        "column is not empty and cannot be removed".into(),
                    ));
                    return;
                }
                if let Some(index) = self.diagram.detach_column(item) {
                    tx.push(Edit::RemoveColumn { column: item, index });
                }
            }
            ItemKind::Component => {
                for id in self.diagram.connections_of(item) {
                    self.record_connection_removal(id, &mut tx);
                }
                if let Some(at) = self.diagram.detach_item(item) {
                    tx.push(Edit::RemoveItem { item, at });
                }
            }
            ItemKind::Endpoint => {
                for id in self.diagram.connections_of(item) {
                    self.record_connection_removal(id, &mut tx);
                }
                if let Some(at) = self.diagram.port_placement(item) {
                    self.diagram.detach_port(item);
                    tx.push(Edit::RemovePort { port: item, at });
                } else if let Some(at) = self.diagram.detach_item(item) {
                    tx.push(Edit::RemoveItem { item, at });
                }
            }
        }
        if !tx.is_empty() {
            self.log.commit(tx);
            self.notify(Notification::ContentChanged);
        }
    }

    /// Removes one connection, recording the removal and the type reversions
    /// it causes.
    fn record_connection_removal(&mut self, id: ConnectionId, tx: &mut Transaction) {
        let Some(conn) = self.diagram.connection(id).cloned() else {
            return;
        };
        let (a, b) = conn.endpoints;
        let before_a = self.diagram.endpoint_state(a);
        let before_b = self.diagram.endpoint_state(b);

        self.diagram.remove_connection(id);
        tx.push(Edit::RemoveConnection { id, connection: conn });
        for (end, before) in [(a, before_a), (b, before_b)] {
            if let (Some(old), Some(new)) = (before, self.diagram.endpoint_state(end)) {
                tx.push(Edit::Retype {
                    endpoint: end,
                    old,
                    new,
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Load

    /// Replaces the diagram with the given design. Degradations (missing
    /// components, dangling connection ends) are reported as notifications,
    /// never as failures. The undo log starts empty.
    pub fn load(&mut self, design: &Design) {
        self.diagram = Diagram::new(self.diagram.config().clone());
        self.log = CommandLog::new();
        self.interaction = Interaction::new();

        self.load_columns(design);

        for rec in design.instances.iter().filter(|r| r.mapped_to.is_none()) {
            self.load_instance(rec, None);
        }
        for rec in design.instances.iter().filter(|r| r.mapped_to.is_some()) {
            let host = rec
                .mapped_to
                .as_deref()
                .and_then(|name| self.find_component(name));
            if host.is_none() {
                self.notify(Notification::Error(format!(
                    "instance '{}' is mapped to unknown instance '{}'",
                    rec.name,
                    rec.mapped_to.as_deref().unwrap_or("")
                )));
            }
            self.load_instance(rec, host);
        }

        self.load_interfaces(design);
        self.load_connections(design);

        info!(
            instances = design.instances.len(),
            connections = design.connections.len();
            "design loaded"
        );
        self.notify(Notification::ContentChanged);
    }

    fn load_columns(&mut self, design: &Design) {
        if design.columns.is_empty() {
            self.diagram.add_column("Components", ColumnContent::Components);
            self.diagram.add_column("IO", ColumnContent::Io);
            return;
        }
        for rec in &design.columns {
            let id = self.diagram.add_column(rec.name.clone(), rec.content);
            if let Some(item) = self.diagram.item_mut(id) {
                item.size.width = rec.width;
                if let Some(col) = item.as_column_mut() {
                    col.width = rec.width;
                    col.stack.allowed = rec.allowed;
                }
            }
        }
        self.diagram.sort_columns();
    }

    fn load_instance(&mut self, rec: &InstanceRecord, host: Option<ItemId>) {
        let definition = rec
            .component_ref
            .as_ref()
            .and_then(|v| self.library.resolve(v));
        if definition.is_none()
            && let Some(v) = &rec.component_ref
        {
            self.notify(Notification::Error(format!(
                "component {v} not found in library; placeholder created for '{}'",
                rec.name
            )));
        }

        let mut instance = match (&rec.component_ref, &definition) {
            (Some(v), Some(def)) => {
                let inst = ComponentInstance::packaged(v.clone());
                if def.kind == ComponentKind::Hardware {
                    inst.with_mapping()
                } else {
                    inst
                }
            }
            (Some(v), None) => {
                let mut inst = ComponentInstance::draft();
                inst.component_ref = Some(v.clone());
                inst
            }
            (None, _) => ComponentInstance::draft(),
        };
        instance.display_name = rec.display_name.clone();
        instance.description = rec.description.clone();
        instance.configurable_values = rec.configurable_values.clone();
        instance.imported = rec.imported;

        let id = self.diagram.create_component(rec.name.clone(), instance);

        let target = host
            .or_else(|| {
                rec.position
                    .and_then(|p| self.diagram.column_at(p.x))
                    .filter(|c| self.diagram.is_item_allowed(*c, ItemKind::Component))
            })
            .or_else(|| self.diagram.column_for(ItemKind::Component));
        let Some(target) = target else {
            self.notify(Notification::Error(
                BlueprintError::NoColumn(rec.name.clone()).to_string(),
            ));
            return;
        };

        let result = match rec.position {
            Some(scene) => {
                let local = self.diagram.map_from_scene(target, scene);
                if let Some(item) = self.diagram.item_mut(id) {
                    item.pos = local;
                }
                self.diagram.add_item(target, id, true)
            }
            None => self.diagram.add_item(target, id, false),
        };
        if let Err(e) = result {
            warn!(instance = rec.name.as_str(); "instance placement failed");
            self.notify(Notification::Error(e.to_string()));
            return;
        }

        if let Some(def) = definition {
            let width = self.diagram.item(id).map(|i| i.size.width).unwrap_or(0.0);
            for (i, idef) in def.interfaces.iter().enumerate() {
                let pos = rec
                    .endpoint_positions
                    .get(&idef.name)
                    .copied()
                    .or(idef.default_position)
                    .unwrap_or_else(|| {
                        Point::new(
                            width,
                            self.diagram.config().port_top_margin
                                + i as f32 * 3.0 * self.diagram.config().grid_size,
                        )
                    });
                if let Err(e) = self.diagram.load_port(
                    id,
                    InterfaceEndpoint::typed(idef.ty.clone(), false, Point::default()),
                    idef.name.clone(),
                    pos,
                ) {
                    self.notify(Notification::Error(e.to_string()));
                }
            }
        }
    }

    fn load_interfaces(&mut self, design: &Design) {
        for rec in &design.interfaces {
            let column = self
                .diagram
                .column_at(rec.position.x)
                .filter(|c| self.diagram.is_item_allowed(*c, ItemKind::Endpoint))
                .or_else(|| self.diagram.column_for(ItemKind::Endpoint));
            let Some(column) = column else {
                self.notify(Notification::Error(
                    BlueprintError::NoColumn(rec.name.clone()).to_string(),
                ));
                continue;
            };

            let local = self.diagram.map_from_scene(column, rec.position);
            let size = self.diagram.config().port_size;
            let id = self.diagram.alloc_item(
                Item::new(
                    rec.name.clone(),
                    ItemBody::Endpoint(InterfaceEndpoint::undefined(true, rec.direction)),
                )
                .with_pos(local)
                .with_size(Size::new(size, size)),
            );
            if let Err(e) = self.diagram.add_item(column, id, true) {
                self.notify(Notification::Error(e.to_string()));
            }
        }
    }

    fn load_connections(&mut self, design: &Design) {
        for rec in &design.connections {
            let a = self.resolve_endpoint(&rec.from);
            let b = self.resolve_endpoint(&rec.to);
            let (Some(a), Some(b)) = (a, b) else {
                self.notify(Notification::Error(format!(
                    "connection '{}' references a missing endpoint; dropped",
                    rec.name
                )));
                continue;
            };
            let Some(id) = self.diagram.connect_ends(a, b) else {
                self.notify(Notification::Error(format!(
                    "connection '{}' joins incompatible endpoints; dropped",
                    rec.name
                )));
                continue;
            };
            if let Some(conn) = self.diagram.connection_mut(id) {
                conn.name = rec.name.clone();
                conn.imported = rec.imported;
                if rec.route.len() >= 2 {
                    conn.route = rec.route.clone();
                }
            }
        }
    }

    /// Resolves one end of a stored connection to a live endpoint item. A
    /// port missing from a draft instance is created on the fly, the way a
    /// draft grows endpoints as connections arrive.
    fn resolve_endpoint(&mut self, end: &EndpointRef) -> Option<ItemId> {
        match &end.instance {
            Some(instance) => {
                let component = self.find_component(instance)?;
                if let Some(port) = self.find_port(component, &end.endpoint) {
                    return Some(port);
                }
                let packaged = self
                    .diagram
                    .item(component)
                    .and_then(|i| i.as_component())
                    .is_some_and(|c| c.packaged);
                if packaged {
                    return None;
                }
                let width = self
                    .diagram
                    .item(component)
                    .map(|i| i.size.width)
                    .unwrap_or(0.0);
                let count = self
                    .diagram
                    .item(component)
                    .and_then(|i| i.as_component())
                    .map(|c| c.left_ports.len() + c.right_ports.len())
                    .unwrap_or(0);
                let y = self.diagram.config().port_top_margin
                    + count as f32 * 3.0 * self.diagram.config().grid_size;
                self.diagram
                    .load_port(
                        component,
                        InterfaceEndpoint::undefined(false, Point::default()),
                        end.endpoint.clone(),
                        Point::new(width, y),
                    )
                    .ok()
            }
            None => self.find_interface(&end.endpoint),
        }
    }

    fn find_component(&self, name: &str) -> Option<ItemId> {
        self.diagram
            .items()
            .find(|(id, item)| {
                item.kind() == ItemKind::Component
                    && item.name == name
                    && self.diagram.is_attached(*id)
            })
            .map(|(id, _)| id)
    }

    fn find_port(&self, component: ItemId, name: &str) -> Option<ItemId> {
        let c = self.diagram.item(component)?.as_component()?;
        c.left_ports
            .iter()
            .chain(&c.right_ports)
            .copied()
            .find(|p| self.diagram.item(*p).is_some_and(|i| i.name == name))
    }

    fn find_interface(&self, name: &str) -> Option<ItemId> {
        self.diagram
            .items()
            .find(|(id, item)| {
                item.kind() == ItemKind::Endpoint
                    && item.name == name
                    && item.as_endpoint().is_some_and(|e| e.hierarchical)
                    && self.diagram.is_attached(*id)
            })
            .map(|(id, _)| id)
    }

    // ------------------------------------------------------------------
    // Save

    /// Walks the live diagram into a [`Design`] value.
    pub fn save(&self) -> Design {
        let mut design = Design::default();

        for &col in self.diagram.columns() {
            let Some(item) = self.diagram.item(col) else {
                continue;
            };
            let Some(data) = item.as_column() else {
                continue;
            };
            design.columns.push(ColumnRecord {
                name: item.name.clone(),
                content: data.content,
                allowed: data.stack.allowed,
                width: data.width,
            });
        }

        for (id, item) in self.diagram.items() {
            if item.kind() != ItemKind::Component || !self.diagram.is_attached(id) {
                continue;
            }
            let Some(c) = item.as_component() else {
                continue;
            };
            let mapped_to = item.owner.and_then(|owner| {
                self.diagram
                    .item(owner)
                    .filter(|o| o.kind() == ItemKind::Component)
                    .map(|o| o.name.clone())
            });
            let mut endpoint_positions = indexmap::IndexMap::new();
            for port in c.left_ports.iter().chain(&c.right_ports) {
                if let Some(p) = self.diagram.item(*port) {
                    endpoint_positions.insert(p.name.clone(), p.pos);
                }
            }
            design.instances.push(InstanceRecord {
                name: item.name.clone(),
                display_name: c.display_name.clone(),
                description: c.description.clone(),
                component_ref: c.component_ref.clone(),
                configurable_values: c.configurable_values.clone(),
                position: Some(self.diagram.scene_pos(id)),
                endpoint_positions,
                mapped_to,
                imported: c.imported,
            });
        }

        for (id, item) in self.diagram.items() {
            if item.kind() != ItemKind::Endpoint || !self.diagram.is_attached(id) {
                continue;
            }
            let Some(e) = item.as_endpoint() else {
                continue;
            };
            if !e.hierarchical {
                continue;
            }
            design.interfaces.push(InterfaceRecord {
                name: item.name.clone(),
                position: self.diagram.scene_pos(id),
                direction: e.direction,
            });
        }

        for (_, conn) in self.diagram.connections() {
            let (a, b) = conn.endpoints;
            let (Some(from), Some(to)) = (self.endpoint_ref(a), self.endpoint_ref(b)) else {
                continue;
            };
            design.connections.push(ConnectionRecord {
                name: conn.name.clone(),
                from,
                to,
                route: conn.route.clone(),
                imported: conn.imported,
            });
        }

        design
    }

    fn endpoint_ref(&self, endpoint: ItemId) -> Option<EndpointRef> {
        let item = self.diagram.item(endpoint)?;
        match item.owner.and_then(|o| self.diagram.item(o)) {
            Some(owner) if owner.kind() == ItemKind::Component => {
                Some(EndpointRef::on_instance(owner.name.clone(), item.name.clone()))
            }
            _ => Some(EndpointRef::hierarchical(item.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::design::AllowedItems;
    use blueprint_core::vlnv::Vlnv;

    use crate::endpoint::{ServiceInterface, ServiceRole};
    use crate::library::{ComponentDefinition, InterfaceDefinition, MemoryLibrary};

    fn vlnv(name: &str) -> Vlnv {
        format!("acme:lib:{name}:1.0").parse().unwrap()
    }

    fn library() -> MemoryLibrary {
        let mut lib = MemoryLibrary::new();
        lib.insert(
            ComponentDefinition::new(vlnv("cpu"), ComponentKind::Hardware).with_interface(
                InterfaceDefinition::new(
                    "svc",
                    EndpointType::Service(ServiceInterface {
                        service_type: None,
                        role: ServiceRole::Provider,
                    }),
                )
                .at(Point::new(220.0, 50.0)),
            ),
        );
        lib.insert(ComponentDefinition::new(vlnv("app"), ComponentKind::Software));
        lib
    }

    fn design_with_two_instances() -> Design {
        let mut design = Design::default();
        design.columns.push(ColumnRecord {
            name: "HW".into(),
            content: ColumnContent::Components,
            allowed: AllowedItems::for_content(ColumnContent::Components),
            width: 260.0,
        });
        design.columns.push(ColumnRecord {
            name: "IO".into(),
            content: ColumnContent::Io,
            allowed: AllowedItems::for_content(ColumnContent::Io),
            width: 260.0,
        });

        let mut cpu = InstanceRecord::named("cpu0");
        cpu.component_ref = Some(vlnv("cpu"));
        cpu.position = Some(Point::new(20.0, 60.0));
        design.instances.push(cpu);

        let mut app = InstanceRecord::named("app0");
        app.component_ref = Some(vlnv("app"));
        app.mapped_to = Some("cpu0".into());
        design.instances.push(app);

        design
    }

    #[test]
    fn load_materializes_columns_instances_and_ports() {
        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design_with_two_instances());

        assert_eq!(ctl.diagram().columns().len(), 2);
        let cpu = ctl.find_component("cpu0").unwrap();
        let c = ctl.diagram().item(cpu).unwrap().as_component().unwrap();
        assert!(c.packaged);
        assert_eq!(c.left_ports.len() + c.right_ports.len(), 1);

        // The software instance landed inside the hardware instance's stack.
        let app = ctl.find_component("app0").unwrap();
        assert_eq!(ctl.diagram().item(app).unwrap().owner, Some(cpu));

        // Clean load, apart from the ContentChanged marker.
        let errors: Vec<_> = ctl
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::Error(_)))
            .collect();
        assert!(errors.is_empty());
    }

    #[test]
    fn unresolved_reference_becomes_placeholder_with_error() {
        let mut design = design_with_two_instances();
        let mut ghost = InstanceRecord::named("ghost");
        ghost.component_ref = Some(vlnv("missing"));
        design.instances.push(ghost);

        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);

        let ghost = ctl.find_component("ghost").unwrap();
        let c = ctl.diagram().item(ghost).unwrap().as_component().unwrap();
        assert!(!c.packaged);
        assert_eq!(c.component_ref, Some(vlnv("missing")));

        assert!(ctl
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::Error(_))));
    }

    #[test]
    fn dangling_connection_is_dropped_with_error() {
        let mut design = design_with_two_instances();
        design.connections.push(ConnectionRecord {
            name: "bad".into(),
            from: EndpointRef::on_instance("cpu0", "svc"),
            to: EndpointRef::on_instance("nope", "p"),
            route: vec![],
            imported: false,
        });

        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);

        assert_eq!(ctl.diagram().connections().count(), 0);
        assert!(ctl
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::Error(_))));
    }

    #[test]
    fn connection_to_a_draft_instance_grows_a_port() {
        let mut design = design_with_two_instances();
        design.instances.push(InstanceRecord::named("draft0"));
        design.connections.push(ConnectionRecord {
            name: "link".into(),
            from: EndpointRef::on_instance("cpu0", "svc"),
            to: EndpointRef::on_instance("draft0", "new_port"),
            route: vec![],
            imported: false,
        });

        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);

        assert_eq!(ctl.diagram().connections().count(), 1);
        let draft = ctl.find_component("draft0").unwrap();
        assert!(ctl.find_port(draft, "new_port").is_some());
        // The new port adopted the complement of the provider it met.
        let port = ctl.find_port(draft, "new_port").unwrap();
        let ep = ctl.diagram().item(port).unwrap().as_endpoint().unwrap();
        assert_eq!(ep.ty.as_service().unwrap().role, ServiceRole::Requester);
        assert!(ep.temporary);
    }

    #[test]
    fn save_round_trips_a_loaded_design() {
        let mut design = design_with_two_instances();
        design.interfaces.push(InterfaceRecord {
            name: "uart".into(),
            position: Point::new(390.0, 100.0),
            direction: Point::new(1.0, 0.0),
        });
        design.connections.push(ConnectionRecord {
            name: "cpu_uart".into(),
            from: EndpointRef::on_instance("cpu0", "svc"),
            to: EndpointRef::hierarchical("uart"),
            route: vec![],
            imported: false,
        });

        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);
        let saved = ctl.save();

        assert_eq!(saved.columns.len(), 2);
        assert_eq!(saved.instances.len(), 2);
        assert_eq!(saved.interfaces.len(), 1);
        assert_eq!(saved.connections.len(), 1);
        assert_eq!(saved.connections[0].name, "cpu_uart");
        assert!(saved.connections[0].is_hierarchical());
        assert_eq!(saved.instance("app0").unwrap().mapped_to.as_deref(), Some("cpu0"));

        // Loading the saved design again reproduces the same document.
        let mut ctl2 = DiagramController::new(library(), LayoutConfig::default());
        ctl2.load(&saved);
        assert_eq!(ctl2.save(), saved);
    }

    #[test]
    fn empty_design_gets_default_columns() {
        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&Design::default());
        assert_eq!(ctl.diagram().columns().len(), 2);
    }

    #[test]
    fn deleting_a_component_removes_its_connections_and_undo_restores() {
        let design = design_with_two_instances();
        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);

        let cpu = ctl.find_component("cpu0").unwrap();
        ctl.delete_item(cpu);
        assert!(!ctl.diagram().is_attached(cpu));

        assert!(ctl.undo());
        assert!(ctl.diagram().is_attached(cpu));
        // The mapped software child came back with its host.
        let app = ctl.find_component("app0").unwrap();
        assert_eq!(ctl.diagram().item(app).unwrap().owner, Some(cpu));
    }

    #[test]
    fn occupied_column_cannot_be_deleted() {
        let design = design_with_two_instances();
        let mut ctl = DiagramController::new(library(), LayoutConfig::default());
        ctl.load(&design);
        ctl.drain_notifications();

        let hw = ctl.diagram().columns()[0];
        ctl.delete_item(hw);

        assert_eq!(ctl.diagram().columns().len(), 2);
        assert!(ctl
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, Notification::Notice(_))));
    }
}
