//! Transactional undo/redo.
//!
//! Every user gesture that changes the diagram is recorded as a
//! [`Transaction`]: a flat list of primitive [`Edit`]s in application order.
//! There is no command hierarchy — a composite gesture (say, a reparenting
//! drag that also moves three siblings) is simply a longer edit list. Undo
//! reverts the edits in reverse order, redo re-applies them in order, and a
//! settling pass restores derived state (child order, stack geometry,
//! connection routes) that the primitive edits do not carry.
//!
//! Edits reference items by id. The arena never frees an entry — deletion is
//! detachment — so an edit recorded long ago can always be replayed.

use log::debug;

use blueprint_core::geometry::Point;

use crate::connection::{Connection, ConnectionId};
use crate::diagram::{Diagram, Placement, PortPlacement, TypeState};
use crate::item::{ItemId, ItemKind};

/// A primitive, invertible change to the diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// An item moved within its owner.
    Move {
        item: ItemId,
        old: Point,
        new: Point,
    },
    /// An item moved from one stack slot to another, possibly in a different
    /// stack.
    Reparent {
        item: ItemId,
        old: Placement,
        new: Placement,
    },
    /// An item was attached to the diagram.
    AddItem { item: ItemId, at: Placement },
    /// An item was detached from the diagram.
    RemoveItem { item: ItemId, at: Placement },
    /// A port was attached to a component side.
    AddPort { port: ItemId, at: PortPlacement },
    /// A port was detached from its component.
    RemovePort { port: ItemId, at: PortPlacement },
    /// A column was added at a list index.
    AddColumn { column: ItemId, index: usize },
    /// A column was removed from a list index.
    RemoveColumn { column: ItemId, index: usize },
    AddConnection {
        id: ConnectionId,
        connection: Connection,
    },
    RemoveConnection {
        id: ConnectionId,
        connection: Connection,
    },
    /// An endpoint's type state changed (explicit retype or adoption).
    Retype {
        endpoint: ItemId,
        old: TypeState,
        new: TypeState,
    },
}

impl Edit {
    /// An edit that observably changes nothing.
    fn is_noop(&self) -> bool {
        match self {
            Edit::Move { old, new, .. } => old == new,
            Edit::Reparent { old, new, .. } => old == new,
            Edit::Retype { old, new, .. } => old == new,
            _ => false,
        }
    }

    fn apply(&self, diagram: &mut Diagram) {
        match self {
            Edit::Move { item, new, .. } => {
                if let Some(it) = diagram.item_mut(*item) {
                    it.pos = *new;
                }
            }
            Edit::Reparent { item, new, .. } => {
                diagram.detach_item(*item);
                diagram.attach_item(*item, *new);
            }
            Edit::AddItem { item, at } => diagram.attach_item(*item, *at),
            Edit::RemoveItem { item, .. } => {
                diagram.detach_item(*item);
            }
            Edit::AddPort { port, at } => diagram.attach_port(*port, *at),
            Edit::RemovePort { port, .. } => {
                diagram.detach_port(*port);
            }
            Edit::AddColumn { column, index } => diagram.attach_column(*column, *index),
            Edit::RemoveColumn { column, .. } => {
                diagram.detach_column(*column);
            }
            Edit::AddConnection { id, connection } => {
                diagram.insert_connection_raw(*id, connection.clone());
            }
            Edit::RemoveConnection { id, .. } => {
                diagram.remove_connection_raw(*id);
            }
            Edit::Retype { endpoint, new, .. } => {
                diagram.force_endpoint_state(*endpoint, new.clone());
            }
        }
    }

    fn revert(&self, diagram: &mut Diagram) {
        match self {
            Edit::Move { item, old, .. } => {
                if let Some(it) = diagram.item_mut(*item) {
                    it.pos = *old;
                }
            }
            Edit::Reparent { item, old, .. } => {
                diagram.detach_item(*item);
                diagram.attach_item(*item, *old);
            }
            Edit::AddItem { item, .. } => {
                diagram.detach_item(*item);
            }
            Edit::RemoveItem { item, at } => diagram.attach_item(*item, *at),
            Edit::AddPort { port, .. } => {
                diagram.detach_port(*port);
            }
            Edit::RemovePort { port, at } => diagram.attach_port(*port, *at),
            Edit::AddColumn { column, .. } => {
                diagram.detach_column(*column);
            }
            Edit::RemoveColumn { column, index } => diagram.attach_column(*column, *index),
            Edit::AddConnection { id, .. } => {
                diagram.remove_connection_raw(*id);
            }
            Edit::RemoveConnection { id, connection } => {
                diagram.insert_connection_raw(*id, connection.clone());
            }
            Edit::Retype { endpoint, old, .. } => {
                diagram.force_endpoint_state(*endpoint, old.clone());
            }
        }
    }

    /// Items whose surroundings need settling after this edit replays.
    fn touched(&self) -> Vec<ItemId> {
        match self {
            Edit::Move { item, .. }
            | Edit::Reparent { item, .. }
            | Edit::AddItem { item, .. }
            | Edit::RemoveItem { item, .. }
            | Edit::Retype { endpoint: item, .. } => vec![*item],
            Edit::AddPort { port, at } | Edit::RemovePort { port, at } => {
                vec![*port, at.component]
            }
            Edit::AddColumn { column, .. } | Edit::RemoveColumn { column, .. } => vec![*column],
            Edit::AddConnection { connection, .. } | Edit::RemoveConnection { connection, .. } => {
                vec![connection.endpoints.0, connection.endpoints.1]
            }
        }
    }
}

/// One undoable unit of work: the edits of a single user gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    edits: Vec<Edit>,
}

impl Transaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    pub fn push(&mut self, edit: Edit) {
        if !edit.is_noop() {
            self.edits.push(edit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }
}

/// The undo/redo stacks.
///
/// Transactions are recorded after their effects have already been applied
/// to the diagram; [`CommandLog::commit`] only stores them. A fresh commit
/// discards the redo stack.
#[derive(Debug, Default)]
pub struct CommandLog {
    done: Vec<Transaction>,
    undone: Vec<Transaction>,
}

impl CommandLog {
    pub fn new() -> Self {
        CommandLog::default()
    }

    /// Records an already-applied transaction. Transactions with no
    /// observable effect are dropped.
    pub fn commit(&mut self, tx: Transaction) {
        if tx.is_empty() {
            return;
        }
        debug!(edits = tx.edits.len(); "transaction committed");
        self.done.push(tx);
        self.undone.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Reverts the most recent transaction. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self, diagram: &mut Diagram) -> bool {
        let Some(tx) = self.done.pop() else {
            return false;
        };
        for edit in tx.edits.iter().rev() {
            edit.revert(diagram);
        }
        settle(diagram, &tx);
        self.undone.push(tx);
        true
    }

    /// Re-applies the most recently undone transaction.
    pub fn redo(&mut self, diagram: &mut Diagram) -> bool {
        let Some(tx) = self.undone.pop() else {
            return false;
        };
        for edit in &tx.edits {
            edit.apply(diagram);
        }
        settle(diagram, &tx);
        self.done.push(tx);
        true
    }
}

/// Restores derived state after a replay: child order follows the restored
/// positions, stacks and components regain their sizes, routes follow their
/// endpoints.
fn settle(diagram: &mut Diagram, tx: &Transaction) {
    let mut touched: Vec<ItemId> = tx.edits.iter().flat_map(Edit::touched).collect();
    touched.sort();
    touched.dedup();

    let mut columns_dirty = false;
    for id in &touched {
        let Some(item) = diagram.item(*id) else {
            continue;
        };
        match (item.kind(), item.owner) {
            (ItemKind::Column, _) => columns_dirty = true,
            (ItemKind::Endpoint, Some(owner)) => {
                if diagram.item(owner).is_some_and(|o| o.kind() == ItemKind::Component) {
                    diagram.sort_ports(owner);
                    diagram.update_component_size(owner);
                } else {
                    diagram.sort_stack(owner);
                    diagram.update_stack_geometry(owner);
                }
            }
            (_, Some(owner)) => {
                diagram.sort_stack(owner);
                diagram.restack(owner);
                diagram.update_stack_geometry(owner);
            }
            (_, None) => {}
        }
    }
    if columns_dirty {
        diagram.sort_columns();
    }
    for id in touched {
        diagram.reroute_item(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::endpoint::{EndpointType, InterfaceEndpoint, ServiceInterface, ServiceRole};
    use crate::item::ComponentInstance;
    use blueprint_core::design::ColumnContent;

    fn setup() -> (Diagram, ItemId, ItemId, ItemId) {
        let mut d = Diagram::new(LayoutConfig::default());
        let hw = d.add_column("HW", ColumnContent::Components);
        let a = d.create_component("a", ComponentInstance::draft());
        d.add_item(hw, a, false).unwrap();
        let b = d.create_component("b", ComponentInstance::draft());
        d.add_item(hw, b, false).unwrap();
        (d, hw, a, b)
    }

    #[test]
    fn empty_and_noop_transactions_are_dropped() {
        let mut log = CommandLog::new();
        log.commit(Transaction::new());

        let mut tx = Transaction::new();
        tx.push(Edit::Move {
            item: ItemId::new(0),
            old: Point::new(1.0, 1.0),
            new: Point::new(1.0, 1.0),
        });
        assert!(tx.is_empty());
        log.commit(tx);

        assert!(!log.can_undo());
    }

    #[test]
    fn undo_restores_position_and_order() {
        let (mut d, hw, a, b) = setup();
        let old_a = d.item(a).unwrap().pos;
        let old_b = d.item(b).unwrap().pos;

        // Drag a below b.
        let mut tx = Transaction::new();
        if let Some(it) = d.item_mut(a) {
            it.pos.y = 400.0;
        }
        d.on_move_item(a);
        d.settle_item(a);
        tx.push(Edit::Move {
            item: a,
            old: old_a,
            new: d.item(a).unwrap().pos,
        });
        tx.push(Edit::Move {
            item: b,
            old: old_b,
            new: d.item(b).unwrap().pos,
        });

        let mut log = CommandLog::new();
        log.commit(tx);

        assert!(log.undo(&mut d));
        assert_eq!(d.item(a).unwrap().pos, old_a);
        assert_eq!(d.item(b).unwrap().pos, old_b);
        let stack = d.item(hw).unwrap().as_stack().unwrap();
        assert_eq!(stack.children, vec![a, b]);

        assert!(log.redo(&mut d));
        let stack = d.item(hw).unwrap().as_stack().unwrap();
        assert_eq!(stack.children, vec![b, a]);
    }

    #[test]
    fn undo_removed_item_comes_back_in_its_slot() {
        let (mut d, hw, a, b) = setup();

        let mut tx = Transaction::new();
        let at = d.detach_item(a).unwrap();
        tx.push(Edit::RemoveItem { item: a, at });

        let mut log = CommandLog::new();
        log.commit(tx);
        assert!(!d.is_attached(a));

        log.undo(&mut d);
        assert!(d.is_attached(a));
        let stack = d.item(hw).unwrap().as_stack().unwrap();
        assert_eq!(stack.children, vec![a, b]);
        assert_eq!(d.item(a).unwrap().pos.y, 60.0);
    }

    #[test]
    fn undo_of_connection_restores_adopted_type_state() {
        let (mut d, _, a, b) = setup();
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

        let mut tx = Transaction::new();
        let before = d.endpoint_state(pb).unwrap();
        let id = d.connect_ends(pa, pb).unwrap();
        tx.push(Edit::AddConnection {
            id,
            connection: d.connection(id).unwrap().clone(),
        });
        tx.push(Edit::Retype {
            endpoint: pb,
            old: before,
            new: d.endpoint_state(pb).unwrap(),
        });

        let mut log = CommandLog::new();
        log.commit(tx);

        log.undo(&mut d);
        assert!(d.connection(id).is_none());
        assert!(d.item(pb).unwrap().as_endpoint().unwrap().ty.is_undefined());

        log.redo(&mut d);
        assert!(d.connection(id).is_some());
        let ep = d.item(pb).unwrap().as_endpoint().unwrap();
        assert_eq!(ep.connections, vec![id]);
        assert_eq!(ep.ty.as_service().unwrap().role, ServiceRole::Requester);
    }

    #[test]
    fn new_commit_discards_the_redo_stack() {
        let (mut d, _, a, _) = setup();
        let old = d.item(a).unwrap().pos;

        let mut tx = Transaction::new();
        if let Some(it) = d.item_mut(a) {
            it.pos.y += 100.0;
        }
        tx.push(Edit::Move {
            item: a,
            old,
            new: d.item(a).unwrap().pos,
        });
        let mut log = CommandLog::new();
        log.commit(tx.clone());
        log.undo(&mut d);
        assert!(log.can_redo());

        log.commit(tx);
        assert!(!log.can_redo());
    }
}
