//! Diagram items and the arena they live in.
//!
//! Every visual element — column, component instance, endpoint — is an
//! [`Item`] stored in the diagram's arena and addressed by [`ItemId`].
//! Containment is expressed by id: an item records its owner, a stack records
//! its children in visual order. No item holds a reference to another item,
//! so the whole scene is a plain value that can be cloned, diffed, and
//! replayed by the command log.
//!
//! ```text
//!   Diagram
//!     ├── Column "HW"            ItemBody::Column
//!     │     ├── Component "cpu"  ItemBody::Component
//!     │     │     ├── port "irq" ItemBody::Endpoint (left side)
//!     │     │     └── port "bus" ItemBody::Endpoint (right side)
//!     │     └── Component "mem"
//!     └── Column "IO"
//!           └── interface "uart" ItemBody::Endpoint (hierarchical)
//! ```
//!
//! Code that needs to know what an item is goes through [`Item::kind`] and
//! the `as_*` capability accessors rather than matching on [`ItemBody`]
//! directly; most callers only care whether an item can stack children or
//! carry a connection.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use blueprint_core::design::{AllowedItems, ColumnContent};
use blueprint_core::geometry::{Bounds, Point, Size};
use blueprint_core::vlnv::Vlnv;

use crate::endpoint::InterfaceEndpoint;

/// Identifier of an item in the diagram arena.
///
/// Ids are allocated once per diagram and never reused, so an id held by an
/// undo log entry stays meaningful for the life of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    pub(crate) fn new(raw: u32) -> Self {
        ItemId(raw)
    }

    pub(crate) fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse classification of an item, used for hit-test priority and stack
/// policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Column,
    Component,
    Endpoint,
}

/// How a stack arranges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStyle {
    /// Children packed top-down with uniform spacing; dragging reorders.
    Stacked,
    /// Children keep their own positions; overlaps are pushed apart.
    Collision,
}

/// Child list and admission policy of a stacking item.
///
/// Children are kept sorted by vertical position; the layout functions in
/// [`crate::layout`] maintain that order on every move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackData {
    pub children: Vec<ItemId>,
    pub allowed: AllowedItems,
    pub style: StackStyle,
}

impl StackData {
    pub fn new(allowed: AllowedItems, style: StackStyle) -> Self {
        StackData {
            children: Vec::new(),
            allowed,
            style,
        }
    }

    /// Whether an item of `kind` may be admitted.
    pub fn admits(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Column => false,
            ItemKind::Component => self.allowed.components,
            ItemKind::Endpoint => self.allowed.interfaces,
        }
    }
}

/// Payload of a column item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
    pub content: ColumnContent,
    pub stack: StackData,
    pub width: f32,
}

impl ColumnData {
    pub fn new(content: ColumnContent, width: f32) -> Self {
        let style = match content {
            ColumnContent::Components => StackStyle::Stacked,
            ColumnContent::Io => StackStyle::Collision,
        };
        ColumnData {
            content,
            stack: StackData::new(AllowedItems::for_content(content), style),
            width,
        }
    }
}

/// Payload of a component instance item.
///
/// Ports live in the arena like any other item; the component only records
/// which side each one sits on. A hardware instance that maps software
/// components carries an inner stack for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub display_name: String,
    pub description: String,
    /// Reference to the component document, or `None` for a draft.
    pub component_ref: Option<Vlnv>,
    pub configurable_values: IndexMap<String, String>,
    /// Instance came in from the loaded design rather than user interaction.
    pub imported: bool,
    /// A packaged component has a definition document; its ports keep their
    /// types locked.
    pub packaged: bool,
    /// Ports on the left edge, top to bottom.
    pub left_ports: Vec<ItemId>,
    /// Ports on the right edge, top to bottom.
    pub right_ports: Vec<ItemId>,
    /// Present on hardware instances that accept mapped software components.
    pub mapping: Option<StackData>,
}

impl ComponentInstance {
    /// A draft instance with no backing document.
    pub fn draft() -> Self {
        ComponentInstance {
            display_name: String::new(),
            description: String::new(),
            component_ref: None,
            configurable_values: IndexMap::new(),
            imported: false,
            packaged: false,
            left_ports: Vec::new(),
            right_ports: Vec::new(),
            mapping: None,
        }
    }

    /// An instance backed by the referenced component document.
    pub fn packaged(component_ref: Vlnv) -> Self {
        ComponentInstance {
            component_ref: Some(component_ref),
            packaged: true,
            ..Self::draft()
        }
    }

    /// Enables software mapping onto this instance.
    pub fn with_mapping(mut self) -> Self {
        self.mapping = Some(StackData::new(
            AllowedItems {
                components: true,
                interfaces: false,
            },
            StackStyle::Stacked,
        ));
        self
    }
}

/// The kind-specific payload of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemBody {
    Column(ColumnData),
    Component(ComponentInstance),
    Endpoint(InterfaceEndpoint),
}

/// A diagram element in the arena.
///
/// `pos` is the top-left corner in the owner's local frame; columns have no
/// owner and their `pos` is in scene coordinates. Endpoint items use `pos` as
/// the glyph center on the component edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub pos: Point,
    pub size: Size,
    pub owner: Option<ItemId>,
    pub body: ItemBody,
}

impl Item {
    pub fn new(name: impl Into<String>, body: ItemBody) -> Self {
        Item {
            name: name.into(),
            pos: Point::default(),
            size: Size::default(),
            owner: None,
            body,
        }
    }

    pub fn with_pos(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn kind(&self) -> ItemKind {
        match &self.body {
            ItemBody::Column(_) => ItemKind::Column,
            ItemBody::Component(_) => ItemKind::Component,
            ItemBody::Endpoint(_) => ItemKind::Endpoint,
        }
    }

    /// The stack this item exposes for children, if any.
    ///
    /// Columns always stack; component instances only when they carry a
    /// software mapping.
    pub fn as_stack(&self) -> Option<&StackData> {
        match &self.body {
            ItemBody::Column(c) => Some(&c.stack),
            ItemBody::Component(c) => c.mapping.as_ref(),
            ItemBody::Endpoint(_) => None,
        }
    }

    pub fn as_stack_mut(&mut self) -> Option<&mut StackData> {
        match &mut self.body {
            ItemBody::Column(c) => Some(&mut c.stack),
            ItemBody::Component(c) => c.mapping.as_mut(),
            ItemBody::Endpoint(_) => None,
        }
    }

    pub fn as_endpoint(&self) -> Option<&InterfaceEndpoint> {
        match &self.body {
            ItemBody::Endpoint(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_endpoint_mut(&mut self) -> Option<&mut InterfaceEndpoint> {
        match &mut self.body {
            ItemBody::Endpoint(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentInstance> {
        match &self.body {
            ItemBody::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_component_mut(&mut self) -> Option<&mut ComponentInstance> {
        match &mut self.body {
            ItemBody::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnData> {
        match &self.body {
            ItemBody::Column(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_column_mut(&mut self) -> Option<&mut ColumnData> {
        match &mut self.body {
            ItemBody::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Bounds in the owner's local frame.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.pos, self.size)
    }
}
