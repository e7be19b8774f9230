//! An embeddable system-design diagram editor core.
//!
//! Blueprint models the interactive part of a system-design editor — the
//! columns, component instances, ports and connections of a design diagram —
//! without rendering anything. A host embeds [`DiagramController`], feeds it
//! pointer gestures and a component library, drains its notification queue,
//! and draws whatever the [`Diagram`] currently holds.
//!
//! ```text
//!   host UI ──gestures──► DiagramController ──edits──► Diagram
//!      ▲                        │    │                    │
//!      └──── notifications ─────┘    └─── CommandLog ◄────┘
//! ```
//!
//! The crate splits along those seams:
//!
//! - [`diagram`]: the item arena and the structural rules (stacks, admission
//!   policies, endpoint compatibility, routing).
//! - [`layout`]: the pure stacking and collision algorithms.
//! - [`endpoint`]: the typed-endpoint model and its adoption/reversion rules.
//! - [`interaction`]: the Select/Connect/Draft pointer state machine.
//! - [`command`]: flat-edit transactions with undo/redo.
//! - [`controller`]: load/save against a [`blueprint_core::design::Design`]
//!   and the notification queue.
//! - [`library`]: the component-library seam the loader resolves through.
//!
//! Geometry, identifiers and the persisted design model live in
//! [`blueprint_core`].

pub mod command;
pub mod config;
pub mod connection;
pub mod controller;
pub mod diagram;
pub mod endpoint;
pub mod error;
pub mod interaction;
pub mod item;
pub mod layout;
pub mod library;

pub use command::{CommandLog, Edit, Transaction};
pub use config::LayoutConfig;
pub use connection::{Connection, ConnectionId};
pub use controller::{DiagramController, Notification};
pub use diagram::{Diagram, Placement, PortPlacement, PortSide, TypeState};
pub use endpoint::{
    ChannelDirection, ChannelInterface, EndpointType, InterfaceEndpoint, ServiceInterface,
    ServiceRole,
};
pub use error::BlueprintError;
pub use interaction::{Interaction, Mode, PointerButton, Selection};
pub use item::{ComponentInstance, Item, ItemBody, ItemId, ItemKind, StackData, StackStyle};
pub use library::{
    ComponentDefinition, ComponentKind, InterfaceDefinition, LibraryService, MemoryLibrary,
};
