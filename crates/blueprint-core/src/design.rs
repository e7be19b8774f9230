//! The persisted shape of a diagram.
//!
//! A [`Design`] is what the diagram controller consumes on load and
//! reconstitutes on save: one record per component instance, per top-level
//! interface, per connection, and per column. It is a plain value — no
//! behavior, no references into the live diagram — so it can be serialized,
//! diffed, and compared in tests.
//!
//! Field conventions:
//!
//! - Positions are scene coordinates for instances and interfaces, and local
//!   (owner-relative) coordinates for per-endpoint positions on an instance.
//! - A missing instance position means "auto-place on load".
//! - An [`EndpointRef`] with no instance names a hierarchical interface on a
//!   column; a connection is hierarchical exactly when either end does.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::vlnv::Vlnv;

/// What a column is configured to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnContent {
    /// Component instances, stacked vertically with fixed spacing.
    Components,
    /// Hierarchical interface items, placed freely with collision avoidance.
    Io,
}

/// Item kinds a column accepts, stored as independent flags so that saved
/// designs survive future kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedItems {
    pub components: bool,
    pub interfaces: bool,
}

impl AllowedItems {
    /// The default policy for a content type.
    pub fn for_content(content: ColumnContent) -> Self {
        match content {
            ColumnContent::Components => AllowedItems {
                components: true,
                interfaces: false,
            },
            ColumnContent::Io => AllowedItems {
                components: false,
                interfaces: true,
            },
        }
    }
}

/// One top-level column of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub name: String,
    pub content: ColumnContent,
    pub allowed: AllowedItems,
    pub width: f32,
}

/// One component instance in the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Unique within the design.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Reference to the component definition in the library. `None` for draft
    /// (unpackaged) instances.
    pub component_ref: Option<Vlnv>,
    /// Configurable element values keyed by parameter name.
    pub configurable_values: IndexMap<String, String>,
    /// Scene position; `None` means auto-place.
    pub position: Option<Point>,
    /// Per-endpoint custom positions, local to the instance.
    pub endpoint_positions: IndexMap<String, Point>,
    /// For software instances: name of the hardware instance this one is
    /// mapped onto, placing it inside that instance's stack.
    pub mapped_to: Option<String>,
    pub imported: bool,
}

impl InstanceRecord {
    /// A minimal record with just a name, for building designs in tests and
    /// for placeholder instances.
    pub fn named(name: impl Into<String>) -> Self {
        InstanceRecord {
            name: name.into(),
            display_name: String::new(),
            description: String::new(),
            component_ref: None,
            configurable_values: IndexMap::new(),
            position: None,
            endpoint_positions: IndexMap::new(),
            mapped_to: None,
            imported: false,
        }
    }
}

/// One top-level interface item living on an IO column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub position: Point,
    /// Unit direction vector; affects routing and label placement.
    pub direction: Point,
}

/// One end of a connection: an endpoint on an instance, or a hierarchical
/// interface when `instance` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRef {
    pub instance: Option<String>,
    pub endpoint: String,
}

impl EndpointRef {
    pub fn on_instance(instance: impl Into<String>, endpoint: impl Into<String>) -> Self {
        EndpointRef {
            instance: Some(instance.into()),
            endpoint: endpoint.into(),
        }
    }

    pub fn hierarchical(endpoint: impl Into<String>) -> Self {
        EndpointRef {
            instance: None,
            endpoint: endpoint.into(),
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        self.instance.is_none()
    }
}

/// One connection between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub name: String,
    pub from: EndpointRef,
    pub to: EndpointRef,
    /// Ordered polyline in scene coordinates. May be empty, in which case the
    /// route is derived from the endpoint positions on load.
    pub route: Vec<Point>,
    pub imported: bool,
}

impl ConnectionRecord {
    /// True when either end references a hierarchical interface.
    pub fn is_hierarchical(&self) -> bool {
        self.from.is_hierarchical() || self.to.is_hierarchical()
    }
}

/// A complete design document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub columns: Vec<ColumnRecord>,
    pub instances: Vec<InstanceRecord>,
    pub interfaces: Vec<InterfaceRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl Design {
    /// Looks up an instance record by name.
    pub fn instance(&self, name: &str) -> Option<&InstanceRecord> {
        self.instances.iter().find(|i| i.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_items_follow_content_type() {
        let comp = AllowedItems::for_content(ColumnContent::Components);
        assert!(comp.components && !comp.interfaces);

        let io = AllowedItems::for_content(ColumnContent::Io);
        assert!(!io.components && io.interfaces);
    }

    #[test]
    fn connection_hierarchy_classification() {
        let app = ConnectionRecord {
            name: "c1".into(),
            from: EndpointRef::on_instance("a", "p1"),
            to: EndpointRef::on_instance("b", "p2"),
            route: vec![],
            imported: false,
        };
        assert!(!app.is_hierarchical());

        let hier = ConnectionRecord {
            name: "c2".into(),
            from: EndpointRef::on_instance("a", "p1"),
            to: EndpointRef::hierarchical("top_if"),
            route: vec![],
            imported: false,
        };
        assert!(hier.is_hierarchical());
    }

    #[test]
    fn instance_lookup_by_name() {
        let mut design = Design::default();
        design.instances.push(InstanceRecord::named("cpu"));
        design.instances.push(InstanceRecord::named("dsp"));

        assert!(design.instance("dsp").is_some());
        assert!(design.instance("gpu").is_none());
    }
}
