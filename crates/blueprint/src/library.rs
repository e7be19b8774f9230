//! Component library access.
//!
//! The diagram does not read component documents itself; the host hands it a
//! [`LibraryService`] and the loader resolves every instance's reference
//! through it. An unresolved reference degrades to a placeholder draft
//! instance rather than failing the load.

use blueprint_core::geometry::Point;
use blueprint_core::vlnv::Vlnv;

use crate::endpoint::EndpointType;

/// Whether a component definition describes hardware or software.
///
/// Hardware instances accept software components mapped onto them; software
/// instances do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Hardware,
    Software,
}

/// One interface declared by a component definition.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDefinition {
    pub name: String,
    pub ty: EndpointType,
    /// Preferred local position on the instance; `None` stacks the port on
    /// the right edge.
    pub default_position: Option<Point>,
}

impl InterfaceDefinition {
    pub fn new(name: impl Into<String>, ty: EndpointType) -> Self {
        InterfaceDefinition {
            name: name.into(),
            ty,
            default_position: None,
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.default_position = Some(position);
        self
    }
}

/// A resolved component document: what the loader needs to materialize an
/// instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    pub vlnv: Vlnv,
    pub kind: ComponentKind,
    pub interfaces: Vec<InterfaceDefinition>,
}

impl ComponentDefinition {
    pub fn new(vlnv: Vlnv, kind: ComponentKind) -> Self {
        ComponentDefinition {
            vlnv,
            kind,
            interfaces: Vec::new(),
        }
    }

    pub fn with_interface(mut self, interface: InterfaceDefinition) -> Self {
        self.interfaces.push(interface);
        self
    }
}

/// Resolves component references for the loader.
pub trait LibraryService {
    /// The definition behind a reference, or `None` when the library does not
    /// contain it.
    fn resolve(&self, vlnv: &Vlnv) -> Option<ComponentDefinition>;
}

/// An in-memory library, for tests and embedded hosts.
#[derive(Debug, Default)]
pub struct MemoryLibrary {
    components: Vec<ComponentDefinition>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        MemoryLibrary::default()
    }

    pub fn insert(&mut self, definition: ComponentDefinition) {
        self.components.push(definition);
    }
}

impl LibraryService for MemoryLibrary {
    fn resolve(&self, vlnv: &Vlnv) -> Option<ComponentDefinition> {
        self.components.iter().find(|c| &c.vlnv == vlnv).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_library_resolves_inserted_definitions() {
        let vlnv: Vlnv = "acme:lib:cpu:1.0".parse().unwrap();
        let mut lib = MemoryLibrary::new();
        lib.insert(ComponentDefinition::new(vlnv.clone(), ComponentKind::Hardware));

        assert!(lib.resolve(&vlnv).is_some());
        let missing: Vlnv = "acme:lib:gpu:1.0".parse().unwrap();
        assert!(lib.resolve(&missing).is_none());
    }
}
