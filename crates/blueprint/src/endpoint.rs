//! The typed-endpoint model.
//!
//! Every connection point on the diagram — a port on a component instance or
//! a hierarchical interface item on a column — is an [`InterfaceEndpoint`]
//! carrying an [`EndpointType`]. Two concrete families exist:
//!
//! - [`ServiceInterface`]: provider/requester dependencies. A provider serves
//!   any number of requesters in principle, but holds at most one connection
//!   on the diagram.
//! - [`ChannelInterface`]: typed message channels with a direction and an
//!   optional transfer-type tag. Channel endpoints are exclusive — one
//!   connection each.
//!
//! An endpoint starts `Undefined` and *temporary*. Connecting it to a typed
//! peer makes it adopt a derived definition (see
//! [`EndpointType::derived_for_peer`]); losing its last connection while still
//! temporary reverts it to `Undefined`. Giving it an explicit type locks the
//! type in and clears the temporary flag.
//!
//! The pairwise compatibility predicate lives here as [`compatible`]; identity
//! checks that need diagram context (self-connection, shared owner) are done
//! by the diagram before calling it. The predicate is symmetric by
//! construction.

use serde::{Deserialize, Serialize};

use blueprint_core::geometry::Point;
use blueprint_core::vlnv::Vlnv;

use crate::connection::ConnectionId;

/// Role of a service endpoint in the provider/requester dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceRole {
    Provider,
    Requester,
}

impl ServiceRole {
    /// The role a directly connected peer must have.
    pub fn complement(self) -> Self {
        match self {
            ServiceRole::Provider => ServiceRole::Requester,
            ServiceRole::Requester => ServiceRole::Provider,
        }
    }
}

/// Data flow direction of a channel endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelDirection {
    In,
    Out,
    InOut,
}

impl ChannelDirection {
    /// The direction a directly connected peer gets when adopting a
    /// definition from this end. `InOut` mirrors to itself.
    pub fn complement(self) -> Self {
        match self {
            ChannelDirection::In => ChannelDirection::Out,
            ChannelDirection::Out => ChannelDirection::In,
            ChannelDirection::InOut => ChannelDirection::InOut,
        }
    }
}

/// Concrete definition of a provider/requester service endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInterface {
    /// Reference to the service definition document; `None` while the
    /// endpoint is a draft without a chosen definition.
    pub service_type: Option<Vlnv>,
    pub role: ServiceRole,
}

/// Concrete definition of a typed-channel endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInterface {
    pub channel_type: Option<Vlnv>,
    /// Payload type tag; empty means unconstrained.
    pub transfer_type: String,
    pub direction: ChannelDirection,
}

/// The connection type of an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum EndpointType {
    #[default]
    Undefined,
    Service(ServiceInterface),
    Channel(ChannelInterface),
}

impl EndpointType {
    pub fn is_undefined(&self) -> bool {
        matches!(self, EndpointType::Undefined)
    }

    pub fn as_service(&self) -> Option<&ServiceInterface> {
        match self {
            EndpointType::Service(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&ChannelInterface> {
        match self {
            EndpointType::Channel(c) => Some(c),
            _ => None,
        }
    }

    /// The definition an undefined endpoint adopts when it connects to an
    /// endpoint of this type.
    ///
    /// Type tags are copied. Roles and directions pass through unchanged when
    /// the connection crosses the hierarchy boundary (`pass_through`) and are
    /// complemented otherwise (provider pairs with requester, in with out).
    pub fn derived_for_peer(&self, pass_through: bool) -> EndpointType {
        match self {
            EndpointType::Undefined => EndpointType::Undefined,
            EndpointType::Service(s) => EndpointType::Service(ServiceInterface {
                service_type: s.service_type.clone(),
                role: if pass_through {
                    s.role
                } else {
                    s.role.complement()
                },
            }),
            EndpointType::Channel(c) => EndpointType::Channel(ChannelInterface {
                channel_type: c.channel_type.clone(),
                transfer_type: c.transfer_type.clone(),
                direction: if pass_through {
                    c.direction
                } else {
                    c.direction.complement()
                },
            }),
        }
    }
}

/// A connection point: a port on a component or an interface item on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceEndpoint {
    pub ty: EndpointType,
    /// A temporary endpoint reverts to `Undefined` when its last connection
    /// goes away. Cleared by an explicit `set_type`.
    pub temporary: bool,
    /// True for top-level interface items living on an IO column.
    pub hierarchical: bool,
    /// Unit direction vector; affects routing and label placement.
    pub direction: Point,
    /// Connections attached to this endpoint.
    pub connections: Vec<ConnectionId>,
}

impl InterfaceEndpoint {
    /// A fresh undefined, temporary endpoint pointing along `direction`.
    pub fn undefined(hierarchical: bool, direction: Point) -> Self {
        InterfaceEndpoint {
            ty: EndpointType::Undefined,
            temporary: true,
            hierarchical,
            direction,
            connections: Vec::new(),
        }
    }

    /// An endpoint with a fixed concrete type, as created from a packaged
    /// component definition.
    pub fn typed(ty: EndpointType, hierarchical: bool, direction: Point) -> Self {
        InterfaceEndpoint {
            ty,
            temporary: false,
            hierarchical,
            direction,
            connections: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// True when this endpoint cannot accept any further connection.
    ///
    /// Channel endpoints are exclusive; a service provider holds at most one
    /// connection. Undefined endpoints never saturate — they may accumulate
    /// connections that all resolve when the type is chosen.
    pub fn is_saturated(&self) -> bool {
        match &self.ty {
            EndpointType::Undefined => false,
            EndpointType::Service(s) => s.role == ServiceRole::Provider && self.is_connected(),
            EndpointType::Channel(_) => self.is_connected(),
        }
    }

    /// Reverts a temporary endpoint with no remaining connections to
    /// `Undefined`. Called after a connection detaches.
    pub fn on_disconnect(&mut self) {
        if self.temporary && !self.is_connected() {
            self.ty = EndpointType::Undefined;
        }
    }
}

/// Pairwise compatibility of two endpoints, evaluated before a connection may
/// finalize. Symmetric: `compatible(a, b) == compatible(b, a)`.
///
/// Identity-level rules (self-connection, both ends on one component, two
/// hierarchical interfaces) are checked by the diagram, which has the
/// ownership context; this predicate covers type-level rules and exclusivity.
pub fn compatible(a: &InterfaceEndpoint, b: &InterfaceEndpoint) -> bool {
    // Exclusivity binds even against an undefined peer: a saturated endpoint
    // is never a valid target.
    if a.is_saturated() || b.is_saturated() {
        return false;
    }
    compatible_ignoring_saturation(a, b)
}

/// Type-level compatibility alone, for re-validating endpoints that already
/// hold the connection under scrutiny.
pub(crate) fn compatible_ignoring_saturation(a: &InterfaceEndpoint, b: &InterfaceEndpoint) -> bool {
    let crosses_hierarchy = a.hierarchical || b.hierarchical;

    match (&a.ty, &b.ty) {
        // An undefined side defers resolution to connect time.
        (EndpointType::Undefined, _) | (_, EndpointType::Undefined) => true,

        (EndpointType::Service(sa), EndpointType::Service(sb)) => {
            if let (Some(ta), Some(tb)) = (&sa.service_type, &sb.service_type)
                && ta != tb
            {
                return false;
            }

            if crosses_hierarchy {
                sa.role == sb.role
            } else {
                sa.role != sb.role
            }
        }

        (EndpointType::Channel(ca), EndpointType::Channel(cb)) => {
            if let (Some(ta), Some(tb)) = (&ca.channel_type, &cb.channel_type)
                && ta != tb
            {
                return false;
            }

            if !ca.transfer_type.is_empty()
                && !cb.transfer_type.is_empty()
                && ca.transfer_type != cb.transfer_type
            {
                return false;
            }

            if crosses_hierarchy {
                ca.direction == cb.direction
            } else {
                ca.direction == ChannelDirection::InOut
                    || cb.direction == ChannelDirection::InOut
                    || ca.direction != cb.direction
            }
        }

        // Both concrete, different families.
        _ => false,
    }
}
