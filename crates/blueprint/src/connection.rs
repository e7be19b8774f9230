//! Connections between endpoints and their orthogonal routes.

use std::fmt;

use serde::{Deserialize, Serialize};

use blueprint_core::geometry::Point;

use crate::item::ItemId;

/// Identifier of a connection in the diagram.
///
/// Like item ids, connection ids are never reused, so undo log entries can
/// reinstate a deleted connection under its original id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u32);

impl ConnectionId {
    pub(crate) fn new(raw: u32) -> Self {
        ConnectionId(raw)
    }

    pub(crate) fn raw(self) -> u32 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn test_id(raw: u32) -> Self {
        ConnectionId(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}", self.0)
    }
}

/// A finalized connection between two endpoint items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    /// The two endpoint items joined by this connection.
    pub endpoints: (ItemId, ItemId),
    /// Orthogonal polyline in scene coordinates, endpoint to endpoint.
    pub route: Vec<Point>,
    /// Connection came in from the loaded design.
    pub imported: bool,
}

impl Connection {
    pub fn new(name: impl Into<String>, a: ItemId, b: ItemId) -> Self {
        Connection {
            name: name.into(),
            endpoints: (a, b),
            route: Vec::new(),
            imported: false,
        }
    }

    /// Given one endpoint of the connection, the other; `None` when `id` is
    /// not an endpoint of this connection.
    pub fn other(&self, id: ItemId) -> Option<ItemId> {
        if self.endpoints.0 == id {
            Some(self.endpoints.1)
        } else if self.endpoints.1 == id {
            Some(self.endpoints.0)
        } else {
            None
        }
    }
}

/// Derives an orthogonal route between two endpoints.
///
/// The route leaves each endpoint with a stub of `stub` along the endpoint's
/// direction vector, then meets at the midpoint between the stub ends:
///
/// ```text
///   a ──stub──┐
///             │
///             └──stub── b
/// ```
///
/// Hosts may replace the route with a hand-drawn one; this is the shape every
/// connection starts with and falls back to after an endpoint moves.
pub fn derive_route(a: Point, dir_a: Point, b: Point, dir_b: Point, stub: f32) -> Vec<Point> {
    let a1 = a.add(dir_a.scale(stub));
    let b1 = b.add(dir_b.scale(stub));
    let mid_x = (a1.x + b1.x) / 2.0;

    let mut route = vec![a, a1];
    if a1.y != b1.y {
        route.push(Point::new(mid_x, a1.y));
        route.push(Point::new(mid_x, b1.y));
    }
    route.push(b1);
    route.push(b);
    route
}
