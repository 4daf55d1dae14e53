use crate::route::Route;
use crate::slab::{Key, Slab};
use hgs_structs::ProblemData;
use std::fmt;

/// Stable identity of a node in the arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) Key);

/// Stable identity of a route in the arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) Key);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}v{}", self.0.index, self.0.generation)
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}v{}", self.0.index, self.0.generation)
    }
}

/// One visit to a location. `route` and `idx` describe where the node
/// currently sits structurally; they say nothing about ownership.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) location: usize,
    pub(crate) route: Option<RouteId>,
    pub(crate) idx: usize,
}

impl Node {
    pub fn location(&self) -> usize {
        self.location
    }

    pub fn route(&self) -> Option<RouteId> {
        self.route
    }

    /// Position in the route's visit sequence; 0 is the start depot.
    pub fn idx(&self) -> usize {
        self.idx
    }
}

pub type Nodes = Slab<Node>;

/// Structural truth: nodes and the routes' visit sequences. The engine has
/// no notion of ownership, so anything mutating it directly must be followed
/// by a reconciliation of the routes it touched.
pub struct Engine<'a> {
    pub(crate) data: &'a ProblemData,
    pub(crate) nodes: Nodes,
    pub(crate) routes: Slab<Route>,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(data: &'a ProblemData) -> Self {
        Self {
            data,
            nodes: Slab::default(),
            routes: Slab::default(),
        }
    }

    pub fn data(&self) -> &'a ProblemData {
        self.data
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0)
    }

    pub fn route_mut(&mut self, id: RouteId) -> Option<(&mut Route, &mut Slab<Node>)> {
        let route = self.routes.get_mut(id.0)?;
        Some((route, &mut self.nodes))
    }

    /// Two distinct routes plus node storage, for operators spanning a pair.
    pub(crate) fn route_pair_mut(
        &mut self,
        a: RouteId,
        b: RouteId,
    ) -> Option<(&mut Route, &mut Route, &mut Slab<Node>)> {
        let (ra, rb) = self.routes.get2_mut(a.0, b.0)?;
        Some((ra, rb, &mut self.nodes))
    }

    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &Route)> {
        self.routes.iter().map(|(key, route)| (RouteId(key), route))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub(crate) fn add_node(&mut self, location: usize) -> NodeId {
        NodeId(self.nodes.insert_with(|_| Node {
            location,
            route: None,
            idx: 0,
        }))
    }
}
