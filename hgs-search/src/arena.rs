use crate::engine::{Engine, NodeId, RouteId};
use crate::registry::{Owner, OwnershipRegistry};
use crate::route::Route;
use crate::{HashMap, HashSet};
use anyhow::{anyhow, Result};
use hgs_structs::{ProblemData, Solution, SolutionRoute};
use tracing::{debug, trace};

/// Host handle to a route. Each handle keeps the route (and the nodes in its
/// backing store) alive; releasing the last one tears the route down.
#[derive(Debug)]
#[must_use = "route handles must be released through Arena::release_route"]
pub struct RouteHandle {
    id: RouteId,
}

impl RouteHandle {
    pub fn id(&self) -> RouteId {
        self.id
    }
}

/// Host handle to a node. While the node belongs to a route, every live
/// handle to it holds that route, so the node stays alive even if the caller
/// drops its route handles first. The hold follows the node when it moves.
#[derive(Debug)]
#[must_use = "node handles must be released through Arena::release_node"]
pub struct NodeHandle {
    id: NodeId,
}

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Backing store of one route: the nodes it owns plus its reference counts.
#[derive(Debug, Default)]
pub(crate) struct RouteStore {
    pub owned: Vec<NodeId>,
    /// Live route handles.
    pub refs: usize,
    /// Live node handles to nodes held by this route, depots included.
    pub held: usize,
}

impl RouteStore {
    fn is_unreferenced(&self) -> bool {
        self.refs == 0 && self.held == 0
    }
}

/// Node and route arena. The engine holds structural truth (visit
/// sequences); the arena partitions every node into either the host set or
/// exactly one route store, and the registry mirrors that partition.
pub struct Arena<'a> {
    pub(crate) engine: Engine<'a>,
    pub(crate) registry: OwnershipRegistry,
    pub(crate) stores: HashMap<RouteId, RouteStore>,
    pub(crate) host: HashSet<NodeId>,
    handles: HashMap<NodeId, usize>,
}

impl<'a> Arena<'a> {
    pub fn new(data: &'a ProblemData) -> Self {
        Self {
            engine: Engine::new(data),
            registry: OwnershipRegistry::new(),
            stores: HashMap::default(),
            host: HashSet::default(),
            handles: HashMap::default(),
        }
    }

    pub fn data(&self) -> &'a ProblemData {
        self.engine.data
    }

    pub fn engine(&self) -> &Engine<'a> {
        &self.engine
    }

    /// Direct access for ownership-agnostic mutators such as the two-route
    /// operators. Every route pair touched this way must be reconciled
    /// before ownership is queried again.
    pub fn engine_mut(&mut self) -> &mut Engine<'a> {
        &mut self.engine
    }

    pub fn registry(&self) -> &OwnershipRegistry {
        &self.registry
    }

    pub fn owner(&self, node: NodeId) -> Option<Owner> {
        self.registry.query(node)
    }

    pub fn route(&self, id: RouteId) -> Result<&Route> {
        self.engine
            .route(id)
            .ok_or_else(|| anyhow!("Route {:?} has been released", id))
    }

    pub(crate) fn check_node(&self, id: NodeId) -> Result<()> {
        if self.engine.nodes.contains(id.0) {
            Ok(())
        } else {
            Err(anyhow!("Node {:?} has been released", id))
        }
    }

    /// Nodes owned by the route's backing store.
    pub fn store(&self, id: RouteId) -> Result<&[NodeId]> {
        self.stores
            .get(&id)
            .map(|store| store.owned.as_slice())
            .ok_or_else(|| anyhow!("Route {:?} has been released", id))
    }

    /// Client nodes found by walking the route's visit sequence.
    pub fn scan(&self, id: RouteId) -> Result<Vec<NodeId>> {
        Ok(self.route(id)?.clients().to_vec())
    }

    /// True when the route's visit sequence and backing store hold the same
    /// nodes.
    pub fn is_reconciled(&self, id: RouteId) -> Result<bool> {
        let scanned: HashSet<NodeId> = self.route(id)?.clients().iter().copied().collect();
        let owned = self.store(id)?;
        Ok(owned.len() == scanned.len() && owned.iter().all(|n| scanned.contains(n)))
    }

    pub fn add_route(&mut self, vehicle_type: usize, idx: usize) -> Result<RouteHandle> {
        let data = self.engine.data;
        let vt = data
            .vehicle_types()
            .get(vehicle_type)
            .ok_or_else(|| anyhow!("Unknown vehicle type {}", vehicle_type))?;

        let start = self.engine.add_node(vt.start_depot);
        let end = self.engine.add_node(vt.end_depot);
        let engine = &mut self.engine;
        let nodes = &mut engine.nodes;
        let key = engine
            .routes
            .insert_with(|key| Route::new(RouteId(key), idx, vehicle_type, start, end, nodes));
        let id = RouteId(key);
        if let Some((route, nodes)) = self.engine.route_mut(id) {
            route.update(nodes, data);
        }
        self.stores.insert(
            id,
            RouteStore {
                owned: Vec::new(),
                refs: 1,
                held: 0,
            },
        );
        debug!("created route {:?} (vehicle type {}, index {})", id, vehicle_type, idx);
        Ok(RouteHandle { id })
    }

    pub fn share_route(&mut self, handle: &RouteHandle) -> RouteHandle {
        self.store_mut(handle.id).refs += 1;
        RouteHandle { id: handle.id }
    }

    pub fn release_route(&mut self, handle: RouteHandle) {
        self.store_mut(handle.id).refs -= 1;
        self.settle(handle.id);
    }

    fn store_mut(&mut self, id: RouteId) -> &mut RouteStore {
        match self.stores.get_mut(&id) {
            Some(store) => store,
            None => panic!("Store of {:?} has been released", id),
        }
    }

    /// Route that live handles to `node` keep alive: the owning route of a
    /// client, the bounded route of a depot, none for a standalone node.
    pub fn holder(&self, node: NodeId) -> Option<RouteId> {
        match self.registry.query(node) {
            Some(Owner::Route(route)) => Some(route),
            Some(Owner::Standalone) => None,
            None => self.engine.node(node).and_then(|n| n.route),
        }
    }

    /// Moves the holds of every live handle to `node` from one route to
    /// another. Call once the node's ownership has changed, then `settle`
    /// the route it left.
    pub(crate) fn move_holds(&mut self, node: NodeId, from: Option<RouteId>, to: Option<RouteId>) {
        let count = self.handles.get(&node).copied().unwrap_or(0);
        if count == 0 || from == to {
            return;
        }
        if let Some(from) = from {
            let store = self.store_mut(from);
            store.held = match store.held.checked_sub(count) {
                Some(held) => held,
                None => panic!("{:?} holds fewer handles than {:?} has", from, node),
            };
        }
        if let Some(to) = to {
            self.store_mut(to).held += count;
        }
    }

    /// Tears the route down once neither route handles nor node handles
    /// reference it.
    pub(crate) fn settle(&mut self, id: RouteId) {
        if self.stores.get(&id).is_some_and(RouteStore::is_unreferenced) {
            self.teardown(id);
        }
    }

    /// Destroys a route whose last handle was released. The visit sequence
    /// is cleared while every node is still alive; only then are the depots
    /// and the nodes of the backing store freed.
    fn teardown(&mut self, id: RouteId) {
        let store = match self.stores.remove(&id) {
            Some(store) => store,
            None => panic!("Tearing down released route {:?}", id),
        };

        let (start, end) = match self.engine.route_mut(id) {
            Some((route, nodes)) => {
                route.clear(nodes);
                (route.start_depot(), route.end_depot())
            }
            None => panic!("Route {:?} missing from engine", id),
        };
        self.engine.routes.remove(id.0);
        self.engine.nodes.remove(start.0);
        self.engine.nodes.remove(end.0);

        for &node in &store.owned {
            match self.registry.forget(node) {
                Owner::Route(owner) if owner == id => {}
                owner => panic!(
                    "Node {:?} in store of {:?} is registered to {:?}",
                    node, id, owner
                ),
            }
            self.engine.nodes.remove(node.0);
        }
        debug!("released route {:?} and {} owned nodes", id, store.owned.len());
    }

    /// Creates a standalone node held by the host.
    pub fn add_node(&mut self, location: usize) -> Result<NodeHandle> {
        let data = self.engine.data;
        if location >= data.num_locations() || data.is_depot(location) {
            return Err(anyhow!("Location {} is not a client", location));
        }
        let id = self.engine.add_node(location);
        self.registry.register_standalone(id);
        self.host.insert(id);
        self.handles.insert(id, 1);
        trace!("created standalone node {:?} at location {}", id, location);
        Ok(NodeHandle { id })
    }

    /// Creates a node directly inside the route's backing store and appends
    /// it to the route's visits.
    pub fn add_route_node(&mut self, route: &RouteHandle, location: usize) -> Result<NodeHandle> {
        self.route(route.id)?;
        let handle = self.add_node(location)?;
        if let Err(e) = self.append(route.id, handle.id) {
            self.release_node(handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Fresh host handle to a live node.
    pub(crate) fn adopt(&mut self, id: NodeId) -> NodeHandle {
        *self.handles.entry(id).or_insert(0) += 1;
        if let Some(route) = self.holder(id) {
            self.store_mut(route).held += 1;
        }
        NodeHandle { id }
    }

    pub fn share_node(&mut self, handle: &NodeHandle) -> NodeHandle {
        self.adopt(handle.id)
    }

    /// Handle to the node at `idx` of a route (depots included). The handle
    /// holds the route while the node stays in it.
    pub fn node_at(&mut self, route: RouteId, idx: usize) -> Result<NodeHandle> {
        let r = self.route(route)?;
        let id = r.visit(idx).ok_or_else(|| {
            anyhow!(
                "Index {} out of range for route with {} clients",
                idx,
                r.len()
            )
        })?;
        Ok(self.adopt(id))
    }

    /// Drops a host handle. A standalone node dies with its last handle;
    /// a route-held node is freed by its route once nothing references it.
    pub fn release_node(&mut self, handle: NodeHandle) {
        let remaining = match self.handles.get_mut(&handle.id) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => panic!("Releasing unknown node handle {:?}", handle.id),
        };
        if remaining == 0 {
            self.handles.remove(&handle.id);
        }
        match self.holder(handle.id) {
            Some(route) => {
                self.store_mut(route).held -= 1;
                self.settle(route);
            }
            None if remaining == 0 => {
                if !self.host.remove(&handle.id) {
                    panic!("Standalone node {:?} missing from host set", handle.id);
                }
                match self.registry.forget(handle.id) {
                    Owner::Standalone => {}
                    owner => panic!(
                        "Host-held node {:?} is registered to {:?}",
                        handle.id, owner
                    ),
                }
                self.engine.nodes.remove(handle.id.0);
                trace!("released standalone node {:?}", handle.id);
            }
            None => {}
        }
    }

    pub fn num_routes(&self) -> usize {
        self.stores.len()
    }

    /// Panics unless every registered node sits in exactly one partition
    /// (the host set or a single route store) that agrees with the registry,
    /// and every route's hold count matches the live handles it holds.
    pub fn check_invariants(&self) {
        let mut seen: HashMap<NodeId, RouteId> = HashMap::default();
        for (&route, store) in &self.stores {
            for &node in &store.owned {
                if let Some(other) = seen.insert(node, route) {
                    panic!("Node {:?} owned by both {:?} and {:?}", node, other, route);
                }
                assert!(
                    !self.host.contains(&node),
                    "Node {:?} owned by {:?} and by the host",
                    node,
                    route
                );
                assert_eq!(self.registry.query(node), Some(Owner::Route(route)));
            }
        }
        for &node in &self.host {
            assert_eq!(self.registry.query(node), Some(Owner::Standalone));
        }
        for (node, owner) in self.registry.iter() {
            match owner {
                Owner::Standalone => assert!(
                    self.host.contains(&node),
                    "Standalone node {:?} missing from host set",
                    node
                ),
                Owner::Route(route) => assert_eq!(
                    seen.get(&node),
                    Some(&route),
                    "Node {:?} registered to {:?} but not in its store",
                    node,
                    route
                ),
            }
            assert!(self.engine.nodes.contains(node.0), "Orphaned record for {:?}", node);
        }

        let mut held: HashMap<RouteId, usize> = HashMap::default();
        for (&node, &count) in &self.handles {
            assert!(count > 0, "Empty handle count for {:?}", node);
            assert!(self.engine.nodes.contains(node.0), "Live handle to released {:?}", node);
            if let Some(route) = self.holder(node) {
                *held.entry(route).or_insert(0) += count;
            }
        }
        for (&route, store) in &self.stores {
            assert_eq!(
                store.held,
                held.get(&route).copied().unwrap_or(0),
                "Hold count of {:?} disagrees with its live node handles",
                route
            );
            assert!(!store.is_unreferenced(), "Unreferenced route {:?} still alive", route);
        }
    }

    /// Builds one route per solution route, in order.
    pub fn load(&mut self, solution: &Solution) -> Result<Vec<RouteHandle>> {
        solution.verify(self.engine.data)?;
        let mut handles = Vec::with_capacity(solution.routes.len());
        for (idx, planned) in solution.routes.iter().enumerate() {
            let route = self.add_route(planned.vehicle_type, idx)?;
            for &location in &planned.visits {
                let node = self.add_route_node(&route, location)?;
                self.release_node(node);
            }
            handles.push(route);
        }
        Ok(handles)
    }

    /// Current visits of the given routes, in handle order. Empty routes are
    /// kept so indices line up with the handles.
    pub fn solution(&self, routes: &[RouteHandle]) -> Result<Solution> {
        let mut out = Vec::with_capacity(routes.len());
        for handle in routes {
            let route = self.route(handle.id)?;
            let visits = route
                .clients()
                .iter()
                .map(|&n| self.engine.node(n).map(|node| node.location))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| anyhow!("Route {:?} refers to released nodes", handle.id))?;
            out.push(SolutionRoute {
                vehicle_type: route.vehicle_type(),
                visits,
            });
        }
        Ok(Solution { routes: out })
    }
}
