use crate::engine::{Node, NodeId, Nodes, RouteId};
use crate::segment::{route_stats, RouteStats};
use anyhow::{anyhow, Result};
use hgs_structs::ProblemData;

/// One vehicle's itinerary. `visits[0]` and `visits[len + 1]` are the fixed
/// start and end depot nodes; everything in between is a client visit.
///
/// The primitives below only rewrite the visit sequence and the structural
/// `route`/`idx` fields of the nodes involved. Which route owns a node is
/// tracked elsewhere.
#[derive(Clone, Debug)]
pub struct Route {
    id: RouteId,
    idx: usize,
    vehicle_type: usize,
    visits: Vec<NodeId>,
    stats: RouteStats,
}

fn node_mut(nodes: &mut Nodes, id: NodeId) -> &mut Node {
    match nodes.get_mut(id.0) {
        Some(node) => node,
        None => panic!("Route refers to released node {:?}", id),
    }
}

impl Route {
    pub(crate) fn new(
        id: RouteId,
        idx: usize,
        vehicle_type: usize,
        start_depot: NodeId,
        end_depot: NodeId,
        nodes: &mut Nodes,
    ) -> Self {
        let mut route = Self {
            id,
            idx,
            vehicle_type,
            visits: vec![start_depot, end_depot],
            stats: RouteStats::default(),
        };
        route.renumber(nodes, 0);
        route
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn vehicle_type(&self) -> usize {
        self.vehicle_type
    }

    /// Number of client visits.
    pub fn len(&self) -> usize {
        self.visits.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node at `idx`, depots included.
    pub fn visit(&self, idx: usize) -> Option<NodeId> {
        self.visits.get(idx).copied()
    }

    pub fn start_depot(&self) -> NodeId {
        self.visits[0]
    }

    pub fn end_depot(&self) -> NodeId {
        self.visits[self.visits.len() - 1]
    }

    /// Client visits in order, depots excluded.
    pub fn clients(&self) -> &[NodeId] {
        &self.visits[1..self.visits.len() - 1]
    }

    pub fn visits(&self) -> &[NodeId] {
        &self.visits
    }

    pub fn stats(&self) -> &RouteStats {
        &self.stats
    }

    fn renumber(&self, nodes: &mut Nodes, from: usize) {
        for (idx, &id) in self.visits.iter().enumerate().skip(from) {
            let node = node_mut(nodes, id);
            node.route = Some(self.id);
            node.idx = idx;
        }
    }

    /// Inserts `id` just before the end depot.
    pub fn append(&mut self, nodes: &mut Nodes, id: NodeId) {
        let idx = self.visits.len() - 1;
        self.visits.insert(idx, id);
        self.renumber(nodes, idx);
    }

    /// Inserts `id` so that it ends up at position `idx`, which must lie in
    /// `1..=len + 1`.
    pub fn insert(&mut self, nodes: &mut Nodes, idx: usize, id: NodeId) -> Result<()> {
        if idx == 0 || idx > self.len() + 1 {
            return Err(anyhow!(
                "Insert position {} out of range for route with {} clients",
                idx,
                self.len()
            ));
        }
        debug_assert!(nodes.get(id.0).is_some_and(|n| n.route.is_none()));
        self.visits.insert(idx, id);
        self.renumber(nodes, idx);
        Ok(())
    }

    /// Removes the client at `idx`, which must lie in `1..=len`.
    pub fn remove(&mut self, nodes: &mut Nodes, idx: usize) -> Result<NodeId> {
        if idx == 0 || idx > self.len() {
            return Err(anyhow!(
                "Remove position {} out of range for route with {} clients",
                idx,
                self.len()
            ));
        }
        let id = self.visits.remove(idx);
        let node = node_mut(nodes, id);
        node.route = None;
        node.idx = 0;
        self.renumber(nodes, idx);
        Ok(id)
    }

    /// Removes all client visits, leaving only the depots.
    pub fn clear(&mut self, nodes: &mut Nodes) {
        let end = self.visits.len() - 1;
        for id in self.visits.drain(1..end) {
            let node = node_mut(nodes, id);
            node.route = None;
            node.idx = 0;
        }
        self.renumber(nodes, 1);
    }

    /// Recomputes positions and cached statistics.
    pub fn update(&mut self, nodes: &mut Nodes, data: &ProblemData) {
        self.renumber(nodes, 0);
        let locations: Vec<usize> = self
            .visits
            .iter()
            .map(|&id| node_mut(nodes, id).location)
            .collect();
        self.stats = route_stats(data, self.vehicle_type, &locations);
    }

    pub(crate) fn locations(&self, nodes: &Nodes) -> Vec<usize> {
        self.visits
            .iter()
            .filter_map(|&id| nodes.get(id.0).map(|n| n.location))
            .collect()
    }
}
