use crate::engine::{NodeId, RouteId};
use crate::HashMap;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    /// Held by the host, outside of any route.
    Standalone,
    /// Held by the backing store of this route.
    Route(RouteId),
}

/// Who owns each node. Pure bookkeeping: it never frees anything, and every
/// precondition violation is a bug in the caller, so it panics.
#[derive(Debug, Default)]
pub struct OwnershipRegistry {
    owners: HashMap<NodeId, Owner>,
}

impl OwnershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_standalone(&mut self, node: NodeId) {
        if let Some(owner) = self.owners.insert(node, Owner::Standalone) {
            panic!("Node {:?} is already registered ({:?})", node, owner);
        }
    }

    pub fn register_in_route(&mut self, node: NodeId, route: RouteId) {
        let owner = match self.owners.get_mut(&node) {
            Some(owner) => owner,
            None => panic!("Node {:?} is not registered", node),
        };
        if *owner == Owner::Route(route) {
            panic!("Node {:?} is already owned by route {:?}", node, route);
        }
        *owner = Owner::Route(route);
    }

    pub fn query(&self, node: NodeId) -> Option<Owner> {
        self.owners.get(&node).copied()
    }

    /// Drops the record of a node that is being destroyed.
    pub fn forget(&mut self, node: NodeId) -> Owner {
        match self.owners.remove(&node) {
            Some(owner) => owner,
            None => panic!("Node {:?} is not registered", node),
        }
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Owner)> + '_ {
        self.owners.iter().map(|(&node, &owner)| (node, owner))
    }
}
