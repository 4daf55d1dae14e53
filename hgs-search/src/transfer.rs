use crate::arena::Arena;
use crate::engine::{NodeId, RouteId};
use crate::registry::Owner;
use crate::NodeHandle;
use anyhow::{anyhow, Result};
use tracing::trace;

#[derive(Copy, Clone, Debug)]
enum Placement {
    At(usize),
    End,
}

impl<'a> Arena<'a> {
    /// Places `node` at position `idx` (in `1..=len + 1`) of `route`, taking
    /// it out of its previous route if it had one.
    pub fn insert(&mut self, route: RouteId, idx: usize, node: NodeId) -> Result<()> {
        self.place(route, Placement::At(idx), node)
    }

    /// Places `node` at the end of `route`, before the end depot.
    pub fn append(&mut self, route: RouteId, node: NodeId) -> Result<()> {
        self.place(route, Placement::End, node)
    }

    fn place(&mut self, route: RouteId, placement: Placement, node: NodeId) -> Result<()> {
        let target_len = self.route(route)?.len();
        self.check_node(node)?;
        let owner = self
            .registry
            .query(node)
            .ok_or_else(|| anyhow!("Node {:?} is a depot and cannot be moved", node))?;

        // Validate before touching anything so a bad index leaves no trace.
        let (max_idx, previous) = match owner {
            Owner::Route(old) if old == route => (target_len, Some(old)),
            Owner::Route(old) => (target_len + 1, Some(old)),
            Owner::Standalone => (target_len + 1, None),
        };
        let idx = match placement {
            Placement::At(idx) if idx == 0 || idx > max_idx => {
                return Err(anyhow!(
                    "Insert position {} out of range for route with {} clients",
                    idx,
                    target_len
                ))
            }
            Placement::At(idx) => idx,
            Placement::End => max_idx,
        };

        // Prepare: a node is never in two visit sequences at once.
        if let Some(old) = previous {
            let data = self.engine.data;
            let (old_route, nodes) = self
                .engine
                .route_mut(old)
                .ok_or_else(|| anyhow!("Route {:?} has been released", old))?;
            let current = match nodes.get(node.0) {
                Some(n) if n.route == Some(old) => n.idx,
                _ => panic!(
                    "Node {:?} is owned by {:?} but not in its visits; reconcile was skipped",
                    node, old
                ),
            };
            old_route.remove(nodes, current)?;
            if old != route {
                old_route.update(nodes, data);
            }
        }

        // Mutate.
        let data = self.engine.data;
        let (target, nodes) = self
            .engine
            .route_mut(route)
            .ok_or_else(|| anyhow!("Route {:?} has been released", route))?;
        target.insert(nodes, idx, node)?;
        target.update(nodes, data);

        // Complete: move the unique-ownership handle into the target store.
        // Live host handles to the node now hold the target route.
        match previous {
            Some(old) if old == route => {}
            Some(old) => {
                self.take_from_store(old, node);
                self.give_to_store(route, node);
                self.registry.register_in_route(node, route);
                self.move_holds(node, Some(old), Some(route));
                trace!("moved {:?} from {:?} to {:?} at {}", node, old, route, idx);
                self.settle(old);
            }
            None => {
                if !self.host.remove(&node) {
                    panic!("Standalone node {:?} missing from host set", node);
                }
                self.give_to_store(route, node);
                self.registry.register_in_route(node, route);
                self.move_holds(node, None, Some(route));
                trace!("moved standalone {:?} into {:?} at {}", node, route, idx);
            }
        }
        Ok(())
    }

    /// Takes the client at `idx` (in `1..=len`) out of `route` and hands it
    /// back to the host as a standalone node.
    pub fn remove(&mut self, route: RouteId, idx: usize) -> Result<NodeHandle> {
        let data = self.engine.data;
        let (r, nodes) = self
            .engine
            .route_mut(route)
            .ok_or_else(|| anyhow!("Route {:?} has been released", route))?;
        let node = r.remove(nodes, idx)?;
        r.update(nodes, data);

        match self.registry.forget(node) {
            Owner::Route(owner) if owner == route => {}
            owner => panic!(
                "Node {:?} removed from {:?} but registered to {:?}; reconcile was skipped",
                node, route, owner
            ),
        }
        self.take_from_store(route, node);
        self.registry.register_standalone(node);
        self.host.insert(node);
        self.move_holds(node, Some(route), None);
        trace!("removed {:?} from {:?}", node, route);
        let handle = self.adopt(node);
        self.settle(route);
        Ok(handle)
    }

    pub(crate) fn take_from_store(&mut self, route: RouteId, node: NodeId) {
        let store = match self.stores.get_mut(&route) {
            Some(store) => store,
            None => panic!("Store of {:?} has been released", route),
        };
        match store.owned.iter().position(|&n| n == node) {
            Some(pos) => {
                store.owned.swap_remove(pos);
            }
            None => panic!("Node {:?} is not in the store of {:?}", node, route),
        }
    }

    pub(crate) fn give_to_store(&mut self, route: RouteId, node: NodeId) {
        match self.stores.get_mut(&route) {
            Some(store) => store.owned.push(node),
            None => panic!("Store of {:?} has been released", route),
        }
    }
}
