use crate::arena::Arena;
use crate::engine::{NodeId, RouteId};
use crate::HashSet;
use anyhow::{anyhow, Result};
use tracing::debug;

impl<'a> Arena<'a> {
    /// Brings the backing stores of `a` and `b` back in line with their
    /// visit sequences after an operator moved nodes between them. Nodes in
    /// neither sequence are left where they are. Live handles to a moved
    /// node hold its new route from then on.
    ///
    /// Returns the number of nodes whose owner changed.
    pub fn reconcile(&mut self, a: RouteId, b: RouteId) -> Result<usize> {
        if a == b {
            self.route(a)?;
            return Ok(0);
        }
        let in_a: HashSet<NodeId> = self.route(a)?.clients().iter().copied().collect();
        let in_b: HashSet<NodeId> = self.route(b)?.clients().iter().copied().collect();

        let (store_a, store_b) = match (self.stores.get(&a), self.stores.get(&b)) {
            (Some(sa), Some(sb)) => (sa, sb),
            _ => return Err(anyhow!("Cannot reconcile released routes {:?}, {:?}", a, b)),
        };
        let a_to_b: Vec<NodeId> = store_a.owned.iter().copied().filter(|n| in_b.contains(n)).collect();
        let b_to_a: Vec<NodeId> = store_b.owned.iter().copied().filter(|n| in_a.contains(n)).collect();

        for &node in &a_to_b {
            self.take_from_store(a, node);
            self.give_to_store(b, node);
            self.registry.register_in_route(node, b);
            self.move_holds(node, Some(a), Some(b));
        }
        for &node in &b_to_a {
            self.take_from_store(b, node);
            self.give_to_store(a, node);
            self.registry.register_in_route(node, a);
            self.move_holds(node, Some(b), Some(a));
        }

        let moved = a_to_b.len() + b_to_a.len();
        if moved > 0 {
            debug!(
                "reconciled {:?} and {:?}: {} to {:?}, {} to {:?}",
                a,
                b,
                a_to_b.len(),
                b,
                b_to_a.len(),
                a
            );
            self.settle(a);
            self.settle(b);
        }
        Ok(moved)
    }
}
