//! Two-route move operators. They rewrite visit sequences directly through
//! the engine and know nothing about node ownership; callers reconcile the
//! returned route pair afterwards.

use crate::cost::{Cost, CostEvaluator};
use crate::engine::{Engine, NodeId, RouteId};
use anyhow::{anyhow, Result};

mod exchange;
pub use exchange::*;
mod swap_tails;
pub use swap_tails::*;

pub trait TwoRouteOperator {
    fn name(&self) -> &'static str;

    /// Cost delta of the move involving `u` and `v`. Returns 0 when the move
    /// does not apply to this pair.
    fn evaluate(&self, u: NodeId, v: NodeId, engine: &Engine, cost: &CostEvaluator) -> Cost;

    /// Applies the move and updates both routes. Returns the routes of `u`
    /// and `v`, in that order.
    fn apply(&self, u: NodeId, v: NodeId, engine: &mut Engine) -> Result<(RouteId, RouteId)>;
}

/// Route and position of a node that currently sits in a route.
pub(crate) fn locate(engine: &Engine, id: NodeId) -> Option<(RouteId, usize)> {
    let node = engine.node(id)?;
    Some((node.route()?, node.idx()))
}

/// Routes of `u` and `v`, which must be distinct.
pub(crate) fn distinct_routes(
    engine: &Engine,
    u: NodeId,
    v: NodeId,
) -> Option<((RouteId, usize), (RouteId, usize))> {
    let lu = locate(engine, u)?;
    let lv = locate(engine, v)?;
    if lu.0 == lv.0 {
        None
    } else {
        Some((lu, lv))
    }
}

pub(crate) fn not_applicable(name: &str, u: NodeId, v: NodeId) -> anyhow::Error {
    anyhow!("{} does not apply to nodes {:?} and {:?}", name, u, v)
}

/// The operator set used by the local search, in evaluation order.
pub fn default_operators() -> Vec<Box<dyn TwoRouteOperator>> {
    vec![
        Box::new(Exchange::<1, 0>::new()),
        Box::new(Exchange::<2, 0>::new()),
        Box::new(Exchange::<1, 1>::new()),
        Box::new(Exchange::<2, 1>::new()),
        Box::new(Exchange::<2, 2>::new()),
        Box::new(SwapTails),
    ]
}
