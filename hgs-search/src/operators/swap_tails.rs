use super::{distinct_routes, not_applicable, TwoRouteOperator};
use crate::cost::{Cost, CostEvaluator};
use crate::engine::{Engine, NodeId, RouteId};
use anyhow::Result;

/// 2-opt*: the route of `u` continues with everything after `v`, and the
/// route of `v` with everything after `u`. Either node may be a start depot.
#[derive(Copy, Clone, Debug, Default)]
pub struct SwapTails;

impl SwapTails {
    fn positions(engine: &Engine, u: NodeId, v: NodeId) -> Option<((RouteId, usize), (RouteId, usize))> {
        let ((ru, pu), (rv, pv)) = distinct_routes(engine, u, v)?;
        let len_u = engine.route(ru)?.len();
        let len_v = engine.route(rv)?.len();
        if pu > len_u || pv > len_v || (pu == len_u && pv == len_v) {
            return None;
        }
        Some(((ru, pu), (rv, pv)))
    }
}

impl TwoRouteOperator for SwapTails {
    fn name(&self) -> &'static str {
        "swap_tails"
    }

    fn evaluate(&self, u: NodeId, v: NodeId, engine: &Engine, cost: &CostEvaluator) -> Cost {
        let ((ru, pu), (rv, pv)) = match Self::positions(engine, u, v) {
            Some(p) => p,
            None => return 0,
        };
        let (route_u, route_v) = match (engine.route(ru), engine.route(rv)) {
            (Some(a), Some(b)) => (a, b),
            _ => return 0,
        };
        let data = engine.data();
        let lu = route_u.locations(&engine.nodes);
        let lv = route_v.locations(&engine.nodes);
        let (end_u, end_v) = (lu.len() - 1, lv.len() - 1);

        let new_u: Vec<usize> = lu[..=pu]
            .iter()
            .chain(&lv[pv + 1..end_v])
            .chain(&lu[end_u..])
            .copied()
            .collect();
        let new_v: Vec<usize> = lv[..=pv]
            .iter()
            .chain(&lu[pu + 1..end_u])
            .chain(&lv[end_v..])
            .copied()
            .collect();

        let old = cost.cost(data, route_u.vehicle_type(), route_u.stats())
            + cost.cost(data, route_v.vehicle_type(), route_v.stats());
        cost.cost_of(data, route_u.vehicle_type(), &new_u)
            + cost.cost_of(data, route_v.vehicle_type(), &new_v)
            - old
    }

    fn apply(&self, u: NodeId, v: NodeId, engine: &mut Engine) -> Result<(RouteId, RouteId)> {
        let ((ru, pu), (rv, pv)) =
            Self::positions(engine, u, v).ok_or_else(|| not_applicable(self.name(), u, v))?;
        let data = engine.data();
        let (route_u, route_v, nodes) = engine
            .route_pair_mut(ru, rv)
            .ok_or_else(|| not_applicable(self.name(), u, v))?;

        let tail_u = route_u.clients()[pu..].to_vec();
        let tail_v = route_v.clients()[pv..].to_vec();
        for _ in 0..tail_u.len() {
            route_u.remove(nodes, pu + 1)?;
        }
        for _ in 0..tail_v.len() {
            route_v.remove(nodes, pv + 1)?;
        }
        for &id in &tail_v {
            route_u.append(nodes, id);
        }
        for &id in &tail_u {
            route_v.append(nodes, id);
        }

        route_u.update(nodes, data);
        route_v.update(nodes, data);
        Ok((ru, rv))
    }
}
