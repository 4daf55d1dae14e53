use super::{distinct_routes, not_applicable, TwoRouteOperator};
use crate::cost::{Cost, CostEvaluator};
use crate::engine::{Engine, NodeId, RouteId};
use anyhow::Result;

/// Exchanges the `N` consecutive clients starting at `u` with the `M`
/// consecutive clients starting at `v`, across two routes. With `M == 0`
/// the segment of `u` is inserted after `v` instead, and `v` may be a start
/// depot. `(1, 0)` is relocate, `(1, 1)` is swap.
#[derive(Copy, Clone, Debug, Default)]
pub struct Exchange<const N: usize, const M: usize>;

impl<const N: usize, const M: usize> Exchange<N, M> {
    pub fn new() -> Self {
        assert!(N > 0 && N >= M, "Exchange needs N > 0 and N >= M");
        Self
    }

    /// Positions of both segments if the move applies.
    fn positions(engine: &Engine, u: NodeId, v: NodeId) -> Option<((RouteId, usize), (RouteId, usize))> {
        let ((ru, pu), (rv, pv)) = distinct_routes(engine, u, v)?;
        let len_u = engine.route(ru)?.len();
        let len_v = engine.route(rv)?.len();
        if pu == 0 || pu + N - 1 > len_u {
            return None;
        }
        if M == 0 {
            if pv > len_v {
                return None;
            }
        } else if pv == 0 || pv + M - 1 > len_v {
            return None;
        }
        Some(((ru, pu), (rv, pv)))
    }
}

impl<const N: usize, const M: usize> TwoRouteOperator for Exchange<N, M> {
    fn name(&self) -> &'static str {
        match (N, M) {
            (1, 0) => "relocate",
            (1, 1) => "swap",
            _ => "exchange",
        }
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

        let mut new_u = Vec::with_capacity(lu.len() + M);
        new_u.extend_from_slice(&lu[..pu]);
        new_u.extend_from_slice(&lv[pv..pv + M]);
        new_u.extend_from_slice(&lu[pu + N..]);

        let at_v = if M == 0 { pv + 1 } else { pv };
        let mut new_v = Vec::with_capacity(lv.len() + N);
        new_v.extend_from_slice(&lv[..at_v]);
        new_v.extend_from_slice(&lu[pu..pu + N]);
        new_v.extend_from_slice(&lv[at_v + M..]);

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

        let segment_u = route_u.visits()[pu..pu + N].to_vec();
        let segment_v = route_v.visits()[pv..pv + M].to_vec();
        for _ in 0..N {
            route_u.remove(nodes, pu)?;
        }
        for _ in 0..M {
            route_v.remove(nodes, pv)?;
        }

        let at_v = if M == 0 { pv + 1 } else { pv };
        for (k, &id) in segment_u.iter().enumerate() {
            route_v.insert(nodes, at_v + k, id)?;
        }
        for (k, &id) in segment_v.iter().enumerate() {
            route_u.insert(nodes, pu + k, id)?;
        }

        route_u.update(nodes, data);
        route_v.update(nodes, data);
        Ok((ru, rv))
    }
}
