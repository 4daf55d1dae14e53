use crate::arena::Arena;
use crate::cost::{Cost, CostEvaluator};
use crate::engine::{NodeId, RouteId};
use crate::neighbourhood::compute_neighbours;
use crate::operators::{default_operators, TwoRouteOperator};
use crate::params::{NeighbourhoodParams, SearchParams};
use anyhow::Result;
use hgs_structs::ProblemData;
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub passes: usize,
    pub moves: usize,
    pub initial_cost: Cost,
    pub final_cost: Cost,
}

/// Granular first-improvement descent over two-route operators. After each
/// applied move the touched route pair is reconciled before anything else
/// happens.
pub struct LocalSearch<'a> {
    data: &'a ProblemData,
    neighbours: Vec<Vec<usize>>,
    operators: Vec<Box<dyn TwoRouteOperator>>,
    cost_evaluator: CostEvaluator,
    params: SearchParams,
    rng: SmallRng,
}

impl<'a> LocalSearch<'a> {
    /// Builds neighbourhoods once for the whole session.
    pub fn new(
        data: &'a ProblemData,
        neighbourhood: &NeighbourhoodParams,
        params: SearchParams,
    ) -> Result<Self> {
        neighbourhood.validate()?;
        params.validate()?;
        Ok(Self {
            data,
            neighbours: compute_neighbours(data, neighbourhood),
            operators: default_operators(),
            cost_evaluator: CostEvaluator::new(params.load_penalty, params.tw_penalty),
            params,
            rng: SmallRng::seed_from_u64(params.seed),
        })
    }

    pub fn neighbours(&self) -> &[Vec<usize>] {
        &self.neighbours
    }

    pub fn cost_evaluator(&self) -> &CostEvaluator {
        &self.cost_evaluator
    }

    pub fn with_operators(mut self, operators: Vec<Box<dyn TwoRouteOperator>>) -> Self {
        self.operators = operators;
        self
    }

    /// Penalised cost of all routes in the arena.
    pub fn cost(&self, arena: &Arena) -> Cost {
        arena
            .engine()
            .routes()
            .map(|(_, r)| self.cost_evaluator.cost(self.data, r.vehicle_type(), r.stats()))
            .sum()
    }

    pub fn run(&mut self, arena: &mut Arena) -> Result<SearchStats> {
        let mut stats = SearchStats {
            initial_cost: self.cost(arena),
            ..Default::default()
        };

        while stats.passes < self.params.max_passes {
            stats.passes += 1;
            let mut improved = false;

            let mut order = self.client_nodes(arena);
            let mut lookup = self.node_by_location(arena, &order);
            order.shuffle(&mut self.rng);
            for &u in &order {
                if self.improve_node(arena, &mut lookup, u)? {
                    improved = true;
                    stats.moves += 1;
                }
            }
            debug!("pass {}: {} moves so far", stats.passes, stats.moves);
            if !improved {
                break;
            }
        }

        stats.final_cost = self.cost(arena);
        info!(
            "local search finished after {} passes and {} moves: {} -> {}",
            stats.passes, stats.moves, stats.initial_cost, stats.final_cost
        );
        Ok(stats)
    }

    /// Client nodes currently in routes.
    fn client_nodes(&self, arena: &Arena) -> Vec<NodeId> {
        arena
            .engine()
            .routes()
            .flat_map(|(_, r)| r.clients().iter().copied())
            .collect()
    }

    fn node_by_location(&self, arena: &Arena, clients: &[NodeId]) -> Vec<Option<NodeId>> {
        let mut lookup = vec![None; self.data.num_locations()];
        Self::patch_lookup(&mut lookup, arena, clients);
        lookup
    }

    fn patch_lookup(lookup: &mut [Option<NodeId>], arena: &Arena, clients: &[NodeId]) {
        for &u in clients {
            if let Some(node) = arena.engine().node(u) {
                lookup[node.location()] = Some(u);
            }
        }
    }

    /// Tries the operators on `u` against its neighbours and against the
    /// start depots of empty routes; applies the first improving move.
    fn improve_node(
        &mut self,
        arena: &mut Arena,
        lookup: &mut [Option<NodeId>],
        u: NodeId,
    ) -> Result<bool> {
        let location = match arena.engine().node(u) {
            Some(node) if node.route().is_some() => node.location(),
            _ => return Ok(false),
        };

        let mut candidates: Vec<NodeId> = self.neighbours[location]
            .iter()
            .filter_map(|&loc| lookup[loc])
            .collect();
        candidates.extend(
            arena
                .engine()
                .routes()
                .filter(|(_, r)| r.is_empty())
                .map(|(_, r)| r.start_depot()),
        );

        for v in candidates {
            for op in &self.operators {
                let delta = op.evaluate(u, v, arena.engine(), &self.cost_evaluator);
                if delta < 0 {
                    let (ru, rv): (RouteId, RouteId) = op.apply(u, v, arena.engine_mut())?;
                    arena.reconcile(ru, rv)?;
                    for route in [ru, rv] {
                        if let Ok(r) = arena.route(route) {
                            Self::patch_lookup(lookup, arena, r.clients());
                        }
                    }
                    debug!("applied {} ({:?}, {:?}): delta {}", op.name(), u, v, delta);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
