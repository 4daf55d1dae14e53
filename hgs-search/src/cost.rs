use crate::segment::{route_stats, RouteStats};
use hgs_structs::ProblemData;

pub type Cost = i64;

/// Penalised route cost: vehicle costs plus penalties for excess load and
/// time warp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CostEvaluator {
    pub load_penalty: i64,
    pub tw_penalty: i64,
}

impl CostEvaluator {
    pub fn new(load_penalty: i64, tw_penalty: i64) -> Self {
        Self {
            load_penalty,
            tw_penalty,
        }
    }

    #[inline]
    pub fn cost(&self, data: &ProblemData, vehicle_type: usize, stats: &RouteStats) -> Cost {
        let vt = &data.vehicle_types()[vehicle_type];
        vt.unit_distance_cost * stats.distance
            + vt.unit_duration_cost * stats.duration
            + self.load_penalty * stats.excess_load
            + self.tw_penalty * stats.time_warp
    }

    /// Cost of a proposed visit sequence, depots included.
    pub fn cost_of(&self, data: &ProblemData, vehicle_type: usize, locations: &[usize]) -> Cost {
        self.cost(data, vehicle_type, &route_stats(data, vehicle_type, locations))
    }
}
