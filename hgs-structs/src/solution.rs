use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{from_value, Map, Value};

use crate::ProblemData;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SolutionRoute {
    #[serde(default)]
    pub vehicle_type: usize,
    /// Client location indices, depots excluded.
    pub visits: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Solution {
    pub routes: Vec<SolutionRoute>,
}

impl TryFrom<Map<String, Value>> for Solution {
    type Error = serde_json::Error;

    fn try_from(v: Map<String, Value>) -> Result<Self, Self::Error> {
        from_value(Value::Object(v))
    }
}

impl Solution {
    /// Checks that every route refers to a known vehicle type, visits only
    /// clients, and that no client is visited twice.
    pub fn verify(&self, data: &ProblemData) -> Result<()> {
        let mut visited = vec![false; data.num_locations()];
        let mut used = vec![0usize; data.vehicle_types().len()];
        for (idx, route) in self.routes.iter().enumerate() {
            let vt = data.vehicle_types().get(route.vehicle_type).ok_or_else(|| {
                anyhow!("Route {}: unknown vehicle type {}", idx, route.vehicle_type)
            })?;
            used[route.vehicle_type] += 1;
            if used[route.vehicle_type] > vt.num_available {
                return Err(anyhow!(
                    "Number of routes using vehicle type {} exceeds its availability ({})",
                    route.vehicle_type,
                    vt.num_available
                ));
            }
            for &location in &route.visits {
                if location >= data.num_locations() || data.is_depot(location) {
                    return Err(anyhow!("Route {}: location {} is not a client", idx, location));
                }
                if visited[location] {
                    return Err(anyhow!(
                        "The same client ({}) cannot be visited more than once",
                        location
                    ));
                }
                visited[location] = true;
            }
        }
        Ok(())
    }
}
