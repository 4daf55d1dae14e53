use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NeighbourhoodParams {
    /// Weight of the waiting time forced on the target when travelling i -> j
    pub weight_wait_time: f64,

    /// Weight of the time warp incurred at the target when travelling i -> j
    pub weight_time_warp: f64,

    /// Number of neighbours kept per client
    /// Clamped to the number of other clients
    pub num_neighbours: usize,

    /// Whether the proximity matrix is made symmetric before ranking
    pub symmetric_proximity: bool,

    /// Whether the resulting neighbour lists are made symmetric: j in N(i)
    /// implies i in N(j). Lists may then exceed num_neighbours.
    pub symmetric_neighbours: bool,
}

impl Default for NeighbourhoodParams {
    fn default() -> Self {
        Self {
            weight_wait_time: 0.2,
            weight_time_warp: 1.0,
            num_neighbours: 60,
            symmetric_proximity: true,
            symmetric_neighbours: false,
        }
    }
}

impl NeighbourhoodParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.weight_wait_time >= 0.0) || !(self.weight_time_warp >= 0.0) {
            return Err(anyhow!("Proximity weights must be non-negative"));
        }
        if self.num_neighbours == 0 {
            return Err(anyhow!("num_neighbours must be positive"));
        }
        Ok(())
    }

    /// Defaults, updated with any user-provided overrides.
    pub fn initialize(overrides: &Option<Map<String, Value>>) -> Result<Self> {
        let params: Self = merge(Self::default(), overrides)?;
        params.validate()?;
        debug!("neighbourhood parameters: {:?}", params);
        Ok(params)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SearchParams {
    /// Seed for the client visiting order
    pub seed: u64,

    /// Penalty per unit of excess load
    pub load_penalty: i64,

    /// Penalty per unit of time warp
    pub tw_penalty: i64,

    /// Maximum number of passes over all clients
    /// The search also stops after a pass without improvement
    pub max_passes: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            seed: 0,
            load_penalty: 20,
            tw_penalty: 20,
            max_passes: 100,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        if self.load_penalty < 0 || self.tw_penalty < 0 {
            return Err(anyhow!("Penalties must be non-negative"));
        }
        Ok(())
    }

    pub fn initialize(overrides: &Option<Map<String, Value>>) -> Result<Self> {
        let params: Self = merge(Self::default(), overrides)?;
        params.validate()?;
        debug!("search parameters: {:?}", params);
        Ok(params)
    }
}

fn merge<T>(base: T, overrides: &Option<Map<String, Value>>) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut merged = serde_json::to_value(base)?;
    if let (Value::Object(ref mut obj), Some(map)) = (&mut merged, overrides) {
        for (k, v) in map {
            if !obj.contains_key(k) {
                return Err(anyhow!("Unknown parameter '{}'", k));
            }
            obj.insert(k.clone(), v.clone());
        }
    }
    Ok(serde_json::from_value(merged)?)
}
