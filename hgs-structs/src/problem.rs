use anyhow::{anyhow, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{from_value, Map, Value};

fn default_tw_late() -> i64 {
    i64::MAX
}

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

fn default_num_available() -> usize {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Depot {
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub tw_early: i64,
    #[serde(default = "default_tw_late")]
    pub tw_late: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Client {
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub delivery: i64,
    #[serde(default)]
    pub service_duration: i64,
    #[serde(default)]
    pub tw_early: i64,
    #[serde(default = "default_tw_late")]
    pub tw_late: i64,
    #[serde(default)]
    pub prize: i64,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Index into `ProblemData::groups`, if the client belongs to a group.
    #[serde(default)]
    pub group: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VehicleType {
    #[serde(default = "default_num_available")]
    pub num_available: usize,
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub start_depot: usize,
    #[serde(default)]
    pub end_depot: usize,
    #[serde(default = "default_one")]
    pub unit_distance_cost: i64,
    #[serde(default)]
    pub unit_duration_cost: i64,
    #[serde(default)]
    pub profile: usize,
    #[serde(default)]
    pub tw_early: i64,
    #[serde(default = "default_tw_late")]
    pub tw_late: i64,
}

impl Default for VehicleType {
    fn default() -> Self {
        Self {
            num_available: 1,
            capacity: 0,
            start_depot: 0,
            end_depot: 0,
            unit_distance_cost: 1,
            unit_duration_cost: 0,
            profile: 0,
            tw_early: 0,
            tw_late: i64::MAX,
        }
    }
}

/// A set of clients. Clients are referenced by location index, so the first
/// client has index `num_depots`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClientGroup {
    pub clients: Vec<usize>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default = "default_true")]
    pub mutually_exclusive: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct RawProblemData {
    depots: Vec<Depot>,
    clients: Vec<Client>,
    vehicle_types: Vec<VehicleType>,
    distance_matrices: Vec<Vec<Vec<i64>>>,
    duration_matrices: Vec<Vec<Vec<i64>>>,
    #[serde(default)]
    groups: Vec<ClientGroup>,
}

/// Immutable instance data. Locations are indexed with all depots first,
/// followed by all clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "RawProblemData", into = "RawProblemData")]
pub struct ProblemData {
    depots: Vec<Depot>,
    clients: Vec<Client>,
    vehicle_types: Vec<VehicleType>,
    distance_matrices: Vec<Array2<i64>>,
    duration_matrices: Vec<Array2<i64>>,
    groups: Vec<ClientGroup>,
}

impl TryFrom<Map<String, Value>> for ProblemData {
    type Error = anyhow::Error;

    fn try_from(v: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(from_value(Value::Object(v))?)
    }
}

impl TryFrom<RawProblemData> for ProblemData {
    type Error = anyhow::Error;

    fn try_from(raw: RawProblemData) -> Result<Self, Self::Error> {
        let distance_matrices = raw
            .distance_matrices
            .into_iter()
            .map(to_array)
            .collect::<Result<Vec<_>>>()?;
        let duration_matrices = raw
            .duration_matrices
            .into_iter()
            .map(to_array)
            .collect::<Result<Vec<_>>>()?;
        ProblemData::new(
            raw.depots,
            raw.clients,
            raw.vehicle_types,
            distance_matrices,
            duration_matrices,
            raw.groups,
        )
    }
}

impl From<ProblemData> for RawProblemData {
    fn from(data: ProblemData) -> Self {
        let from_array = |m: Array2<i64>| -> Vec<Vec<i64>> {
            m.outer_iter().map(|row| row.to_vec()).collect()
        };
        RawProblemData {
            depots: data.depots,
            clients: data.clients,
            vehicle_types: data.vehicle_types,
            distance_matrices: data.distance_matrices.into_iter().map(from_array).collect(),
            duration_matrices: data.duration_matrices.into_iter().map(from_array).collect(),
            groups: data.groups,
        }
    }
}

fn to_array(rows: Vec<Vec<i64>>) -> Result<Array2<i64>> {
    let n = rows.len();
    if rows.iter().any(|row| row.len() != n) {
        return Err(anyhow!("Matrices must be square"));
    }
    let flat: Vec<i64> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((n, n), flat)?)
}

impl ProblemData {
    pub fn new(
        depots: Vec<Depot>,
        clients: Vec<Client>,
        vehicle_types: Vec<VehicleType>,
        distance_matrices: Vec<Array2<i64>>,
        duration_matrices: Vec<Array2<i64>>,
        groups: Vec<ClientGroup>,
    ) -> Result<Self> {
        let data = Self {
            depots,
            clients,
            vehicle_types,
            distance_matrices,
            duration_matrices,
            groups,
        };
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<()> {
        let num_locations = self.num_locations();
        let num_depots = self.num_depots();

        if num_depots == 0 {
            return Err(anyhow!("Expected at least one depot"));
        }
        if self.distance_matrices.is_empty() {
            return Err(anyhow!("Expected at least one routing profile"));
        }
        if self.distance_matrices.len() != self.duration_matrices.len() {
            return Err(anyhow!(
                "Number of distance matrices ({}) does not match number of duration matrices ({})",
                self.distance_matrices.len(),
                self.duration_matrices.len()
            ));
        }
        for matrix in self.distance_matrices.iter().chain(&self.duration_matrices) {
            if matrix.dim() != (num_locations, num_locations) {
                return Err(anyhow!(
                    "Matrix shape {:?} does not match number of locations ({})",
                    matrix.dim(),
                    num_locations
                ));
            }
            if matrix.iter().any(|&v| v < 0) {
                return Err(anyhow!("Matrices must not contain negative entries"));
            }
        }

        for (idx, depot) in self.depots.iter().enumerate() {
            if depot.tw_early > depot.tw_late {
                return Err(anyhow!("Depot {}: tw_early must not exceed tw_late", idx));
            }
        }
        for (idx, client) in self.clients.iter().enumerate() {
            if client.tw_early > client.tw_late {
                return Err(anyhow!("Client {}: tw_early must not exceed tw_late", idx));
            }
            if client.service_duration < 0 || client.prize < 0 || client.delivery < 0 {
                return Err(anyhow!(
                    "Client {}: service duration, prize and delivery must be non-negative",
                    idx
                ));
            }
            if let Some(group) = client.group {
                let location = num_depots + idx;
                match self.groups.get(group) {
                    Some(g) if g.clients.contains(&location) => {}
                    Some(_) => {
                        return Err(anyhow!("Client {} is not a member of group {}", idx, group))
                    }
                    None => return Err(anyhow!("Client {}: unknown group {}", idx, group)),
                }
            }
        }

        if self.vehicle_types.is_empty() {
            return Err(anyhow!("Expected at least one vehicle type"));
        }
        for (idx, vt) in self.vehicle_types.iter().enumerate() {
            if vt.start_depot >= num_depots || vt.end_depot >= num_depots {
                return Err(anyhow!("Vehicle type {}: depot index out of range", idx));
            }
            if vt.profile >= self.num_profiles() {
                return Err(anyhow!("Vehicle type {}: unknown profile {}", idx, vt.profile));
            }
            if vt.unit_distance_cost < 0 || vt.unit_duration_cost < 0 || vt.capacity < 0 {
                return Err(anyhow!(
                    "Vehicle type {}: costs and capacity must be non-negative",
                    idx
                ));
            }
            if vt.tw_early > vt.tw_late {
                return Err(anyhow!("Vehicle type {}: tw_early must not exceed tw_late", idx));
            }
        }

        for (idx, group) in self.groups.iter().enumerate() {
            if group.clients.is_empty() {
                return Err(anyhow!("Group {} is empty", idx));
            }
            for &location in &group.clients {
                if location < num_depots || location >= num_locations {
                    return Err(anyhow!(
                        "Group {}: location {} is not a client",
                        idx,
                        location
                    ));
                }
                if self.clients[location - num_depots].group != Some(idx) {
                    return Err(anyhow!(
                        "Group {}: client at location {} does not reference this group",
                        idx,
                        location
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn depots(&self) -> &[Depot] {
        &self.depots
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn vehicle_types(&self) -> &[VehicleType] {
        &self.vehicle_types
    }

    pub fn groups(&self) -> &[ClientGroup] {
        &self.groups
    }

    pub fn num_depots(&self) -> usize {
        self.depots.len()
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn num_locations(&self) -> usize {
        self.depots.len() + self.clients.len()
    }

    pub fn num_profiles(&self) -> usize {
        self.distance_matrices.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicle_types.iter().map(|vt| vt.num_available).sum()
    }

    pub fn distance_matrix(&self, profile: usize) -> &Array2<i64> {
        &self.distance_matrices[profile]
    }

    pub fn duration_matrix(&self, profile: usize) -> &Array2<i64> {
        &self.duration_matrices[profile]
    }

    pub fn is_depot(&self, location: usize) -> bool {
        location < self.num_depots()
    }

    pub fn client(&self, location: usize) -> Option<&Client> {
        location
            .checked_sub(self.num_depots())
            .and_then(|idx| self.clients.get(idx))
    }

    #[inline]
    pub fn tw_early(&self, location: usize) -> i64 {
        match self.client(location) {
            Some(client) => client.tw_early,
            None => self.depots[location].tw_early,
        }
    }

    #[inline]
    pub fn tw_late(&self, location: usize) -> i64 {
        match self.client(location) {
            Some(client) => client.tw_late,
            None => self.depots[location].tw_late,
        }
    }

    #[inline]
    pub fn service_duration(&self, location: usize) -> i64 {
        self.client(location).map_or(0, |c| c.service_duration)
    }

    #[inline]
    pub fn prize(&self, location: usize) -> i64 {
        self.client(location).map_or(0, |c| c.prize)
    }

    #[inline]
    pub fn delivery(&self, location: usize) -> i64 {
        self.client(location).map_or(0, |c| c.delivery)
    }
}
