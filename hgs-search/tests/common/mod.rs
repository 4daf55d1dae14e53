#![allow(dead_code)]

use hgs_structs::{Client, ClientGroup, Depot, ProblemData, VehicleType};
use ndarray::Array2;

pub fn client(x: i64, y: i64) -> Client {
    Client {
        x,
        y,
        delivery: 0,
        service_duration: 0,
        tw_early: 0,
        tw_late: i64::MAX,
        prize: 0,
        required: true,
        group: None,
    }
}

pub fn depot(x: i64, y: i64) -> Depot {
    Depot {
        x,
        y,
        tw_early: 0,
        tw_late: i64::MAX,
    }
}

pub fn vehicle_type(num_available: usize) -> VehicleType {
    VehicleType {
        num_available,
        capacity: 100,
        ..Default::default()
    }
}

pub fn manhattan(points: &[(i64, i64)]) -> Array2<i64> {
    let n = points.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        (points[i].0 - points[j].0).abs() + (points[i].1 - points[j].1).abs()
    })
}

/// One profile where durations equal Manhattan distances.
pub fn problem(
    depots: Vec<Depot>,
    clients: Vec<Client>,
    vehicle_types: Vec<VehicleType>,
    groups: Vec<ClientGroup>,
) -> ProblemData {
    let points: Vec<(i64, i64)> = depots
        .iter()
        .map(|d| (d.x, d.y))
        .chain(clients.iter().map(|c| (c.x, c.y)))
        .collect();
    let matrix = manhattan(&points);
    ProblemData::new(
        depots,
        clients,
        vehicle_types,
        vec![matrix.clone()],
        vec![matrix],
        groups,
    )
    .unwrap()
}

/// A depot at the origin and `num_clients` clients at x = 1, 2, ...
pub fn line_problem(num_clients: usize) -> ProblemData {
    problem(
        vec![depot(0, 0)],
        (1..=num_clients as i64).map(|x| client(x, 0)).collect(),
        vec![vehicle_type(num_clients.max(2))],
        vec![],
    )
}
