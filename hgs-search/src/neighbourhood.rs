use crate::params::NeighbourhoodParams;
use hgs_structs::ProblemData;
use ndarray::{Array2, Zip};
use std::collections::BTreeSet;
use tracing::debug;

/// Score given to pairs of clients in the same mutually exclusive group.
/// Finite, so comparisons among such pairs still order by index.
pub const GROUP_SENTINEL: f64 = f64::MIN;

/// Proximity scores between all locations; lower means closer.
///
/// The edge cost of a pair is the cheapest over all distinct vehicle cost
/// and profile combinations, minus the prize of the target, plus weighted
/// waiting time and time warp computed from the fastest duration profile.
/// Self pairs and pairs involving a depot are infinite.
pub fn proximity(data: &ProblemData, params: &NeighbourhoodParams) -> Array2<f64> {
    let n = data.num_locations();
    let num_depots = data.num_depots();

    let combinations: BTreeSet<(i64, i64, usize)> = data
        .vehicle_types()
        .iter()
        .map(|vt| (vt.unit_distance_cost, vt.unit_duration_cost, vt.profile))
        .collect();

    let mut prox = Array2::from_elem((n, n), f64::INFINITY);
    for &(dist_rate, dur_rate, profile) in &combinations {
        let distances = data.distance_matrix(profile);
        let durations = data.duration_matrix(profile);
        Zip::from(&mut prox)
            .and(distances)
            .and(durations)
            .for_each(|p, &dist, &dur| {
                let edge = dist_rate as f64 * dist as f64 + dur_rate as f64 * dur as f64;
                if edge < *p {
                    *p = edge;
                }
            });
    }

    let mut min_duration = data.duration_matrix(0).mapv(|d| d as f64);
    for profile in 1..data.num_profiles() {
        Zip::from(&mut min_duration)
            .and(data.duration_matrix(profile))
            .for_each(|m, &d| *m = m.min(d as f64));
    }

    let early: Vec<f64> = (0..n).map(|i| data.tw_early(i) as f64).collect();
    let late: Vec<f64> = (0..n).map(|i| data.tw_late(i) as f64).collect();
    let service: Vec<f64> = (0..n).map(|i| data.service_duration(i) as f64).collect();
    let prize: Vec<f64> = (0..n).map(|i| data.prize(i) as f64).collect();

    for ((i, j), p) in prox.indexed_iter_mut() {
        let dur = min_duration[[i, j]];
        let wait = (early[j] - dur - service[i] - late[i]).max(0.0);
        let warp = (early[i] + service[i] + dur - late[j]).max(0.0);
        *p += params.weight_wait_time * wait + params.weight_time_warp * warp - prize[j];
    }

    if params.symmetric_proximity {
        for i in 0..n {
            for j in (i + 1)..n {
                let m = prox[[i, j]].min(prox[[j, i]]);
                prox[[i, j]] = m;
                prox[[j, i]] = m;
            }
        }
    }

    for group in data.groups().iter().filter(|g| g.mutually_exclusive) {
        for &i in &group.clients {
            for &j in &group.clients {
                prox[[i, j]] = GROUP_SENTINEL;
            }
        }
    }

    for i in 0..n {
        prox[[i, i]] = f64::INFINITY;
    }
    for d in 0..num_depots {
        prox.row_mut(d).fill(f64::INFINITY);
        prox.column_mut(d).fill(f64::INFINITY);
    }
    prox
}

/// Granular neighbourhoods: for each client, the `num_neighbours` closest
/// other clients by proximity, ascending, ties broken by index. Depots get
/// empty lists.
pub fn compute_neighbours(data: &ProblemData, params: &NeighbourhoodParams) -> Vec<Vec<usize>> {
    let n = data.num_locations();
    let num_depots = data.num_depots();
    let k = params
        .num_neighbours
        .min(data.num_clients().saturating_sub(1));

    let prox = proximity(data, params);
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); n];
    if k > 0 {
        for i in num_depots..n {
            let row = prox.row(i);
            let cmp = |a: &usize, b: &usize| row[*a].total_cmp(&row[*b]).then(a.cmp(b));
            let mut order: Vec<usize> = (num_depots..n).filter(|&j| j != i).collect();
            if k < order.len() {
                order.select_nth_unstable_by(k - 1, cmp);
                order.truncate(k);
            }
            order.sort_unstable_by(cmp);
            neighbours[i] = order;
        }
    }

    if params.symmetric_neighbours {
        let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        for (i, list) in neighbours.iter().enumerate() {
            for &j in list {
                sets[i].insert(j);
                sets[j].insert(i);
            }
        }
        neighbours = sets.into_iter().map(|s| s.into_iter().collect()).collect();
    }

    debug!(
        "computed neighbourhoods for {} clients with k = {}",
        data.num_clients(),
        k
    );
    neighbours
}
