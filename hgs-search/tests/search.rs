mod common;

use common::{client, depot, line_problem, problem, vehicle_type};
use hgs_search::{Arena, LocalSearch, NeighbourhoodParams, SearchParams};
use hgs_structs::{Solution, SolutionRoute};

fn initial_solution() -> Solution {
    Solution {
        routes: vec![
            SolutionRoute {
                vehicle_type: 0,
                visits: vec![1, 3, 5],
            },
            SolutionRoute {
                vehicle_type: 0,
                visits: vec![2, 4, 6],
            },
            SolutionRoute {
                vehicle_type: 0,
                visits: vec![],
            },
        ],
    }
}

#[test]
fn test_search_improves_and_keeps_ownership_consistent() {
    let data = line_problem(6);
    let mut arena = Arena::new(&data);
    let routes = arena.load(&initial_solution()).unwrap();

    let mut search =
        LocalSearch::new(&data, &NeighbourhoodParams::default(), SearchParams::default()).unwrap();
    let initial = search.cost(&arena);
    assert_eq!(initial, 22);

    let stats = search.run(&mut arena).unwrap();
    assert_eq!(stats.initial_cost, 22);
    assert!(stats.moves > 0);
    assert!(stats.final_cost < stats.initial_cost);
    assert_eq!(stats.final_cost, search.cost(&arena));

    arena.check_invariants();
    for r in &routes {
        assert!(arena.is_reconciled(r.id()).unwrap());
    }
    let solution = arena.solution(&routes).unwrap();
    solution.verify(&data).unwrap();
    let mut visited: Vec<usize> = solution.routes.iter().flat_map(|r| r.visits.clone()).collect();
    visited.sort_unstable();
    assert_eq!(visited, vec![1, 2, 3, 4, 5, 6]);

    for r in routes {
        arena.release_route(r);
    }
    assert_eq!(arena.engine().num_nodes(), 0);
}

#[test]
fn test_search_is_deterministic_for_a_seed() {
    let data = line_problem(6);
    let params = SearchParams {
        seed: 7,
        ..Default::default()
    };
    let run = || {
        let mut arena = Arena::new(&data);
        let routes = arena.load(&initial_solution()).unwrap();
        let mut search = LocalSearch::new(&data, &NeighbourhoodParams::default(), params).unwrap();
        let stats = search.run(&mut arena).unwrap();
        let solution = arena.solution(&routes).unwrap();
        for r in routes {
            arena.release_route(r);
        }
        (stats, solution)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_zero_passes_changes_nothing() {
    let data = line_problem(6);
    let mut arena = Arena::new(&data);
    let routes = arena.load(&initial_solution()).unwrap();
    let params = SearchParams {
        max_passes: 0,
        ..Default::default()
    };
    let mut search = LocalSearch::new(&data, &NeighbourhoodParams::default(), params).unwrap();
    let stats = search.run(&mut arena).unwrap();
    assert_eq!(stats.passes, 0);
    assert_eq!(stats.moves, 0);
    assert_eq!(stats.initial_cost, stats.final_cost);
    assert_eq!(arena.solution(&routes).unwrap(), initial_solution());
    for r in routes {
        arena.release_route(r);
    }
}

#[test]
fn test_without_operators_no_moves_are_made() {
    let data = line_problem(4);
    let mut arena = Arena::new(&data);
    let routes = arena
        .load(&Solution {
            routes: vec![
                SolutionRoute {
                    vehicle_type: 0,
                    visits: vec![1, 3],
                },
                SolutionRoute {
                    vehicle_type: 0,
                    visits: vec![2, 4],
                },
            ],
        })
        .unwrap();
    let mut search = LocalSearch::new(&data, &NeighbourhoodParams::default(), SearchParams::default())
        .unwrap()
        .with_operators(vec![]);
    let stats = search.run(&mut arena).unwrap();
    assert_eq!(stats.passes, 1);
    assert_eq!(stats.moves, 0);
    for r in routes {
        arena.release_route(r);
    }
}

#[test]
fn test_neighbourhoods_are_computed_once() {
    let data = problem(
        vec![depot(0, 0)],
        (0..10).map(|i| client(i, i % 3)).collect(),
        vec![vehicle_type(3)],
        vec![],
    );
    let params = NeighbourhoodParams {
        num_neighbours: 4,
        ..Default::default()
    };
    let search = LocalSearch::new(&data, &params, SearchParams::default()).unwrap();
    assert_eq!(search.neighbours().len(), data.num_locations());
    assert!(search.neighbours()[0].is_empty());
    assert!(search.neighbours()[1..].iter().all(|list| list.len() == 4));
}

#[test]
fn test_invalid_params_are_rejected() {
    let data = line_problem(2);
    let params = NeighbourhoodParams {
        num_neighbours: 0,
        ..Default::default()
    };
    assert!(LocalSearch::new(&data, &params, SearchParams::default()).is_err());

    let params = SearchParams {
        load_penalty: -1,
        ..Default::default()
    };
    assert!(LocalSearch::new(&data, &NeighbourhoodParams::default(), params).is_err());
}

#[test]
fn test_search_reaches_local_optimum_on_grid() {
    let data = problem(
        vec![depot(0, 0)],
        (0..20).map(|i| client(i % 5 + 1, i / 5)).collect(),
        vec![vehicle_type(4)],
        vec![],
    );
    let interleaved = Solution {
        routes: (0..4)
            .map(|r| SolutionRoute {
                vehicle_type: 0,
                visits: (1..=20).filter(|loc| loc % 4 == r).collect(),
            })
            .collect(),
    };
    let params = NeighbourhoodParams {
        num_neighbours: 6,
        ..Default::default()
    };
    let mut arena = Arena::new(&data);
    let routes = arena.load(&interleaved).unwrap();

    let mut search = LocalSearch::new(&data, &params, SearchParams::default()).unwrap();
    let stats = search.run(&mut arena).unwrap();
    assert!(stats.moves > 0);
    assert!(stats.passes > 1);
    assert!(stats.final_cost < stats.initial_cost);
    arena.check_invariants();

    // A converged search finds nothing more to do from the same state.
    let again = search.run(&mut arena).unwrap();
    assert_eq!(again.moves, 0);
    assert_eq!(again.passes, 1);
    assert_eq!(again.final_cost, stats.final_cost);

    let solution = arena.solution(&routes).unwrap();
    solution.verify(&data).unwrap();
    let mut visited: Vec<usize> = solution.routes.iter().flat_map(|r| r.visits.clone()).collect();
    visited.sort_unstable();
    assert_eq!(visited, (1..=20).collect::<Vec<_>>());
    for r in routes {
        arena.release_route(r);
    }
    assert_eq!(arena.engine().num_nodes(), 0);
}
