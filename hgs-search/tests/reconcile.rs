mod common;

use common::line_problem;
use hgs_search::operators::{Exchange, SwapTails, TwoRouteOperator};
use hgs_search::{Arena, NodeId, Owner, RouteHandle};

fn build_route(arena: &mut Arena, idx: usize, locations: &[usize]) -> (RouteHandle, Vec<NodeId>) {
    let route = arena.add_route(0, idx).unwrap();
    let ids = locations
        .iter()
        .map(|&loc| {
            let h = arena.add_route_node(&route, loc).unwrap();
            let id = h.id();
            arena.release_node(h);
            id
        })
        .collect();
    (route, ids)
}

#[test]
fn test_reconcile_after_swap() {
    let data = line_problem(4);
    let mut arena = Arena::new(&data);
    let (a, na) = build_route(&mut arena, 0, &[1, 2]);
    let (b, nb) = build_route(&mut arena, 1, &[3, 4]);

    Exchange::<1, 1>::new()
        .apply(na[1], nb[0], arena.engine_mut())
        .unwrap();
    assert_eq!(arena.scan(a.id()).unwrap(), vec![na[0], nb[0]]);
    assert_eq!(arena.scan(b.id()).unwrap(), vec![na[1], nb[1]]);
    assert!(!arena.is_reconciled(a.id()).unwrap());
    assert!(!arena.is_reconciled(b.id()).unwrap());

    assert_eq!(arena.reconcile(a.id(), b.id()).unwrap(), 2);
    assert!(arena.is_reconciled(a.id()).unwrap());
    assert!(arena.is_reconciled(b.id()).unwrap());
    assert_eq!(arena.owner(na[1]), Some(Owner::Route(b.id())));
    assert_eq!(arena.owner(nb[0]), Some(Owner::Route(a.id())));
    assert_eq!(arena.owner(na[0]), Some(Owner::Route(a.id())));
    assert_eq!(arena.owner(nb[1]), Some(Owner::Route(b.id())));
    arena.check_invariants();

    // Already consistent: nothing left to move.
    assert_eq!(arena.reconcile(b.id(), a.id()).unwrap(), 0);

    arena.release_route(a);
    arena.release_route(b);
    assert_eq!(arena.engine().num_nodes(), 0);
}

#[test]
fn test_reconcile_after_relocate_into_empty_route() {
    let data = line_problem(3);
    let mut arena = Arena::new(&data);
    let (a, na) = build_route(&mut arena, 0, &[1, 2, 3]);
    let (b, _) = build_route(&mut arena, 1, &[]);
    let depot = arena.route(b.id()).unwrap().start_depot();

    Exchange::<1, 0>::new()
        .apply(na[1], depot, arena.engine_mut())
        .unwrap();
    assert_eq!(arena.reconcile(a.id(), b.id()).unwrap(), 1);
    assert_eq!(arena.store(b.id()).unwrap(), &[na[1]]);
    assert_eq!(arena.store(a.id()).unwrap().len(), 2);
    assert_eq!(arena.owner(na[1]), Some(Owner::Route(b.id())));
    arena.check_invariants();

    arena.release_route(b);
    assert_eq!(arena.engine().num_nodes(), 4);
    arena.release_route(a);
    assert_eq!(arena.engine().num_nodes(), 0);
}

#[test]
fn test_reconcile_after_swap_tails() {
    let data = line_problem(5);
    let mut arena = Arena::new(&data);
    let (a, na) = build_route(&mut arena, 0, &[1, 2, 3]);
    let (b, nb) = build_route(&mut arena, 1, &[4, 5]);

    SwapTails.apply(na[0], nb[0], arena.engine_mut()).unwrap();
    assert_eq!(arena.scan(a.id()).unwrap(), vec![na[0], nb[1]]);
    assert_eq!(arena.scan(b.id()).unwrap(), vec![nb[0], na[1], na[2]]);

    assert_eq!(arena.reconcile(a.id(), b.id()).unwrap(), 3);
    for id in [na[1], na[2]] {
        assert_eq!(arena.owner(id), Some(Owner::Route(b.id())));
    }
    assert_eq!(arena.owner(nb[1]), Some(Owner::Route(a.id())));
    arena.check_invariants();

    arena.release_route(a);
    arena.release_route(b);
}

#[test]
fn test_reconcile_leaves_other_nodes_alone() {
    let data = line_problem(5);
    let mut arena = Arena::new(&data);
    let (a, na) = build_route(&mut arena, 0, &[1, 2]);
    let (b, nb) = build_route(&mut arena, 1, &[3]);
    let (c, nc) = build_route(&mut arena, 2, &[4]);
    let standalone = arena.add_node(5).unwrap();

    Exchange::<1, 1>::new()
        .apply(na[0], nb[0], arena.engine_mut())
        .unwrap();
    assert_eq!(arena.reconcile(a.id(), b.id()).unwrap(), 2);

    assert_eq!(arena.owner(nc[0]), Some(Owner::Route(c.id())));
    assert_eq!(arena.store(c.id()).unwrap(), &[nc[0]]);
    assert_eq!(arena.owner(standalone.id()), Some(Owner::Standalone));
    assert_eq!(arena.owner(na[1]), Some(Owner::Route(a.id())));
    arena.check_invariants();

    arena.release_node(standalone);
    for r in [a, b, c] {
        arena.release_route(r);
    }
    assert!(arena.registry().is_empty());
}

#[test]
fn test_reconcile_route_with_itself() {
    let data = line_problem(2);
    let mut arena = Arena::new(&data);
    let (a, _) = build_route(&mut arena, 0, &[1, 2]);
    assert_eq!(arena.reconcile(a.id(), a.id()).unwrap(), 0);
    arena.release_route(a);
}

#[test]
fn test_reconcile_released_route_fails() {
    let data = line_problem(2);
    let mut arena = Arena::new(&data);
    let (a, _) = build_route(&mut arena, 0, &[1]);
    let (b, _) = build_route(&mut arena, 1, &[2]);
    let stale = b.id();
    arena.release_route(b);

    assert!(arena.reconcile(a.id(), stale).is_err());
    assert!(arena.reconcile(stale, stale).is_err());
    arena.check_invariants();
    arena.release_route(a);
}

#[test]
#[should_panic(expected = "reconcile was skipped")]
fn test_transfer_without_reconcile_panics() {
    let data = line_problem(4);
    let mut arena = Arena::new(&data);
    let (a, na) = build_route(&mut arena, 0, &[1, 2]);
    let (b, nb) = build_route(&mut arena, 1, &[3, 4]);

    Exchange::<1, 1>::new()
        .apply(na[1], nb[0], arena.engine_mut())
        .unwrap();
    // The registry still says A owns na[1], but it now sits in B.
    let _ = arena.append(b.id(), na[1]);
    arena.release_route(a);
}

#[test]
fn test_node_handle_follows_reconcile() {
    let data = line_problem(3);
    let mut arena = Arena::new(&data);
    let a = arena.add_route(0, 0).unwrap();
    let b = arena.add_route(0, 1).unwrap();
    let (ida, idb) = (a.id(), b.id());
    let n1 = arena.add_route_node(&a, 1).unwrap();
    let n3 = arena.add_route_node(&b, 3).unwrap();

    Exchange::<1, 1>::new()
        .apply(n1.id(), n3.id(), arena.engine_mut())
        .unwrap();
    assert_eq!(arena.reconcile(ida, idb).unwrap(), 2);
    assert_eq!(arena.holder(n1.id()), Some(idb));
    assert_eq!(arena.holder(n3.id()), Some(ida));
    arena.check_invariants();

    arena.release_node(n3);
    arena.release_route(b);
    assert!(arena.route(idb).is_ok());
    assert_eq!(arena.owner(n1.id()), Some(Owner::Route(idb)));
    assert_eq!(arena.engine().node(n1.id()).unwrap().location(), 1);
    arena.check_invariants();

    arena.release_route(a);
    assert!(arena.route(ida).is_err());
    assert!(arena.engine().node(n1.id()).is_some());
    arena.check_invariants();

    arena.release_node(n1);
    assert_eq!(arena.num_routes(), 0);
    assert_eq!(arena.engine().num_nodes(), 0);
    arena.check_invariants();
}

#[test]
fn test_reconcile_releases_unreferenced_route() {
    let data = line_problem(3);
    let mut arena = Arena::new(&data);
    let a = arena.add_route(0, 0).unwrap();
    let b = arena.add_route(0, 1).unwrap();
    let (ida, idb) = (a.id(), b.id());
    let n1 = arena.add_route_node(&a, 1).unwrap();
    let n2 = arena.add_route_node(&b, 2).unwrap();
    arena.release_node(n2);
    arena.release_route(a);

    // Relocating the only held node leaves `a` unreferenced.
    let depot = arena.route(idb).unwrap().start_depot();
    Exchange::<1, 0>::new()
        .apply(n1.id(), depot, arena.engine_mut())
        .unwrap();
    assert_eq!(arena.reconcile(ida, idb).unwrap(), 1);
    assert!(arena.route(ida).is_err());
    assert_eq!(arena.scan(idb).unwrap().len(), 2);
    arena.check_invariants();

    arena.release_node(n1);
    arena.release_route(b);
    assert_eq!(arena.engine().num_nodes(), 0);
}
