use ribbon::algorithms::chaining::{ChainingIterator, SilhouetteChaining};
use ribbon::predicates::{FalseUP1D, Length2DBP1D, TrueUP1D};
use ribbon::shaders::basic::ConstantThicknessShader;
use ribbon::{
    ChainingSession, EvalError, Interface0D, Interface0DIterator, Interface1D, Nature, OperatorError, StrokeShader, ViewMap,
};

fn polyline(points: &[(f64, f64)], nature: Nature) -> ViewMap {
    let mut vm = ViewMap::new();
    let vs: Vec<u32> = points.iter().map(|&(x, y)| vm.add_vertex(x, y)).collect();
    for w in vs.windows(2) {
        vm.add_edge(w[0], w[1], nature);
    }
    vm
}

fn line(n: usize) -> ViewMap {
    let pts: Vec<(f64, f64)> = (0..=n).map(|i| (i as f64, 0.0)).collect();
    polyline(&pts, Nature::SILHOUETTE)
}

fn chain_all(session: &mut ChainingSession<'_>) {
    session.select(&mut TrueUP1D).unwrap();
    let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
    session.chain(&mut it, &mut FalseUP1D).unwrap();
}

#[test]
fn select_on_empty_set_is_a_no_op() {
    let vm = ViewMap::new();
    let mut session = ChainingSession::new(&vm);
    session.select(&mut TrueUP1D).unwrap();
    assert_eq!(session.current_len(), 0);
}

#[test]
fn select_error_keeps_the_set_but_not_the_stamps() {
    let vm = line(3);
    let mut session = ChainingSession::new(&vm);
    assert_eq!(session.view_edges_size(), 3);
    let mut calls = 0;
    let mut pred = |_: &dyn Interface1D| {
        calls += 1;
        if calls == 2 {
            Err(EvalError::failed("second edge"))
        } else {
            Ok(false)
        }
    };
    let err = session.select(&mut pred).unwrap_err();
    assert!(matches!(err, OperatorError::Predicate(_)));
    assert_eq!(session.view_edges_size(), 3);
    // Edges visited before the failure keep their chaining stamp
    let ts = session.time_stamp();
    assert_eq!(vm.edge(0).unwrap().chaining_time_stamp(), ts);
    assert_eq!(vm.edge(1).unwrap().chaining_time_stamp(), ts);
    assert_ne!(vm.edge(2).unwrap().chaining_time_stamp(), ts);
}

#[test]
fn chain_with_always_true_predicate_builds_nothing() {
    let vm = line(5);
    let mut session = ChainingSession::new(&vm);
    session.select(&mut TrueUP1D).unwrap();
    let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
    session.chain(&mut it, &mut TrueUP1D).unwrap();
    assert_eq!(session.chains_size(), 0);
}

#[test]
fn chain_error_discards_every_chain_of_the_call() {
    // Two separate lines: the first walk succeeds, the second fails
    let mut vm = line(2);
    let a = vm.add_vertex(0.0, 5.0);
    let b = vm.add_vertex(1.0, 5.0);
    vm.add_edge(a, b, Nature::RIDGE);
    let mut session = ChainingSession::new(&vm);
    session.select(&mut TrueUP1D).unwrap();
    let mut pred = |e: &dyn Interface1D| {
        if e.nature().contains(Nature::RIDGE) {
            Err(EvalError::failed("ridge"))
        } else {
            Ok(false)
        }
    };
    let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
    assert!(session.chain(&mut it, &mut pred).is_err());
    assert_eq!(session.chains_size(), 0);
}

#[test]
fn sort_puts_longer_edges_first() {
    let vm = polyline(&[(0.0, 0.0), (1.0, 0.0), (4.0, 0.0), (6.0, 0.0)], Nature::CREASE);
    let mut session = ChainingSession::new(&vm);
    session.sort(&mut Length2DBP1D).unwrap();
    let lengths: Vec<f64> = (0..3).map(|i| session.view_edge_from_index(i).unwrap().length_2d()).collect();
    assert_eq!(lengths, vec![3.0, 2.0, 1.0]);
}

#[test]
fn sort_error_keeps_the_order() {
    let vm = polyline(&[(0.0, 0.0), (1.0, 0.0), (4.0, 0.0), (6.0, 0.0)], Nature::CREASE);
    let mut session = ChainingSession::new(&vm);
    let mut less = |_: &dyn Interface1D, _: &dyn Interface1D| Err::<bool, EvalError>(EvalError::failed("no order"));
    assert!(session.sort(&mut less).is_err());
    let ids: Vec<u32> = (0..3).map(|i| session.view_edge_from_index(i).unwrap().index()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn sequential_split_gives_increasing_fragment_ids() {
    let vm = line(6);
    let mut session = ChainingSession::new(&vm);
    chain_all(&mut session);
    let mut at_cut = |it: &Interface0DIterator<'_>| {
        Ok::<bool, EvalError>(it.current().map_or(false, |p| p.point().x == 2.0 || p.point().x == 4.0))
    };
    session.sequential_split(&mut at_cut, 0.0).unwrap();
    assert_eq!(session.chains_size(), 3);
    let seconds: Vec<u32> = session.chains().iter().map(|c| c.id().second).collect();
    assert_eq!(seconds, vec![0, 1, 2]);
    let total: f64 = session.chains().iter().map(|c| c.length_2d()).sum();
    assert!((total - 6.0).abs() < 1e-9);
}

#[test]
fn pipeline_creates_renderable_strokes() {
    let vm = polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], Nature::SILHOUETTE);
    let mut session = ChainingSession::new(&vm);
    chain_all(&mut session);
    assert_eq!(session.chains_size(), 1);
    let mut shaders: Vec<Box<dyn StrokeShader>> = vec![Box::new(ConstantThicknessShader { thickness: 4.0 })];
    session.create(&mut TrueUP1D, &mut shaders).unwrap();
    assert_eq!(session.strokes_size(), 1);

    let stroke = session.stroke_from_index(0).unwrap();
    assert_eq!(stroke.length_2d(), 20.0);
    assert!(stroke.vertices().iter().all(|v| v.attribute().thickness() == [2.0, 2.0]));
    let rep = stroke.to_rep();
    assert_eq!(rep.strips().len(), 1);
    assert_eq!(rep.strips()[0].len(), 2 * stroke.len());
}

#[test]
fn reset_keeps_strokes_unless_asked() {
    let vm = line(2);
    let mut session = ChainingSession::new(&vm);
    chain_all(&mut session);
    session.create(&mut TrueUP1D, &mut []).unwrap();
    session.reset(false);
    assert_eq!(session.strokes_size(), 1);
    assert_eq!(session.chains_size(), 0);
    session.reset(true);
    assert_eq!(session.strokes_size(), 0);
}
