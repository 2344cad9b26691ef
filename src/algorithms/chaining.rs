// Chaining: walking the view map from edge to edge and assembling chains.

use crate::chain::Chain;
use crate::error::{EvalError, OperatorError};
use crate::functions::UnaryFunction1DVoid;
use crate::interface::Interface1D;
use crate::model::Id;
use crate::predicates::{BinaryPredicate1D, UnaryPredicate1D};
use crate::view_map::{Nature, VertexKind, ViewEdge, ViewMap, ViewVertex};
use crate::{ChainingSession, CurrentSet};

/// The edges a walk may continue on from `vertex`, after `current`.
pub struct Adjacency<'a> {
    pub vertex: &'a ViewVertex,
    pub current: &'a ViewEdge,
    pub candidates: Vec<&'a ViewEdge>,
}

impl Adjacency<'_> {
    /// Candidate continuing `current` through a T-vertex, if it is allowed.
    pub fn mate(&self) -> Option<u32> {
        let mate = self.vertex.mate(self.current.index())?;
        self.candidates.iter().find(|e| e.index() == mate).map(|e| e.index())
    }

    pub fn is_t_vertex(&self) -> bool { matches!(self.vertex.kind, VertexKind::T { .. }) }
}

/// Decides which edge a chaining walk takes next.
pub trait ChainingPolicy {
    fn init(&mut self) -> Result<(), EvalError> { Ok(()) }
    fn traverse(&mut self, adjacency: &Adjacency<'_>) -> Result<Option<u32>, EvalError>;
}

// Continuation order when the current edge carries several natures.
const NATURE_PRECEDENCE: [Nature; 8] = [
    Nature::SILHOUETTE,
    Nature::BORDER,
    Nature::CREASE,
    Nature::MATERIAL_BOUNDARY,
    Nature::EDGE_MARK,
    Nature::SUGGESTIVE_CONTOUR,
    Nature::VALLEY,
    Nature::RIDGE,
];

/// Follows lines of the same nature: through T-vertices to the mate, at
/// ordinary vertices only when exactly one candidate shares the nature.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilhouetteChaining;

impl ChainingPolicy for SilhouetteChaining {
    fn traverse(&mut self, adj: &Adjacency<'_>) -> Result<Option<u32>, EvalError> {
        if adj.is_t_vertex() {
            return Ok(adj.mate());
        }
        let Some(nature) = NATURE_PRECEDENCE.iter().find(|n| adj.current.nature.intersects(**n)) else {
            return Ok(None);
        };
        let mut found = adj.candidates.iter().filter(|e| e.nature.intersects(*nature));
        match (found.next(), found.next()) {
            (Some(e), None) => Ok(Some(e.index())),
            _ => Ok(None),
        }
    }
}

/// Takes the first candidate accepted by `unary` that `binary` pairs with
/// the current edge.
pub struct PredicateChaining<U, B> {
    pub unary: U,
    pub binary: B,
}

impl<U, B> PredicateChaining<U, B> {
    pub fn new(unary: U, binary: B) -> Self { PredicateChaining { unary, binary } }
}

impl<U: UnaryPredicate1D, B: BinaryPredicate1D> ChainingPolicy for PredicateChaining<U, B> {
    fn traverse(&mut self, adj: &Adjacency<'_>) -> Result<Option<u32>, EvalError> {
        if adj.is_t_vertex() {
            return Ok(adj.mate());
        }
        for ve in adj.candidates.iter().filter(|e| e.id != adj.current.id) {
            if self.unary.evaluate(*ve)? && self.binary.evaluate(adj.current, *ve)? {
                return Ok(Some(ve.index()));
            }
        }
        Ok(None)
    }
}

/// Cursor over view edges driven by a [`ChainingPolicy`]. `orientation` is
/// true when the current edge is walked from its `a` vertex to its `b`.
#[derive(Clone, Debug)]
pub struct ChainingIterator<P> {
    policy: P,
    restrict_to_selection: bool,
    restrict_to_unvisited: bool,
    begin: Option<u32>,
    edge: Option<u32>,
    orientation: bool,
    forward: bool,
}

impl<P: ChainingPolicy> ChainingIterator<P> {
    pub fn new(policy: P, restrict_to_selection: bool, restrict_to_unvisited: bool) -> Self {
        ChainingIterator {
            policy,
            restrict_to_selection,
            restrict_to_unvisited,
            begin: None,
            edge: None,
            orientation: true,
            forward: true,
        }
    }

    pub fn policy(&self) -> &P { &self.policy }
    pub fn begin(&self) -> Option<u32> { self.begin }
    pub fn set_begin(&mut self, edge: Option<u32>) { self.begin = edge; }
    pub fn current_edge(&self) -> Option<u32> { self.edge }
    pub fn set_current_edge(&mut self, edge: Option<u32>) { self.edge = edge; }
    pub fn orientation(&self) -> bool { self.orientation }
    pub fn set_orientation(&mut self, orientation: bool) { self.orientation = orientation; }
    pub fn is_end(&self) -> bool { self.edge.is_none() }

    pub fn init(&mut self) -> Result<(), EvalError> { self.policy.init() }

    fn allowed(&self, edge: &ViewEdge, ts: u32) -> bool {
        if self.restrict_to_selection && edge.time_stamp() != ts {
            return false;
        }
        if self.restrict_to_unvisited && edge.chaining_time_stamp() > ts {
            return false;
        }
        true
    }

    // Vertex the walk leaves the current edge through.
    fn exit_vertex(&self, edge: &ViewEdge) -> u32 {
        match (self.forward, self.orientation) {
            (true, true) | (false, false) => edge.b,
            _ => edge.a,
        }
    }

    fn step(&mut self, vm: &ViewMap, ts: u32) -> Result<Option<(u32, u32)>, EvalError> {
        let Some(edge) = self.edge.and_then(|e| vm.edge(e)) else { return Ok(None) };
        let vertex_id = self.exit_vertex(edge);
        let Some(vertex) = vm.vertex(vertex_id) else { return Ok(None) };
        let candidates: Vec<&ViewEdge> = vertex
            .edges()
            .iter()
            .filter_map(|o| vm.edge(o.edge))
            .filter(|e| self.allowed(e, ts))
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }
        let adjacency = Adjacency { vertex, current: edge, candidates };
        let next = self.policy.traverse(&adjacency)?;
        Ok(next.map(|n| (n, vertex_id)))
    }

    /// Moves to the edge following the current one. `ts` is the session's
    /// time stamp used by the selection and visit restrictions.
    pub fn increment(&mut self, vm: &ViewMap, ts: u32) -> Result<(), EvalError> {
        self.forward = true;
        let next = self.step(vm, ts)?;
        self.land(vm, next, true);
        Ok(())
    }

    pub fn decrement(&mut self, vm: &ViewMap, ts: u32) -> Result<(), EvalError> {
        self.forward = false;
        let next = self.step(vm, ts)?;
        self.land(vm, next, false);
        Ok(())
    }

    fn land(&mut self, vm: &ViewMap, next: Option<(u32, u32)>, forward: bool) {
        self.edge = match next {
            Some((e, _)) if Some(e) == self.begin => None,
            Some((e, vertex)) => {
                if let Some(edge) = vm.edge(e) {
                    // Leaving from `vertex`: forward walks start there, backward walks end there
                    self.orientation = if forward { edge.a == vertex } else { edge.b == vertex };
                }
                Some(e)
            }
            None => None,
        };
    }
}

impl<'a> ChainingSession<'a> {
    fn stamp_chained(&self, edge: &ViewEdge) { edge.set_chaining_time_stamp(self.time_stamp + 1); }

    fn is_chained(&self, edge: &ViewEdge) -> bool { edge.chaining_time_stamp() > self.time_stamp }

    // Chaining reads view edges, never chains.
    fn has_edges_to_chain(&self, operator: &str) -> bool {
        if self.current == CurrentSet::Chains {
            log::warn!("{} called while chains are current; reset first", operator);
            return false;
        }
        !self.view_edges.is_empty()
    }

    fn commit_chains(&mut self, new_chains: Vec<Chain>) {
        if !new_chains.is_empty() {
            log::debug!("chaining built {} chains", new_chains.len());
            self.chains.extend(new_chains);
            self.current = CurrentSet::Chains;
        }
    }

    /// Builds one chain from every current view edge for which `pred` is
    /// false and that no earlier walk of this call has taken. Does nothing
    /// when chains are the current set. A walk stops
    /// where `pred` holds, at an already chained edge, or where `it` ends.
    /// On error no chain of this call is kept.
    pub fn chain<P, U>(&mut self, it: &mut ChainingIterator<P>, pred: &mut U) -> Result<(), OperatorError>
    where
        P: ChainingPolicy,
        U: UnaryPredicate1D + ?Sized,
    {
        if !self.has_edges_to_chain("chain") {
            return Ok(());
        }
        let vm = self.view_map;
        let ts = self.time_stamp;
        let mut new_chains = Vec::new();
        let mut id = 0;
        for &start in &self.view_edges {
            if pred.evaluate(start).map_err(OperatorError::Predicate)? || self.is_chained(start) {
                continue;
            }
            it.set_begin(Some(start.index()));
            it.set_current_edge(Some(start.index()));
            it.set_orientation(true);
            let mut chain = Chain::new(Id::new(id, 0));
            id += 1;
            let mut edge = start;
            loop {
                chain.push_viewedge_back(edge, it.orientation())?;
                self.stamp_chained(edge);
                it.increment(vm, ts).map_err(OperatorError::Traversal)?;
                let Some(next) = it.current_edge().and_then(|e| vm.edge(e)) else { break };
                if pred.evaluate(next).map_err(OperatorError::Predicate)? || self.is_chained(next) {
                    break;
                }
                edge = next;
            }
            new_chains.push(chain);
        }
        self.commit_chains(new_chains);
        Ok(())
    }

    /// Like [`chain`](Self::chain), with `modifier` applied to every edge
    /// taken instead of the built-in visit stamping.
    pub fn chain_with_modifier<P, U, M>(
        &mut self,
        it: &mut ChainingIterator<P>,
        pred: &mut U,
        modifier: &mut M,
    ) -> Result<(), OperatorError>
    where
        P: ChainingPolicy,
        U: UnaryPredicate1D + ?Sized,
        M: UnaryFunction1DVoid + ?Sized,
    {
        if !self.has_edges_to_chain("chain_with_modifier") {
            return Ok(());
        }
        let vm = self.view_map;
        let ts = self.time_stamp;
        let mut new_chains = Vec::new();
        let mut id = 0;
        for &start in &self.view_edges {
            if pred.evaluate(start).map_err(OperatorError::Predicate)? {
                continue;
            }
            it.set_begin(Some(start.index()));
            it.set_current_edge(Some(start.index()));
            it.set_orientation(true);
            let mut chain = Chain::new(Id::new(id, 0));
            id += 1;
            let mut edge = start;
            loop {
                chain.push_viewedge_back(edge, it.orientation())?;
                modifier.evaluate(edge).map_err(OperatorError::Modifier)?;
                it.increment(vm, ts).map_err(OperatorError::Traversal)?;
                let Some(next) = it.current_edge().and_then(|e| vm.edge(e)) else { break };
                if pred.evaluate(next).map_err(OperatorError::Predicate)? {
                    break;
                }
                edge = next;
            }
            new_chains.push(chain);
        }
        self.commit_chains(new_chains);
        Ok(())
    }

    /// Grows each chain in both directions from its start edge: forward to
    /// the back of the chain, then backward to its front.
    pub fn bidirectional_chain<P, U>(&mut self, it: &mut ChainingIterator<P>, pred: &mut U) -> Result<(), OperatorError>
    where
        P: ChainingPolicy,
        U: UnaryPredicate1D + ?Sized,
    {
        if !self.has_edges_to_chain("bidirectional_chain") {
            return Ok(());
        }
        let vm = self.view_map;
        let ts = self.time_stamp;
        let mut new_chains = Vec::new();
        let mut id = 0;
        for &start in &self.view_edges {
            if pred.evaluate(start).map_err(OperatorError::Predicate)? || self.is_chained(start) {
                continue;
            }
            it.set_begin(Some(start.index()));
            it.set_current_edge(Some(start.index()));
            it.set_orientation(true);
            it.init().map_err(OperatorError::Traversal)?;
            let mut chain = Chain::new(Id::new(id, 0));
            id += 1;

            let mut edge = start;
            loop {
                chain.push_viewedge_back(edge, it.orientation())?;
                self.stamp_chained(edge);
                it.increment(vm, ts).map_err(OperatorError::Traversal)?;
                let Some(next) = it.current_edge().and_then(|e| vm.edge(e)) else { break };
                if pred.evaluate(next).map_err(OperatorError::Predicate)? {
                    break;
                }
                edge = next;
            }

            it.set_begin(Some(start.index()));
            it.set_current_edge(Some(start.index()));
            it.set_orientation(true);
            it.decrement(vm, ts).map_err(OperatorError::Traversal)?;
            while let Some(edge) = it.current_edge().and_then(|e| vm.edge(e)) {
                chain.push_viewedge_front(edge, it.orientation())?;
                self.stamp_chained(edge);
                it.decrement(vm, ts).map_err(OperatorError::Traversal)?;
                match it.current_edge().and_then(|e| vm.edge(e)) {
                    Some(next) if pred.evaluate(next).map_err(OperatorError::Predicate)? => break,
                    _ => {}
                }
            }
            new_chains.push(chain);
        }
        self.commit_chains(new_chains);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::{FalseUP1D, TrueUP1D};

    fn line(n: usize, nature: Nature) -> ViewMap {
        let mut vm = ViewMap::new();
        let vs: Vec<u32> = (0..=n).map(|i| vm.add_vertex(i as f64, 0.0)).collect();
        for w in vs.windows(2) {
            vm.add_edge(w[0], w[1], nature);
        }
        vm
    }

    #[test]
    fn silhouette_walk_follows_the_line() {
        let vm = line(3, Nature::SILHOUETTE);
        let mut session = ChainingSession::new(&vm);
        session.select(&mut TrueUP1D).unwrap();
        let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
        session.chain(&mut it, &mut FalseUP1D).unwrap();
        assert_eq!(session.chains_size(), 1);
        let chain = session.chain_from_index(0).unwrap();
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.length_2d(), 3.0);
        assert_eq!(chain.id(), Id::new(0, 0));
    }

    #[test]
    fn bidirectional_walk_reaches_both_ends() {
        let vm = line(4, Nature::CREASE);
        let mut session = ChainingSession::new(&vm);
        session.select(&mut |e: &dyn Interface1D| Ok::<bool, EvalError>(e.id().first == 2)).unwrap();
        // Only edge 2 is selected; walk over everything unvisited
        let mut it = ChainingIterator::new(SilhouetteChaining, false, true);
        session.bidirectional_chain(&mut it, &mut FalseUP1D).unwrap();
        let chain = session.chain_from_index(0).unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.curve().front().unwrap().point().x, 0.0);
        assert_eq!(chain.curve().back().unwrap().point().x, 4.0);
    }

    #[test]
    fn mixed_natures_stop_the_walk() {
        let mut vm = ViewMap::new();
        let a = vm.add_vertex(0.0, 0.0);
        let b = vm.add_vertex(1.0, 0.0);
        let c = vm.add_vertex(2.0, 0.0);
        vm.add_edge(a, b, Nature::SILHOUETTE);
        vm.add_edge(b, c, Nature::RIDGE);
        let mut session = ChainingSession::new(&vm);
        session.select(&mut TrueUP1D).unwrap();
        let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
        session.chain(&mut it, &mut FalseUP1D).unwrap();
        assert_eq!(session.chains_size(), 2);
    }

    #[test]
    fn chaining_again_waits_for_reset() {
        let vm = line(3, Nature::SILHOUETTE);
        let mut session = ChainingSession::new(&vm);
        session.select(&mut TrueUP1D).unwrap();
        let mut it = ChainingIterator::new(SilhouetteChaining, true, true);
        session.chain(&mut it, &mut FalseUP1D).unwrap();
        assert_eq!(session.current_set(), CurrentSet::Chains);
        // The modifier walk does not skip chained start edges
        let mut visits = 0;
        let mut count = |_: &dyn Interface1D| {
            visits += 1;
            Ok::<(), EvalError>(())
        };
        session.chain_with_modifier(&mut it, &mut FalseUP1D, &mut count).unwrap();
        session.bidirectional_chain(&mut it, &mut FalseUP1D).unwrap();
        assert_eq!(visits, 0);
        assert_eq!(session.chains_size(), 1);

        session.reset(false);
        session.increment_time_stamp();
        session.select(&mut TrueUP1D).unwrap();
        session.chain(&mut it, &mut FalseUP1D).unwrap();
        assert_eq!(session.chains_size(), 1);
    }

    #[test]
    fn predicate_policy_errors_drop_the_batch() {
        let vm = line(3, Nature::BORDER);
        let mut session = ChainingSession::new(&vm);
        session.select(&mut TrueUP1D).unwrap();
        let failing = |_: &dyn Interface1D| Err::<bool, EvalError>(EvalError::failed("boom"));
        let mut it = ChainingIterator::new(PredicateChaining::new(failing, crate::predicates::TrueBP1D), true, true);
        let err = session.chain(&mut it, &mut FalseUP1D).unwrap_err();
        assert!(matches!(err, OperatorError::Traversal(_)));
        assert_eq!(session.chains_size(), 0);
    }
}
