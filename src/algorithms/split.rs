// Splitting chains: sequentially at predicate hits, or recursively at the
// point of minimal score.

use crate::chain::Chain;
use crate::curve::CurvePoint;
use crate::error::OperatorError;
use crate::functions::UnaryFunction0D;
use crate::geometry::tolerance::{EPS_COINCIDENT, M_EPSILON};
use crate::interface::Interface1D;
use crate::model::Id;
use crate::predicates::{TrueUP0D, UnaryPredicate0D, UnaryPredicate1D};
use crate::{ChainingSession, CurrentSet};
use std::cell::Cell;
use std::rc::Rc;

impl<'a> ChainingSession<'a> {
    // Replaces the chains with `fragments`, minus the degenerate ones.
    fn commit_fragments(&mut self, fragments: Vec<Chain>) {
        let before = fragments.len();
        self.chains = fragments.into_iter().filter(|c| c.length_2d() >= M_EPSILON).collect();
        if self.chains.len() != before {
            log::debug!("split dropped {} zero-length fragments", before - self.chains.len());
        }
        if !self.chains.is_empty() {
            self.current = CurrentSet::Chains;
        }
    }

    /// Cuts every chain at each point, sampled every `sampling`, where `pred`
    /// holds. The last point never starts a fragment. Fragments keep the
    /// chain's first id component and count up the second. On error the
    /// chains are left as they were.
    pub fn sequential_split<P>(&mut self, pred: &mut P, sampling: f32) -> Result<(), OperatorError>
    where
        P: UnaryPredicate0D + ?Sized,
    {
        if self.chains.is_empty() {
            log::warn!("sequential_split called with no chains; was reset forgotten?");
            return Ok(());
        }
        let mut fragments = Vec::new();
        for chain in &self.chains {
            let mut id = chain.id();
            let mut last = chain.points_end(sampling);
            last.decrement();
            let mut it = chain.points(sampling);
            let Some(first) = it.curve_point() else { continue };

            let mut fragment = chain.fragment(id);
            fragment.push_vertex_back(first)?;
            it.increment();
            while let Some(point) = it.curve_point() {
                fragment.push_vertex_back(point)?;
                if pred.evaluate(&it).map_err(OperatorError::Predicate)? && it != last {
                    fragments.push(fragment);
                    id.second += 1;
                    fragment = chain.fragment(id);
                    fragment.push_vertex_back(point)?;
                }
                it.increment();
            }
            if fragment.n_segments() > 0 {
                fragments.push(fragment);
            }
        }
        self.commit_fragments(fragments);
        Ok(())
    }

    /// Cuts every chain into the pieces running from a point where `start`
    /// holds to the next point where `stop` holds. Pieces may overlap when a
    /// new start comes before the previous stop.
    pub fn sequential_split_range<S, T>(&mut self, start: &mut S, stop: &mut T, sampling: f32) -> Result<(), OperatorError>
    where
        S: UnaryPredicate0D + ?Sized,
        T: UnaryPredicate0D + ?Sized,
    {
        if self.chains.is_empty() {
            log::warn!("sequential_split_range called with no chains; was reset forgotten?");
            return Ok(());
        }
        let mut fragments = Vec::new();
        for chain in &self.chains {
            let mut id = chain.id();
            let mut last = chain.points_end(sampling);
            last.decrement();
            let mut it_start = chain.points(sampling);
            while !it_start.is_end() {
                let mut fragment = chain.fragment(id);
                id.second += 1;
                if let Some(p) = it_start.curve_point() {
                    fragment.push_vertex_back(p)?;
                }

                let mut it_stop = it_start.clone();
                it_stop.increment();
                while let Some(p) = it_stop.curve_point() {
                    fragment.push_vertex_back(p)?;
                    it_stop.increment();
                    if it_stop.is_end() || stop.evaluate(&it_stop).map_err(OperatorError::Predicate)? {
                        break;
                    }
                }
                if let Some(p) = it_stop.curve_point() {
                    fragment.push_vertex_back(p)?;
                }
                if fragment.n_segments() > 0 {
                    fragments.push(fragment);
                }

                loop {
                    it_start.increment();
                    if it_start.is_end() || start.evaluate(&it_start).map_err(OperatorError::Predicate)? {
                        break;
                    }
                }
                if it_start == last {
                    break;
                }
            }
        }
        self.commit_fragments(fragments);
        Ok(())
    }

    /// Splits every chain in two at the interior point where `func` is
    /// smallest, and recurses on both halves. A split is undone when `pred`
    /// holds on either half; chains for which `pred` already holds are kept
    /// whole. On error the chains are left as they were.
    pub fn recursive_split<F, P>(&mut self, func: &mut F, pred: &mut P, sampling: f32) -> Result<(), OperatorError>
    where
        F: UnaryFunction0D<f64> + ?Sized,
        P: UnaryPredicate1D + ?Sized,
    {
        self.recursive_split_filtered(func, &mut TrueUP0D, pred, sampling)
    }

    /// Like [`recursive_split`](Self::recursive_split), with split points
    /// restricted to those satisfying `pred0d`.
    pub fn recursive_split_filtered<F, P0, P>(
        &mut self,
        func: &mut F,
        pred0d: &mut P0,
        pred: &mut P,
        sampling: f32,
    ) -> Result<(), OperatorError>
    where
        F: UnaryFunction0D<f64> + ?Sized,
        P0: UnaryPredicate0D + ?Sized,
        P: UnaryPredicate1D + ?Sized,
    {
        if self.chains.is_empty() {
            log::warn!("recursive_split called with no chains; was reset forgotten?");
            return Ok(());
        }
        // Counters shared with earlier splits are restored on failure
        let counters = splitting_counters(&self.chains);
        let mut out = Vec::with_capacity(self.chains.len());
        let mut splitter = RecursiveSplit { func, pred0d, pred, sampling };
        let result = self.chains.iter().try_for_each(|chain| {
            if splitter.pred.evaluate(chain).map_err(OperatorError::Predicate)? {
                out.push(chain.clone());
                Ok(())
            } else {
                splitter.split(chain.clone(), &mut out)
            }
        });
        if let Err(e) = result {
            for (counter, id) in counters {
                counter.set(id);
            }
            return Err(e);
        }
        self.commit_fragments(out);
        Ok(())
    }
}

fn splitting_counters(chains: &[Chain]) -> Vec<(Rc<Cell<Id>>, Id)> {
    let mut seen: Vec<(Rc<Cell<Id>>, Id)> = Vec::new();
    for counter in chains.iter().filter_map(Chain::splitting_id) {
        if !seen.iter().any(|(c, _)| Rc::ptr_eq(c, &counter)) {
            let id = counter.get();
            seen.push((counter, id));
        }
    }
    seen
}

fn take_id(counter: &Cell<Id>) -> Id {
    let id = counter.get();
    counter.set(Id::new(id.first, id.second + 1));
    id
}

struct RecursiveSplit<'f, F: ?Sized, P0: ?Sized, P: ?Sized> {
    func: &'f mut F,
    pred0d: &'f mut P0,
    pred: &'f mut P,
    sampling: f32,
}

impl<F, P0, P> RecursiveSplit<'_, F, P0, P>
where
    F: UnaryFunction0D<f64> + ?Sized,
    P0: UnaryPredicate0D + ?Sized,
    P: UnaryPredicate1D + ?Sized,
{
    // Interior sample with the lowest score, with its abscissa.
    fn best_split(&mut self, chain: &Chain) -> Result<Option<(CurvePoint, f64)>, OperatorError> {
        let mut min = f32::MAX as f64;
        let mut best = None;
        let mut it = chain.points(self.sampling);
        it.increment();
        while !it.is_end() {
            let mut next = it.clone();
            next.increment();
            if next.is_end() {
                break;
            }
            // Both halves must keep some length
            let t = it.t();
            let interior = t > EPS_COINCIDENT && t < chain.length_2d() - EPS_COINCIDENT;
            if interior && self.pred0d.evaluate(&it).map_err(OperatorError::Predicate)? {
                let score = self.func.evaluate(&it).map_err(OperatorError::Function)?;
                if score < min {
                    if let Some(cp) = it.curve_point() {
                        min = score;
                        best = Some((cp, t));
                    }
                }
            }
            it = next;
        }
        Ok(best)
    }

    fn split(&mut self, mut chain: Chain, out: &mut Vec<Chain>) -> Result<(), OperatorError> {
        if (chain.n_segments() == 1 && self.sampling == 0.0) || chain.length_2d() <= self.sampling as f64 {
            out.push(chain);
            return Ok(());
        }
        let Some((split, abscissa)) = self.best_split(&chain)? else {
            out.push(chain);
            return Ok(());
        };

        let counter = match chain.splitting_id() {
            Some(counter) => counter,
            None => {
                let counter = Rc::new(Cell::new(chain.id()));
                chain.set_splitting_id(counter.clone());
                counter
            }
        };
        let mut a = chain.fragment(take_id(&counter));
        a.set_splitting_id(counter.clone());
        let mut b = chain.fragment(take_id(&counter));
        b.set_splitting_id(counter);

        let vertices = vertex_abscissae(&chain);
        // Segment holding the split point
        let Some(i) = (0..vertices.len().saturating_sub(1)).find(|&i| vertices[i + 1].1 >= abscissa) else {
            log::debug!("split point of chain {} lies past its last segment", chain.id());
            out.push(chain);
            return Ok(());
        };
        if (vertices[i + 1].1 - abscissa).abs() < EPS_COINCIDENT {
            // On vertex i + 1: both halves share it
            for (cp, _) in &vertices[..=i + 1] {
                a.push_vertex_back(*cp)?;
            }
            for (cp, _) in &vertices[i + 1..] {
                b.push_vertex_back(*cp)?;
            }
        } else {
            for (cp, _) in &vertices[..=i] {
                a.push_vertex_back(*cp)?;
            }
            a.push_vertex_back(split)?;
            b.push_vertex_back(split)?;
            for (cp, _) in &vertices[i + 1..] {
                b.push_vertex_back(*cp)?;
            }
        }

        let stop = self.pred.evaluate(&a).map_err(OperatorError::Predicate)?
            || self.pred.evaluate(&b).map_err(OperatorError::Predicate)?;
        if stop {
            out.push(chain);
            return Ok(());
        }
        self.split(a, out)?;
        self.split(b, out)
    }
}

fn vertex_abscissae(chain: &Chain) -> Vec<(CurvePoint, f64)> {
    let mut it = chain.curve().points(0.0);
    let mut out = Vec::with_capacity(chain.len());
    while let Some(cp) = it.current().copied() {
        out.push((cp, it.t()));
        it.increment();
    }
    out
}
