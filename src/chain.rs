// Chains: curves assembled from consecutive view edges by the chaining
// operators, carrying enough provenance for predicates and splitting.

use crate::curve::{Curve, CurvePoint};
use crate::error::CurveError;
use crate::interface::{Interface0DIterator, Interface1D};
use crate::model::Id;
use crate::view_map::{Nature, ViewEdge};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
pub struct Chain {
    curve: Curve,
    // Next free fragment id, shared by every piece split off the same chain
    splitting_id: Option<Rc<Cell<Id>>>,
    time_stamp: Cell<u32>,
    chaining_time_stamp: Cell<u32>,
    nature: Nature,
    qi: Option<u32>,
    shape_id: Option<u32>,
}

impl Chain {
    pub fn new(id: Id) -> Self { Chain { curve: Curve::new(id), ..Default::default() } }

    pub fn id(&self) -> Id { self.curve.id() }
    pub fn set_id(&mut self, id: Id) { self.curve.set_id(id); }
    pub fn curve(&self) -> &Curve { &self.curve }
    pub fn len(&self) -> usize { self.curve.len() }
    pub fn is_empty(&self) -> bool { self.curve.is_empty() }
    pub fn n_segments(&self) -> usize { self.curve.n_segments() }

    fn absorb(&mut self, ve: &ViewEdge) {
        self.nature |= ve.nature;
        self.qi = Some(self.qi.map_or(ve.qi, |q| q.max(ve.qi)));
        if self.shape_id.is_none() {
            self.shape_id = Some(ve.shape_id);
        }
    }

    /// Appends the vertices of `ve`, walked from `a` to `b` when `orientation`
    /// holds. The junction vertex already at the back is not repeated.
    pub fn push_viewedge_back(&mut self, ve: &ViewEdge, orientation: bool) -> Result<(), CurveError> {
        let svs = ve.svertices();
        let ordered: Vec<_> = if orientation { svs.to_vec() } else { svs.iter().rev().copied().collect() };
        let mut rest = &ordered[..];
        if !self.curve.is_empty() {
            if let Some((first, tail)) = ordered.split_first() {
                // Continue from this edge's own junction vertex
                if self.curve.back().and_then(|cp| cp.on_vertex()).map_or(true, |sv| !sv.same(first)) {
                    self.curve.pop_back();
                    self.curve.push_svertex_back(*first)?;
                }
                rest = tail;
            }
        }
        for sv in rest {
            self.curve.push_svertex_back(*sv)?;
        }
        self.absorb(ve);
        Ok(())
    }

    /// Prepends the vertices of `ve`; `orientation` true means the edge's `b`
    /// end meets the current front.
    pub fn push_viewedge_front(&mut self, ve: &ViewEdge, orientation: bool) -> Result<(), CurveError> {
        let svs = ve.svertices();
        // Walk toward the front: from the junction away from it
        let ordered: Vec<_> = if orientation { svs.iter().rev().copied().collect() } else { svs.to_vec() };
        let skip = usize::from(!self.curve.is_empty());
        for sv in ordered.iter().skip(skip) {
            self.curve.push_svertex_front(*sv)?;
        }
        self.absorb(ve);
        Ok(())
    }

    pub fn push_vertex_back(&mut self, cp: CurvePoint) -> Result<(), CurveError> { self.curve.push_vertex_back(cp) }

    pub(crate) fn splitting_id(&self) -> Option<Rc<Cell<Id>>> { self.splitting_id.clone() }
    pub(crate) fn set_splitting_id(&mut self, id: Rc<Cell<Id>>) { self.splitting_id = Some(id); }

    // Fragment of this chain: same provenance, fresh geometry.
    pub(crate) fn fragment(&self, id: Id) -> Chain {
        Chain {
            curve: Curve::new(id),
            splitting_id: None,
            time_stamp: Cell::new(self.time_stamp.get()),
            chaining_time_stamp: Cell::new(self.chaining_time_stamp.get()),
            nature: self.nature,
            qi: self.qi,
            shape_id: self.shape_id,
        }
    }
}

impl Interface1D for Chain {
    fn id(&self) -> Id { self.curve.id() }
    fn length_2d(&self) -> f64 { self.curve.length_2d() }
    fn time_stamp(&self) -> u32 { self.time_stamp.get() }
    fn set_time_stamp(&self, ts: u32) { self.time_stamp.set(ts) }
    fn chaining_time_stamp(&self) -> u32 { self.chaining_time_stamp.get() }
    fn set_chaining_time_stamp(&self, ts: u32) { self.chaining_time_stamp.set(ts) }
    fn nature(&self) -> Nature { self.nature }
    fn quantitative_invisibility(&self) -> Option<u32> { self.qi }
    fn shape_id(&self) -> Option<u32> { self.shape_id }

    fn points(&self, step: f32) -> Interface0DIterator<'_> { Interface0DIterator::Curve(self.curve.points(step)) }
    fn points_end(&self, step: f32) -> Interface0DIterator<'_> { Interface0DIterator::Curve(self.curve.points_end(step)) }

    fn as_chain(&self) -> Option<&Chain> { Some(self) }
}
