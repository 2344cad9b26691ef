pub mod model;
pub mod error;
pub mod geometry {
    pub mod intersect;
    pub mod limits;
    pub mod noise;
    pub mod pseudo_noise;
    pub mod random;
    pub mod tolerance;
}
pub mod view_map;
pub mod curve;
pub mod stroke;
pub mod interface;
pub mod chain;
pub mod predicates;
pub mod functions;
pub mod algorithms {
    pub mod chaining;
    pub mod create;
    pub mod smoother;
    pub mod split;
}
pub mod shaders {
    pub mod advanced;
    pub mod basic;
    pub use basic::StrokeShader;
}
pub mod rep {
    pub mod strip;
    pub mod stroke_rep;
}
pub mod config;
mod json;

pub use algorithms::chaining::{ChainingIterator, ChainingPolicy, PredicateChaining, SilhouetteChaining};
pub use chain::Chain;
pub use curve::{Curve, CurvePoint};
pub use error::{ConfigError, CurveError, EvalError, OperatorError, StrokeError};
pub use interface::{Interface0D, Interface0DIterator, Interface1D};
pub use model::{Id, MediumType, Rgb, Vec2, Vec3};
pub use rep::strip::{Strip, StrokeVertexRep};
pub use rep::stroke_rep::StrokeRep;
pub use shaders::StrokeShader;
pub use stroke::{Stroke, StrokeAttribute, StrokeVertex};
pub use view_map::{Nature, ViewEdge, ViewMap};

use predicates::{BinaryPredicate1D, UnaryPredicate1D};

/// Which container operators currently act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrentSet {
    ViewEdges,
    Chains,
}

/// One run of the stroke pipeline over a view map: the current view edges,
/// the chains built from them and the strokes created so far.
///
/// The view map is only borrowed; the session writes nothing to it but the
/// edge time stamps.
#[derive(Debug)]
pub struct ChainingSession<'a> {
    pub(crate) view_map: &'a ViewMap,
    pub(crate) view_edges: Vec<&'a ViewEdge>,
    pub(crate) chains: Vec<Chain>,
    pub(crate) strokes: Vec<Stroke>,
    pub(crate) current: CurrentSet,
    pub(crate) time_stamp: u32,
}

impl<'a> ChainingSession<'a> {
    pub fn new(view_map: &'a ViewMap) -> Self {
        let mut session = ChainingSession {
            view_map,
            view_edges: Vec::new(),
            chains: Vec::new(),
            strokes: Vec::new(),
            current: CurrentSet::ViewEdges,
            time_stamp: 1,
        };
        session.reset(true);
        session
    }

    /// Repopulates the view edges from the view map, skipping edges of
    /// zero length, and drops every chain. Strokes survive unless
    /// `remove_strokes`.
    pub fn reset(&mut self, remove_strokes: bool) {
        let vm = self.view_map;
        self.view_edges = vm.edges().iter().filter(|e| e.length_2d() >= geometry::tolerance::M_EPSILON).collect();
        self.chains.clear();
        self.current = CurrentSet::ViewEdges;
        if remove_strokes {
            self.strokes.clear();
        }
    }

    pub fn view_map(&self) -> &'a ViewMap { self.view_map }
    pub fn time_stamp(&self) -> u32 { self.time_stamp }
    pub fn increment_time_stamp(&mut self) { self.time_stamp += 1; }
    pub fn current_set(&self) -> CurrentSet { self.current }

    pub fn current_len(&self) -> usize {
        match self.current {
            CurrentSet::ViewEdges => self.view_edges.len(),
            CurrentSet::Chains => self.chains.len(),
        }
    }

    pub(crate) fn current_element(&self, i: usize) -> Option<&dyn Interface1D> {
        match self.current {
            CurrentSet::ViewEdges => self.view_edges.get(i).map(|e| *e as &dyn Interface1D),
            CurrentSet::Chains => self.chains.get(i).map(|c| c as &dyn Interface1D),
        }
    }

    pub fn view_edges_size(&self) -> usize { self.view_edges.len() }
    pub fn chains_size(&self) -> usize { self.chains.len() }
    pub fn strokes_size(&self) -> usize { self.strokes.len() }
    pub fn view_edge_from_index(&self, i: usize) -> Option<&'a ViewEdge> { self.view_edges.get(i).copied() }
    pub fn chain_from_index(&self, i: usize) -> Option<&Chain> { self.chains.get(i) }
    pub fn stroke_from_index(&self, i: usize) -> Option<&Stroke> { self.strokes.get(i) }
    pub fn chains(&self) -> &[Chain] { &self.chains }
    pub fn strokes(&self) -> &[Stroke] { &self.strokes }
    pub fn strokes_mut(&mut self) -> &mut [Stroke] { &mut self.strokes }
    pub fn take_strokes(&mut self) -> Vec<Stroke> { std::mem::take(&mut self.strokes) }

    /// Keeps the elements of the current set that satisfy `pred` and stamps
    /// them with the session time stamp. Every element visited gets its
    /// chaining time stamp first. On error the set is left as it was; the
    /// stamps already written stay.
    pub fn select<U>(&mut self, pred: &mut U) -> Result<(), OperatorError>
    where
        U: UnaryPredicate1D + ?Sized,
    {
        let ts = self.time_stamp;
        let mut keep = Vec::with_capacity(self.current_len());
        for i in 0..self.current_len() {
            let Some(element) = self.current_element(i) else { continue };
            element.set_chaining_time_stamp(ts);
            let kept = pred.evaluate(element).map_err(OperatorError::Predicate)?;
            if kept {
                element.set_time_stamp(ts);
            }
            keep.push(kept);
        }
        match self.current {
            CurrentSet::ViewEdges => retain_flagged(&mut self.view_edges, &keep),
            CurrentSet::Chains => retain_flagged(&mut self.chains, &keep),
        }
        log::debug!("select kept {} of {} elements", self.current_len(), keep.len());
        Ok(())
    }

    /// Stable sort of the current set, `less(a, b)` telling whether `a`
    /// goes first. On error the order is unchanged.
    pub fn sort<B>(&mut self, less: &mut B) -> Result<(), OperatorError>
    where
        B: BinaryPredicate1D + ?Sized,
    {
        let n = self.current_len();
        let order = {
            let this = &*self;
            stable_order(n, &mut |a, b| match (this.current_element(a), this.current_element(b)) {
                (Some(x), Some(y)) => less.evaluate(x, y),
                _ => Ok(false),
            })
            .map_err(OperatorError::Predicate)?
        };
        match self.current {
            CurrentSet::ViewEdges => apply_order(&mut self.view_edges, &order),
            CurrentSet::Chains => apply_order(&mut self.chains, &order),
        }
        Ok(())
    }
}

fn retain_flagged<T>(items: &mut Vec<T>, keep: &[bool]) {
    let mut flags = keep.iter();
    items.retain(|_| flags.next().copied().unwrap_or(false));
}

fn apply_order<T>(items: &mut Vec<T>, order: &[usize]) {
    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    items.extend(order.iter().filter_map(|&i| slots.get_mut(i).and_then(Option::take)));
}

// Bottom-up merge sort over indices with a fallible comparison.
fn stable_order<E>(n: usize, less: &mut dyn FnMut(usize, usize) -> Result<bool, E>) -> Result<Vec<usize>, E> {
    let mut order: Vec<usize> = (0..n).collect();
    let mut buf = Vec::with_capacity(n);
    let mut width = 1;
    while width < n {
        buf.clear();
        let mut lo = 0;
        while lo < n {
            let mid = (lo + width).min(n);
            let hi = (lo + 2 * width).min(n);
            let (mut i, mut j) = (lo, mid);
            while i < mid && j < hi {
                // Right goes first only when strictly less
                if less(order[j], order[i])? {
                    buf.push(order[j]);
                    j += 1;
                } else {
                    buf.push(order[i]);
                    i += 1;
                }
            }
            buf.extend_from_slice(&order[i..mid]);
            buf.extend_from_slice(&order[j..hi]);
            lo = hi;
        }
        std::mem::swap(&mut order, &mut buf);
        width *= 2;
    }
    Ok(order)
}
