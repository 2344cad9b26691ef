// Stroke creation: materialising strokes from the current set and running
// them through the shader pipeline.

use crate::error::{EvalError, OperatorError};
use crate::geometry::tolerance::{EPS_COINCIDENT, SINGULARITY_OFFSET};
use crate::interface::Interface1D;
use crate::model::Vec2;
use crate::predicates::UnaryPredicate1D;
use crate::shaders::StrokeShader;
use crate::stroke::{Stroke, StrokeVertex};
use crate::ChainingSession;

impl<'a> ChainingSession<'a> {
    /// Builds a stroke from every element of the current set accepted by
    /// `pred` and shades it with `shaders` in order. A failing predicate
    /// discards every stroke of this call; a failing shader discards only
    /// its stroke.
    pub fn create<U>(&mut self, pred: &mut U, shaders: &mut [Box<dyn StrokeShader>]) -> Result<(), OperatorError>
    where
        U: UnaryPredicate1D + ?Sized,
    {
        let mut new_strokes = Vec::new();
        for i in 0..self.current_len() {
            let Some(element) = self.current_element(i) else { continue };
            if !pred.evaluate(element).map_err(OperatorError::Predicate)? {
                continue;
            }
            let Some(mut stroke) = create_stroke(element) else { continue };
            match shade(&mut stroke, shaders) {
                Ok(()) => new_strokes.push(stroke),
                Err((name, e)) => log::warn!("shader {} failed on stroke {}: {}", name, stroke.id(), e),
            }
        }
        self.strokes.extend(new_strokes);
        Ok(())
    }
}

fn shade(stroke: &mut Stroke, shaders: &mut [Box<dyn StrokeShader>]) -> Result<(), (String, EvalError)> {
    for shader in shaders.iter_mut() {
        shader.shade(stroke).map_err(|e| (shader.name().to_string(), e))?;
    }
    Ok(())
}

/// Stroke through the vertices of `inter`, with overlapping consecutive
/// vertices pulled apart. None when fewer than two vertices remain or
/// every vertex overlaps.
pub fn create_stroke(inter: &dyn Interface1D) -> Option<Stroke> {
    let mut stroke = Stroke::new(inter.id());
    let mut it = inter.vertices();
    let mut previous: Option<Vec2> = None;
    let mut singular = false;
    while let Some(cp) = it.curve_point() {
        let current = cp.point();
        if let Some(prev) = previous {
            singular |= (current - prev).norm() < EPS_COINCIDENT;
        }
        stroke.push_back(StrokeVertex::from_curve_point(cp));
        previous = Some(current);
        it.increment();
    }
    if stroke.len() < 2 {
        return None;
    }
    if singular && !spread_overlaps(&mut stroke) {
        log::debug!("stroke {} discarded: all of its vertices overlap", stroke.id());
        return None;
    }
    stroke.update_length();

    let still_singular = stroke.vertices().windows(2).any(|w| (w[1].point() - w[0].point()).norm() < EPS_COINCIDENT);
    if still_singular {
        log::debug!("stroke {} still contains singular points", stroke.id());
    }
    Some(stroke)
}

// Moves each run of coincident vertices apart along the direction to the
// nearest distinct neighbour. False when no such neighbour exists.
fn spread_overlaps(stroke: &mut Stroke) -> bool {
    let n = stroke.len();
    let mut i = 0;
    while i + 1 < n {
        let vertices = stroke.vertices();
        if (vertices[i + 1].point() - vertices[i].point()).norm() >= EPS_COINCIDENT {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut run_end = i + 1;
        while run_end + 1 < n && (vertices[run_end + 1].point() - vertices[run_end].point()).norm() < EPS_COINCIDENT {
            run_end += 1;
        }

        let (target, reverse) = if run_end + 1 < n {
            (vertices[run_end + 1].point(), false)
        } else if run_start > 0 {
            (vertices[run_start - 1].point(), true)
        } else {
            return false;
        };
        let origin = vertices[run_start].point();
        let nvert = run_end - run_start + 1;
        let dist = (target - origin).norm();
        let mut len = SINGULARITY_OFFSET;
        if dist < len * nvert as f64 {
            len = dist / nvert as f64;
        }
        let offset = (target - origin).normalized() * len;
        for (k, v) in stroke.vertices_mut()[run_start..=run_end].iter_mut().enumerate() {
            let factor = if reverse { nvert - k - 1 } else { k };
            let p = v.point();
            v.set_point(p + offset * factor as f64);
        }
        i = run_end + 1;
    }
    true
}
