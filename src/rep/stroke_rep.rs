// Renderable form of a stroke: one strip per run of visible vertices.

use super::strip::Strip;
use crate::model::{Id, MediumType};
use crate::stroke::{Stroke, StrokeVertex};
use std::ops::Range;

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeRep {
    id: Id,
    medium_type: MediumType,
    texture_id: u32,
    texture_step: f32,
    texture_slots: Vec<u32>,
    tips: bool,
    strips: Vec<Strip>,
}

impl StrokeRep {
    /// Builds the strips of `stroke`. A texture id of 0 leaves the choice of
    /// brush to the renderer.
    pub fn new(stroke: &Stroke) -> Self {
        let vertices = stroke.vertices();
        let last = vertices.len();
        let strips = visible_runs(vertices)
            .into_iter()
            .map(|run| {
                let begin_tip = stroke.tips() && run.start == 0;
                let end_tip = stroke.tips() && run.end == last;
                Strip::new(&vertices[run], begin_tip, end_tip, stroke.texture_step())
            })
            .collect();
        StrokeRep {
            id: stroke.id(),
            medium_type: stroke.medium_type(),
            texture_id: stroke.texture_id(),
            texture_step: stroke.texture_step(),
            texture_slots: stroke.texture_slots().to_vec(),
            tips: stroke.tips(),
            strips,
        }
    }

    /// Like `new`, with `default_texture` standing in for texture id 0.
    pub fn with_default_texture(stroke: &Stroke, default_texture: u32) -> Self {
        let mut rep = StrokeRep::new(stroke);
        if rep.texture_id == 0 {
            rep.texture_id = default_texture;
        }
        rep
    }

    pub fn id(&self) -> Id { self.id }
    pub fn medium_type(&self) -> MediumType { self.medium_type }
    pub fn texture_id(&self) -> u32 { self.texture_id }
    pub fn texture_step(&self) -> f32 { self.texture_step }
    pub fn texture_slots(&self) -> &[u32] { &self.texture_slots }
    pub fn tips(&self) -> bool { self.tips }
    pub fn strips(&self) -> &[Strip] { &self.strips }

    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        crate::json::stroke_rep_to_json(self)
    }
}

impl Stroke {
    pub fn to_rep(&self) -> StrokeRep { StrokeRep::new(self) }
}

// Ranges of visible vertices, each extended by the invisible vertex that
// ends it so that the ribbon reaches the point where visibility changes.
// Runs of a single vertex produce no strip.
fn visible_runs(vertices: &[StrokeVertex]) -> Vec<Range<usize>> {
    let n = vertices.len();
    let visible = |i: usize| vertices[i].attribute().visible();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < n {
        while i < n && !visible(i) {
            i += 1;
        }
        let start = i;
        while i < n && visible(i) {
            i += 1;
        }
        let end = if i < n { i + 1 } else { n };
        if end - start > 1 {
            runs.push(start..end);
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vec2;

    fn line(n: usize) -> Stroke {
        let pts: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f64, 0.0)).collect();
        Stroke::from_points(Id::new(3, 1), &pts)
    }

    fn hide(s: &mut Stroke, indices: &[usize]) {
        for &i in indices {
            s.vertices_mut()[i].attribute_mut().set_visible(false);
        }
    }

    #[test]
    fn visible_stroke_is_one_strip() {
        let rep = line(5).to_rep();
        assert_eq!(rep.strips().len(), 1);
        assert_eq!(rep.strips()[0].len(), 10);
        assert_eq!(rep.id(), Id::new(3, 1));
    }

    #[test]
    fn runs_take_the_following_hidden_vertex() {
        let mut s = line(8);
        hide(&mut s, &[3, 4, 7]);
        assert_eq!(visible_runs(s.vertices()), vec![0..4, 5..8]);
        let rep = StrokeRep::new(&s);
        let lens: Vec<usize> = rep.strips().iter().map(Strip::len).collect();
        assert_eq!(lens, vec![8, 6]);
    }

    #[test]
    fn isolated_visible_vertex_at_the_end_is_dropped() {
        let mut s = line(4);
        hide(&mut s, &[0, 1, 2]);
        assert!(visible_runs(s.vertices()).is_empty());
        hide(&mut s, &[3]);
        assert!(s.to_rep().strips().is_empty());
    }

    #[test]
    fn tips_only_on_the_stroke_ends() {
        let mut s = line(11);
        for v in s.vertices_mut() {
            v.attribute_mut().set_thickness(0.5, 0.5);
        }
        s.set_tips(true);
        hide(&mut s, &[5]);
        let rep = s.to_rep();
        // First run 0..6 gets the begin cap, second run 6..11 the end cap
        assert_eq!(rep.strips()[0].len(), 2 * 6 + 4);
        assert_eq!(rep.strips()[1].len(), 2 * 5 + 4);
    }

    #[test]
    fn default_texture_replaces_zero() {
        let mut s = line(3);
        assert_eq!(StrokeRep::with_default_texture(&s, 9).texture_id(), 9);
        s.set_texture_id(4);
        assert_eq!(StrokeRep::with_default_texture(&s, 9).texture_id(), 4);
    }
}
