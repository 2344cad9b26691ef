use proptest::prelude::*;
use ribbon::{Id, Strip, Stroke, Vec2};

fn stroke_with_thickness(points: &[Vec2], right: f32, left: f32) -> Stroke {
    let mut s = Stroke::from_points(Id::default(), points);
    for v in s.vertices_mut() {
        v.attribute_mut().set_thickness(right, left);
    }
    s
}

// Distance from `p` to the line through `a` and `b`.
fn line_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let d = (b - a).normalized();
    (p - a).cross(d).abs()
}

#[test]
fn two_vertex_strip_is_a_quad() {
    let s = stroke_with_thickness(&[Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0)], 0.5, 0.5);
    let strip = Strip::new(s.vertices(), false, false, 1.0);
    assert_eq!(strip.len(), 4);
    let v = strip.vertices();
    // Normal of an upward segment points to -x
    assert_eq!(v[0].point(), Vec2::new(0.5, 1.0));
    assert_eq!(v[1].point(), Vec2::new(1.5, 1.0));
    assert_eq!(v[2].point(), Vec2::new(0.5, 5.0));
    assert_eq!(v[3].point(), Vec2::new(1.5, 5.0));
}

#[test]
fn straight_backbone_rails_sit_at_the_thickness() {
    let pts: Vec<Vec2> = (0..4).map(|i| Vec2::new(i as f64 * 1.5, 0.0)).collect();
    let s = stroke_with_thickness(&pts, 2.0, 2.0);
    let strip = Strip::new(s.vertices(), false, false, 1.0);
    assert_eq!(strip.len(), 8);
    for (i, rep) in strip.vertices().iter().enumerate() {
        assert_eq!(line_distance(rep.point(), pts[0], pts[3]), 2.0);
        assert_eq!(rep.point().x, pts[i / 2].x);
    }
}

#[test]
fn hidden_middle_splits_the_ribbon() {
    let pts: Vec<Vec2> = (0..7).map(|i| Vec2::new(i as f64, (i % 2) as f64)).collect();
    let mut s = stroke_with_thickness(&pts, 0.3, 0.3);
    s.vertices_mut()[3].attribute_mut().set_visible(false);
    let rep = s.to_rep();
    let lens: Vec<usize> = rep.strips().iter().map(Strip::len).collect();
    assert_eq!(lens, vec![8, 6]);
}

#[test]
fn colors_follow_the_vertices() {
    let mut s = stroke_with_thickness(&[Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0)], 1.0, 1.0);
    s.vertices_mut()[1].attribute_mut().set_alpha(0.25);
    let strip = Strip::new(s.vertices(), false, false, 1.0);
    let alphas: Vec<f32> = strip.vertices().iter().map(|r| r.alpha()).collect();
    assert_eq!(alphas, vec![1.0, 1.0, 0.25, 0.25]);
}

fn polyline() -> impl Strategy<Value = Vec<Vec2>> {
    prop::collection::vec((1.0f64..10.0, -5.0f64..5.0), 2..20).prop_map(|steps| {
        let mut x = 0.0;
        steps
            .into_iter()
            .map(|(dx, y)| {
                let p = Vec2::new(x, y);
                x += dx;
                p
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn two_reps_per_vertex_without_tips(pts in polyline(), t in 0.1f32..5.0) {
        let s = stroke_with_thickness(&pts, t, t);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        prop_assert_eq!(strip.len(), 2 * pts.len());
    }

    #[test]
    fn rep_coordinates_stay_finite(pts in polyline(), t in 0.1f32..5.0) {
        let s = stroke_with_thickness(&pts, t, t);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        for rep in strip.vertices() {
            prop_assert!(rep.point().is_finite());
            prop_assert!(rep.tex_coord().is_finite());
        }
    }

    #[test]
    fn resampling_hits_the_requested_count(pts in polyline(), extra in 0usize..60) {
        let mut s = Stroke::from_points(Id::default(), &pts);
        let target = pts.len() + extra;
        s.resample_to_count(target).unwrap();
        prop_assert_eq!(s.len(), target);
        let length = s.length_2d();
        // A second call with the same or a smaller target changes nothing
        s.resample_to_count(target).unwrap();
        s.resample_to_count(pts.len()).unwrap();
        prop_assert_eq!(s.len(), target);
        prop_assert_eq!(s.length_2d(), length);
    }
}
