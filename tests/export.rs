use ribbon::{Id, MediumType, StrokeRep, Stroke, Vec2};

fn zigzag(n: usize) -> Stroke {
    let pts: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f64 * 2.0, if i % 2 == 0 { 0.0 } else { 1.5 })).collect();
    Stroke::from_points(Id::new(4, 2), &pts)
}

#[test]
fn json_keeps_every_strip_vertex() {
    let mut s = zigzag(9);
    s.vertices_mut()[4].attribute_mut().set_visible(false);
    s.set_tips(true);
    s.set_medium_type(MediumType::Humid);
    let rep = s.to_rep();
    let v = rep.to_json_value().unwrap();

    assert_eq!(v["medium"], "humid");
    assert_eq!(v["tips"], true);
    let strips = v["strips"].as_array().unwrap();
    assert_eq!(strips.len(), rep.strips().len());
    for (json_strip, strip) in strips.iter().zip(rep.strips()) {
        assert_eq!(json_strip["vertices"].as_array().unwrap().len(), strip.len());
        assert_eq!(json_strip["vertices"][0]["x"], strip.vertices()[0].point().x);
    }
}

#[test]
fn default_texture_shows_in_the_export() {
    let s = zigzag(3);
    let v = StrokeRep::with_default_texture(&s, 7).to_json_value().unwrap();
    assert_eq!(v["texture_id"], 7);
    assert_eq!(v["id"]["second"], 2);
    assert_eq!(v["texture_step"], 1.0);
}
