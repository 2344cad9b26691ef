use crate::model::{Id, MediumType};
use crate::rep::stroke_rep::StrokeRep;
use serde::Serialize;
use serde_json::Value;

pub fn stroke_rep_to_json(rep: &StrokeRep) -> Result<Value, serde_json::Error> {
    #[derive(Serialize)]
    struct VertexSer {
        x: f64,
        y: f64,
        u: f64,
        v: f64,
        tip_u: f64,
        tip_v: f64,
        color: [f32; 3],
        alpha: f32,
    }
    #[derive(Serialize)]
    struct StripSer {
        average_thickness: f64,
        vertices: Vec<VertexSer>,
    }
    #[derive(Serialize)]
    struct RepSer<'a> {
        id: Id,
        medium: MediumType,
        texture_id: u32,
        texture_step: f32,
        texture_slots: &'a [u32],
        tips: bool,
        strips: Vec<StripSer>,
    }

    let strips = rep
        .strips()
        .iter()
        .map(|strip| StripSer {
            average_thickness: strip.average_thickness(),
            vertices: strip
                .vertices()
                .iter()
                .map(|r| {
                    let (p, t, tt, c) = (r.point(), r.tex_coord(), r.tex_coord_tips(), r.color());
                    VertexSer {
                        x: p.x,
                        y: p.y,
                        u: t.x,
                        v: t.y,
                        tip_u: tt.x,
                        tip_v: tt.y,
                        color: [c.r, c.g, c.b],
                        alpha: r.alpha(),
                    }
                })
                .collect(),
        })
        .collect();

    let value = serde_json::to_value(RepSer {
        id: rep.id(),
        medium: rep.medium_type(),
        texture_id: rep.texture_id(),
        texture_step: rep.texture_step(),
        texture_slots: rep.texture_slots(),
        tips: rep.tips(),
        strips,
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, Rgb, Vec2};
    use crate::stroke::Stroke;

    #[test]
    fn export_lists_strips_and_vertices() {
        let mut s = Stroke::from_points(Id::new(2, 0), &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)]);
        s.vertices_mut()[0].attribute_mut().set_color(Rgb::new(1.0, 0.0, 0.0));
        let v = s.to_rep().to_json_value().unwrap();
        assert_eq!(v["id"]["first"], 2);
        assert_eq!(v["medium"], "opaque");
        assert_eq!(v["strips"].as_array().map(Vec::len), Some(1));
        let vertices = &v["strips"][0]["vertices"];
        assert_eq!(vertices.as_array().map(Vec::len), Some(6));
        assert_eq!(vertices[0]["color"][0], 1.0);
        assert_eq!(vertices[1]["v"], 1.0);
    }
}
