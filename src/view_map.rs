// Read-only upstream graph: silhouette vertices and the view edges running
// between view vertices. The stroke pipeline only ever writes the two time
// stamps of a view edge.

use crate::model::{Id, Vec3};
use bitflags::bitflags;
use std::cell::Cell;

bitflags! {
    /// Kind of line a view edge was extracted from.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Nature: u16 {
        const SILHOUETTE = 1 << 0;
        const BORDER = 1 << 1;
        const CREASE = 1 << 2;
        const RIDGE = 1 << 3;
        const VALLEY = 1 << 4;
        const SUGGESTIVE_CONTOUR = 1 << 5;
        const MATERIAL_BOUNDARY = 1 << 6;
        const EDGE_MARK = 1 << 7;
    }
}

/// Silhouette vertex: a mesh point with its projected position. `point_2d.z`
/// holds the projected depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SVertex {
    pub id: u32,
    pub point_3d: Vec3,
    pub point_2d: Vec3,
}

impl SVertex {
    pub fn new(id: u32, point_3d: Vec3, point_2d: Vec3) -> Self { SVertex { id, point_3d, point_2d } }

    #[inline]
    pub fn same(&self, other: &SVertex) -> bool { self.id == other.id }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexKind {
    NonT,
    // Occlusion junction: the front edges continue each other, so do the back ones
    T { front: [u32; 2], back: [u32; 2] },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: u32,
    // True when the edge ends at this vertex
    pub incoming: bool,
}

#[derive(Clone, Debug)]
pub struct ViewVertex {
    pub id: u32,
    pub svertex: SVertex,
    pub kind: VertexKind,
    pub(crate) edges: Vec<OrientedEdge>,
}

impl ViewVertex {
    pub fn edges(&self) -> &[OrientedEdge] { &self.edges }

    /// Edge continuing `edge` through a T-vertex.
    pub fn mate(&self, edge: u32) -> Option<u32> {
        match self.kind {
            VertexKind::NonT => None,
            VertexKind::T { front, back } => {
                for pair in [front, back] {
                    if pair[0] == edge {
                        return Some(pair[1]);
                    }
                    if pair[1] == edge {
                        return Some(pair[0]);
                    }
                }
                None
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ViewEdge {
    pub id: Id,
    pub a: u32,
    pub b: u32,
    pub nature: Nature,
    pub qi: u32,
    pub shape_id: u32,
    pub(crate) svertices: Vec<SVertex>,
    pub(crate) length_2d: f64,
    pub(crate) time_stamp: Cell<u32>,
    pub(crate) chaining_time_stamp: Cell<u32>,
}

impl ViewEdge {
    pub fn index(&self) -> u32 { self.id.first }
    pub fn svertices(&self) -> &[SVertex] { &self.svertices }
    pub fn length_2d(&self) -> f64 { self.length_2d }
    pub fn time_stamp(&self) -> u32 { self.time_stamp.get() }
    pub fn set_time_stamp(&self, ts: u32) { self.time_stamp.set(ts) }
    pub fn chaining_time_stamp(&self) -> u32 { self.chaining_time_stamp.get() }
    pub fn set_chaining_time_stamp(&self, ts: u32) { self.chaining_time_stamp.set(ts) }
    pub fn is_closed(&self) -> bool { self.a == self.b }
}

fn length_2d(svertices: &[SVertex]) -> f64 {
    svertices.windows(2).map(|w| (w[1].point_2d.xy() - w[0].point_2d.xy()).norm()).sum()
}

#[derive(Clone, Debug, Default)]
pub struct ViewMap {
    vertices: Vec<ViewVertex>,       // id is index
    edges: Vec<ViewEdge>,            // id.first is index
    next_svertex: u32,
}

impl ViewMap {
    pub fn new() -> Self { Self::default() }

    fn alloc_svertex(&mut self, point_3d: Vec3, point_2d: Vec3) -> SVertex {
        let id = self.next_svertex;
        self.next_svertex += 1;
        SVertex::new(id, point_3d, point_2d)
    }

    // Vertex on the picture plane; the 3D position is the lifted 2D point.
    pub fn add_vertex(&mut self, x: f64, y: f64) -> u32 {
        let p = Vec3::new(x, y, 0.0);
        self.add_vertex_3d(p, p)
    }

    pub fn add_vertex_3d(&mut self, point_3d: Vec3, point_2d: Vec3) -> u32 {
        let id = self.vertices.len() as u32;
        let svertex = self.alloc_svertex(point_3d, point_2d);
        self.vertices.push(ViewVertex { id, svertex, kind: VertexKind::NonT, edges: Vec::new() });
        id
    }

    pub fn add_edge(&mut self, a: u32, b: u32, nature: Nature) -> Option<u32> {
        self.add_polyline_edge(a, b, &[], nature)
    }

    /// Adds an edge from `a` to `b` through interior picture-plane points.
    /// A loop (`a == b`) needs at least two interior points.
    pub fn add_polyline_edge(&mut self, a: u32, b: u32, interior: &[(f64, f64)], nature: Nature) -> Option<u32> {
        if a as usize >= self.vertices.len() || b as usize >= self.vertices.len() {
            return None;
        }
        if a == b && interior.len() < 2 {
            return None;
        }
        let mut svertices = Vec::with_capacity(interior.len() + 2);
        svertices.push(self.vertices[a as usize].svertex);
        for &(x, y) in interior {
            let p = Vec3::new(x, y, 0.0);
            let sv = self.alloc_svertex(p, p);
            svertices.push(sv);
        }
        svertices.push(self.vertices[b as usize].svertex);

        let index = self.edges.len() as u32;
        let length = length_2d(&svertices);
        self.edges.push(ViewEdge {
            id: Id::new(index, 0),
            a,
            b,
            nature,
            qi: 0,
            shape_id: 0,
            svertices,
            length_2d: length,
            time_stamp: Cell::new(0),
            chaining_time_stamp: Cell::new(0),
        });
        self.vertices[a as usize].edges.push(OrientedEdge { edge: index, incoming: false });
        self.vertices[b as usize].edges.push(OrientedEdge { edge: index, incoming: true });
        Some(index)
    }

    /// Marks `v` as a T-vertex pairing two front edges and two back edges.
    /// Every paired edge must be incident to `v`.
    pub fn set_t_vertex(&mut self, v: u32, front: [u32; 2], back: [u32; 2]) -> bool {
        let Some(vertex) = self.vertices.get(v as usize) else { return false };
        let incident = |e: u32| vertex.edges.iter().any(|o| o.edge == e);
        if !front.iter().chain(back.iter()).all(|&e| incident(e)) {
            return false;
        }
        self.vertices[v as usize].kind = VertexKind::T { front, back };
        true
    }

    pub fn set_edge_qi(&mut self, e: u32, qi: u32) -> bool {
        match self.edges.get_mut(e as usize) {
            Some(edge) => { edge.qi = qi; true }
            None => false,
        }
    }

    pub fn set_edge_shape(&mut self, e: u32, shape_id: u32) -> bool {
        match self.edges.get_mut(e as usize) {
            Some(edge) => { edge.shape_id = shape_id; true }
            None => false,
        }
    }

    pub fn vertex(&self, id: u32) -> Option<&ViewVertex> { self.vertices.get(id as usize) }
    pub fn edge(&self, id: u32) -> Option<&ViewEdge> { self.edges.get(id as usize) }
    pub fn vertices(&self) -> &[ViewVertex] { &self.vertices }
    pub fn edges(&self) -> &[ViewEdge] { &self.edges }
}
