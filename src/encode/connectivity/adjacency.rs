use crate::core::shared::Face;
use crate::shared::connectivity::{next_side, prev_side};

/// The face across one side of a face, and the corner of that face opposite the shared edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Opposite {
    pub face: u32,
    pub corner: u8,
}

/// Opposite faces of every side of 'faces'. Side `k` of a face is the edge
/// `f[k+1] -> f[k+2]`, facing corner `k`.
///
/// A half-edge is matched with a half-edge running the other way over the same two vertices.
/// When more than two faces share an edge, the half-edges of each direction are paired in face
/// order and the rest are left on the boundary.
pub(crate) fn build_adjacency(faces: &[Face]) -> Vec<[Option<Opposite>; 3]> {
    struct HalfEdge {
        lo: u32,
        hi: u32,
        face: u32,
        side: u8,
        forward: bool,
    }

    let mut half_edges = Vec::with_capacity(faces.len() * 3);
    for (face, f) in faces.iter().enumerate() {
        for k in 0..3 {
            let v0 = f[next_side(k)];
            let v1 = f[prev_side(k)];
            half_edges.push(HalfEdge {
                lo: v0.min(v1),
                hi: v0.max(v1),
                face: face as u32,
                side: k as u8,
                forward: v0 < v1,
            });
        }
    }
    half_edges.sort_unstable_by_key(|e| (e.lo, e.hi, e.face, e.side));

    let mut adjacency = vec![[None; 3]; faces.len()];
    let mut forward = Vec::new();
    let mut backward = Vec::new();
    for bucket in half_edges.chunk_by(|a, b| (a.lo, a.hi) == (b.lo, b.hi)) {
        forward.clear();
        backward.clear();
        for e in bucket {
            if e.forward {
                forward.push(e);
            } else {
                backward.push(e);
            }
        }
        for (a, b) in forward.iter().zip(&backward) {
            adjacency[a.face as usize][a.side as usize] = Some(Opposite { face: b.face, corner: b.side });
            adjacency[b.face as usize][b.side as usize] = Some(Opposite { face: a.face, corner: a.side });
        }
    }
    adjacency
}
