use crate::core::shared::VertexIdx;
use crate::utils::ceil_log2;

/// The CLERS alphabet. Each processed front edge produces one symbol, and so does the
/// first face of every connected component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// the face across the edge brings a new vertex.
    Vertex,
    /// the face closes the edge with the previous front edge.
    Left,
    /// the face closes the edge with the next front edge.
    Right,
    /// the face closes the edge with both neighbours.
    End,
    /// there is no unvisited face across the edge.
    Boundary,
    /// the edge is retried once the queue runs dry.
    Delay,
    /// the face across the edge brings a vertex encoded elsewhere; its index follows.
    Split,
}

impl Symbol {
    pub fn get_id(self) -> u8 {
        match self {
            Symbol::Vertex => 0,
            Symbol::Left => 1,
            Symbol::Right => 2,
            Symbol::End => 3,
            Symbol::Boundary => 4,
            Symbol::Delay => 5,
            Symbol::Split => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Symbol::Vertex,
            1 => Symbol::Left,
            2 => Symbol::Right,
            3 => Symbol::End,
            4 => Symbol::Boundary,
            5 => Symbol::Delay,
            6 => Symbol::Split,
            _ => return None,
        })
    }

    /// whether the symbol adds a face.
    pub fn adds_face(self) -> bool {
        matches!(self, Symbol::Vertex | Symbol::Left | Symbol::Right | Symbol::End | Symbol::Split)
    }
}

/// vertex counts above this do not fit a split index.
pub(crate) const MAX_VERTICES: usize = 1 << 30;

/// Width of a split index for a mesh with 'num_vertices' vertices.
pub(crate) fn split_bits(num_vertices: usize) -> u32 {
    ceil_log2(num_vertices as u64) + 1
}

/// bits of the mask telling which start-face vertices are already known.
pub(crate) const SPLIT_MASK_BITS: u32 = 3;

#[inline]
pub(crate) fn next_side(k: usize) -> usize {
    (k + 1) % 3
}

#[inline]
pub(crate) fn prev_side(k: usize) -> usize {
    (k + 2) % 3
}

/// A directed edge `v0 -> v1` of the traversal front. `v2` is the third vertex of the
/// already processed face the edge belongs to. The front edges of a region form a ring
/// through `prev` / `next`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrontEdge {
    pub v0: VertexIdx,
    pub v1: VertexIdx,
    pub v2: VertexIdx,
    /// face of the group the edge was cut from, and the side of that face it lies on.
    /// Only the encoder looks at these.
    pub face: u32,
    pub side: u8,
    pub prev: u32,
    pub next: u32,
    pub deleted: bool,
}

/// The three front edges of the start face `f` of a component, pushed at index 'base'.
/// The edge on side `k` runs `f[k+1] -> f[k+2]`.
pub(crate) fn start_face_edges(f: [VertexIdx; 3], face: u32, base: u32) -> [FrontEdge; 3] {
    std::array::from_fn(|k| FrontEdge {
        v0: f[next_side(k)],
        v1: f[prev_side(k)],
        v2: f[k],
        face,
        side: k as u8,
        prev: base + prev_side(k) as u32,
        next: base + next_side(k) as u32,
        deleted: false,
    })
}
