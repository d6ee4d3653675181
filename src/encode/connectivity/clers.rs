use std::collections::VecDeque;
use std::ops::Range;

use crate::core::buffer::writer::Writer;
use crate::core::shared::{Face, Quad, VertexIdx};
use crate::shared::connectivity::{
    split_bits, start_face_edges, FrontEdge, Symbol, SPLIT_MASK_BITS,
};
use super::adjacency::{build_adjacency, Opposite};
use super::{Err, SymbolCounts};

/// Front-expansion traversal of a triangle mesh. Faces are consumed one at a time across
/// the edges of the front, each step emitting one CLERS symbol. Vertices are numbered in the
/// order they are first reached.
pub(crate) struct ClersEncoder<'faces> {
    faces: &'faces [Face],
    adjacency: Vec<[Option<Opposite>; 3]>,
    visited: Vec<bool>,

    /// traversal index of every vertex reached so far.
    encoded: Vec<Option<VertexIdx>>,
    num_encoded: u32,

    /// front edges of the current component; vertices are original indices.
    front: Vec<FrontEdge>,
    queue: VecDeque<u32>,
    delayed: Vec<u32>,

    split_bits: u32,
    pub(crate) symbols: Vec<u8>,
    pub(crate) bits: Writer,
    pub(super) context: Vec<Quad>,
    /// the faces in the order they are decoded, in traversal indices.
    pub(super) decoded_faces: Vec<Face>,
    pub(super) counts: SymbolCounts,
    pub(crate) max_front: usize,
}

impl<'faces> ClersEncoder<'faces> {
    pub fn new(faces: &'faces [Face], num_vertices: usize) -> Self {
        Self {
            faces,
            adjacency: vec![[None; 3]; faces.len()],
            visited: vec![false; faces.len()],
            encoded: vec![None; num_vertices],
            num_encoded: 0,
            front: Vec::new(),
            queue: VecDeque::new(),
            delayed: Vec::new(),
            split_bits: split_bits(num_vertices),
            symbols: Vec::with_capacity(faces.len() * 2),
            bits: Writer::new(),
            context: Vec::with_capacity(num_vertices),
            decoded_faces: Vec::with_capacity(faces.len()),
            counts: SymbolCounts::default(),
            max_front: 0,
        }
    }

    /// Encodes the faces of one group. Faces of other groups are never adjacent to them.
    pub fn encode_group(&mut self, group: Range<usize>) -> Result<(), Err> {
        let faces = self.faces;
        let group_faces = faces.get(group.clone())
            .ok_or(Err::InvalidGroupRange { start: group.start, end: group.end })?;
        for (i, sides) in build_adjacency(group_faces).into_iter().enumerate() {
            self.adjacency[group.start + i] = sides.map(|o| o.map(|o| Opposite {
                face: o.face + group.start as u32,
                corner: o.corner,
            }));
        }

        let mut next_start = group.start;
        loop {
            let Some(e) = self.queue.pop_front().or_else(|| self.delayed.pop()) else {
                while next_start < group.end && self.visited[next_start] {
                    next_start += 1;
                }
                if next_start == group.end {
                    break;
                }
                self.start_component(next_start)?;
                continue;
            };
            self.process_edge(e)?;
        }
        Ok(())
    }

    /// Appends vertices no face references, in ascending order, with a plain chain context.
    pub fn append_unreferenced(&mut self) {
        for v in 0..self.encoded.len() {
            if self.encoded[v].is_none() {
                self.new_vertex(v as VertexIdx, None);
            }
        }
    }

    /// traversal order of every vertex: `order[original] = traversal index`.
    pub fn vertex_order(&self) -> Vec<u32> {
        self.encoded.iter().map(|t| t.unwrap_or(u32::MAX)).collect()
    }

    fn emit(&mut self, symbol: Symbol) {
        self.symbols.push(symbol.get_id());
        self.counts.record(symbol);
    }

    /// assigns the next traversal index to 'v'. Without a front edge the vertex is chained
    /// to the one before it.
    fn new_vertex(&mut self, v: VertexIdx, edge: Option<&FrontEdge>) -> VertexIdx {
        let t = self.num_encoded;
        self.num_encoded += 1;
        self.encoded[v as usize] = Some(t);
        let quad = match edge.and_then(|e| Some((self.encoded[e.v0 as usize]?, self.encoded[e.v2 as usize]?, self.encoded[e.v1 as usize]?))) {
            Some((a, b, c)) => Quad::new(t, a, b, c),
            None => Quad::chain(t),
        };
        self.context.push(quad);
        t
    }

    fn traversal_index(&self, v: VertexIdx) -> Result<VertexIdx, Err> {
        self.encoded.get(v as usize).copied().flatten().ok_or(Err::UnencodedVertex(v))
    }

    fn write_index(&mut self, t: VertexIdx) -> Result<(), Err> {
        if self.split_bits > 16 {
            self.bits.write(t >> 16, self.split_bits - 16)?;
            self.bits.write(t & 0xffff, 16)?;
        } else {
            self.bits.write(t, self.split_bits)?;
        }
        Ok(())
    }

    fn start_component(&mut self, face: usize) -> Result<(), Err> {
        let f = self.faces[face];
        self.visited[face] = true;
        self.front.clear();

        let mask = (0..3)
            .filter(|&k| self.encoded[f[k] as usize].is_some())
            .fold(0_u32, |m, k| m | (1 << k));
        if mask != 0 {
            self.emit(Symbol::Split);
            self.bits.write(mask, SPLIT_MASK_BITS)?;
            self.counts.split_vertices += mask.count_ones() as usize;
        } else {
            self.emit(Symbol::Vertex);
        }

        let mut t = [0; 3];
        for k in 0..3 {
            t[k] = match self.encoded[f[k] as usize] {
                Some(known) => {
                    self.write_index(known)?;
                    known
                },
                None => self.new_vertex(f[k], None),
            };
        }
        self.decoded_faces.push(t);

        let base = self.front.len() as u32;
        for edge in start_face_edges(f, face as u32, base) {
            self.queue.push_back(self.front.len() as u32);
            self.front.push(edge);
        }
        self.max_front = self.max_front.max(self.queue.len());
        Ok(())
    }

    fn process_edge(&mut self, ei: u32) -> Result<(), Err> {
        let e = self.front[ei as usize];
        if e.deleted {
            return Ok(());
        }
        self.front[ei as usize].deleted = true;

        let opposite = self.adjacency[e.face as usize][e.side as usize]
            .filter(|o| !self.visited[o.face as usize]);
        let Some(Opposite { face: g, corner: j }) = opposite else {
            self.emit(Symbol::Boundary);
            return Ok(());
        };
        let o = self.faces[g as usize][j as usize];
        let j = j as usize;

        let prev = e.prev;
        let next = e.next;
        let close_left = self.front[prev as usize].v0 == o;
        let close_right = self.front[next as usize].v1 == o;

        if !close_left && !close_right && self.encoded[o as usize].is_some() && !self.queue.is_empty() {
            // retry once the queue runs dry; 'o' may have been closed off by then.
            self.front[ei as usize].deleted = false;
            self.delayed.push(ei);
            self.emit(Symbol::Delay);
            return Ok(());
        }

        self.visited[g as usize] = true;

        if close_left && close_right {
            self.emit(Symbol::End);
            self.front[prev as usize].deleted = true;
            self.front[next as usize].deleted = true;
            let pp = self.front[prev as usize].prev;
            let nn = self.front[next as usize].next;
            self.front[pp as usize].next = nn;
            self.front[nn as usize].prev = pp;
        } else if close_left {
            self.emit(Symbol::Left);
            self.front[prev as usize].deleted = true;
            let pp = self.front[prev as usize].prev;
            let new = self.push_edge(FrontEdge {
                v0: o, v1: e.v1, v2: e.v0,
                face: g, side: ((j + 2) % 3) as u8,
                prev: pp, next,
                deleted: false,
            });
            self.front[pp as usize].next = new;
            self.front[next as usize].prev = new;
            self.queue.push_front(new);
        } else if close_right {
            self.emit(Symbol::Right);
            self.front[next as usize].deleted = true;
            let nn = self.front[next as usize].next;
            let new = self.push_edge(FrontEdge {
                v0: e.v0, v1: o, v2: e.v1,
                face: g, side: ((j + 1) % 3) as u8,
                prev, next: nn,
                deleted: false,
            });
            self.front[prev as usize].next = new;
            self.front[nn as usize].prev = new;
            self.queue.push_front(new);
        } else {
            match self.encoded[o as usize] {
                Some(known) => {
                    self.emit(Symbol::Split);
                    self.write_index(known)?;
                    self.counts.split_vertices += 1;
                },
                None => {
                    self.emit(Symbol::Vertex);
                    self.new_vertex(o, Some(&e));
                },
            }
            let first = self.front.len() as u32;
            let second = first + 1;
            self.push_edge(FrontEdge {
                v0: e.v0, v1: o, v2: e.v1,
                face: g, side: ((j + 1) % 3) as u8,
                prev, next: second,
                deleted: false,
            });
            self.push_edge(FrontEdge {
                v0: o, v1: e.v1, v2: e.v0,
                face: g, side: ((j + 2) % 3) as u8,
                prev: first, next,
                deleted: false,
            });
            self.front[prev as usize].next = first;
            self.front[next as usize].prev = second;
            self.queue.push_front(first);
            self.queue.push_back(second);
        }

        let face = [self.traversal_index(o)?, self.traversal_index(e.v1)?, self.traversal_index(e.v0)?];
        self.decoded_faces.push(face);
        self.max_front = self.max_front.max(self.queue.len());
        Ok(())
    }

    fn push_edge(&mut self, edge: FrontEdge) -> u32 {
        self.front.push(edge);
        (self.front.len() - 1) as u32
    }
}
