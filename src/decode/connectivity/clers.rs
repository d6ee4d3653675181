use std::collections::VecDeque;

use crate::core::buffer::reader::Reader;
use crate::core::shared::{Face, Quad, VertexIdx};
use crate::shared::connectivity::{
    split_bits, start_face_edges, FrontEdge, Symbol, SPLIT_MASK_BITS,
};
use super::Err;

/// Replays the CLERS symbols on a front of traversal indices, rebuilding the faces and
/// the prediction context in the order the encoder produced them.
pub(crate) struct ClersDecoder {
    symbols: Vec<u8>,
    cursor: usize,
    bits: Reader,
    num_vertices: usize,
    num_decoded: u32,

    front: Vec<FrontEdge>,
    queue: VecDeque<u32>,
    delayed: Vec<u32>,
    /// longest the queue may grow, as declared by the stream.
    max_front: usize,

    split_bits: u32,
    pub(super) context: Vec<Quad>,
    pub(super) faces: Vec<Face>,
}

impl ClersDecoder {
    pub fn new(symbols: Vec<u8>, bits: Reader, num_vertices: usize, num_faces: usize, max_front: usize) -> Self {
        Self {
            cursor: 0,
            bits,
            num_vertices,
            num_decoded: 0,
            front: Vec::new(),
            queue: VecDeque::with_capacity(max_front.min(symbols.len() + 3)),
            delayed: Vec::new(),
            max_front,
            split_bits: split_bits(num_vertices),
            context: Vec::with_capacity(num_vertices.min(symbols.len() + 3)),
            faces: Vec::with_capacity(num_faces.min(symbols.len())),
            symbols,
        }
    }

    /// Decodes faces until the group reaches face 'end' and its front is exhausted.
    pub fn decode_group(&mut self, end: usize) -> Result<(), Err> {
        loop {
            let Some(e) = self.queue.pop_front().or_else(|| self.delayed.pop()) else {
                if self.faces.len() >= end {
                    break;
                }
                self.start_component()?;
                continue;
            };
            self.process_edge(e)?;
            if self.faces.len() > end {
                return Err(Err::TooManyFaces(end));
            }
        }
        Ok(())
    }

    /// Chains the vertices no face reached, and checks that every symbol was used.
    pub fn finish(&mut self) -> Result<(), Err> {
        if self.cursor != self.symbols.len() {
            return Err(Err::TrailingSymbols(self.symbols.len() - self.cursor));
        }
        for t in self.num_decoded..self.num_vertices as u32 {
            self.context.push(Quad::chain(t));
        }
        Ok(())
    }

    fn next_symbol(&mut self) -> Result<Symbol, Err> {
        let id = *self.symbols.get(self.cursor).ok_or(Err::SymbolsExhausted)?;
        self.cursor += 1;
        Symbol::from_id(id).ok_or(Err::InvalidSymbol(id))
    }

    fn new_vertex(&mut self, quad: impl FnOnce(VertexIdx) -> Quad) -> Result<VertexIdx, Err> {
        let t = self.num_decoded;
        if t as usize >= self.num_vertices {
            return Err(Err::TooManyVertices(self.num_vertices));
        }
        self.num_decoded += 1;
        self.context.push(quad(t));
        Ok(t)
    }

    fn read_index(&mut self) -> Result<VertexIdx, Err> {
        let t = if self.split_bits > 16 {
            let hi = self.bits.read(self.split_bits - 16)?;
            let lo = self.bits.read(16)?;
            (hi << 16) | lo
        } else {
            self.bits.read(self.split_bits)?
        };
        if t >= self.num_decoded {
            return Err(Err::InvalidSplitIndex { index: t, decoded: self.num_decoded });
        }
        Ok(t)
    }

    fn start_component(&mut self) -> Result<(), Err> {
        let mask = match self.next_symbol()? {
            Symbol::Vertex => 0,
            Symbol::Split => self.bits.read(SPLIT_MASK_BITS)?,
            other => return Err(Err::UnexpectedStartSymbol(other)),
        };
        let mut t = [0; 3];
        for k in 0..3 {
            t[k] = if mask & (1 << k) != 0 {
                self.read_index()?
            } else {
                self.new_vertex(Quad::chain)?
            };
        }
        self.faces.push(t);

        self.front.clear();
        for edge in start_face_edges(t, 0, 0) {
            self.queue.push_back(self.front.len() as u32);
            self.front.push(edge);
        }
        self.check_front()
    }

    fn check_front(&self) -> Result<(), Err> {
        if self.queue.len() > self.max_front {
            return Err(Err::FrontOverflow(self.max_front));
        }
        Ok(())
    }

    fn process_edge(&mut self, ei: u32) -> Result<(), Err> {
        let e = self.front[ei as usize];
        if e.deleted {
            return Ok(());
        }
        self.front[ei as usize].deleted = true;

        let prev = e.prev;
        let next = e.next;
        let o = match self.next_symbol()? {
            Symbol::Boundary => return Ok(()),
            Symbol::Delay => {
                self.front[ei as usize].deleted = false;
                self.delayed.push(ei);
                return Ok(());
            },
            Symbol::End => {
                let o = self.front[prev as usize].v0;
                self.front[prev as usize].deleted = true;
                self.front[next as usize].deleted = true;
                let pp = self.front[prev as usize].prev;
                let nn = self.front[next as usize].next;
                self.front[pp as usize].next = nn;
                self.front[nn as usize].prev = pp;
                o
            },
            Symbol::Left => {
                let o = self.front[prev as usize].v0;
                self.front[prev as usize].deleted = true;
                let pp = self.front[prev as usize].prev;
                let new = self.push_edge(FrontEdge {
                    v0: o, v1: e.v1, v2: e.v0,
                    face: 0, side: 0,
                    prev: pp, next,
                    deleted: false,
                });
                self.front[pp as usize].next = new;
                self.front[next as usize].prev = new;
                self.queue.push_front(new);
                o
            },
            Symbol::Right => {
                let o = self.front[next as usize].v1;
                self.front[next as usize].deleted = true;
                let nn = self.front[next as usize].next;
                let new = self.push_edge(FrontEdge {
                    v0: e.v0, v1: o, v2: e.v1,
                    face: 0, side: 0,
                    prev, next: nn,
                    deleted: false,
                });
                self.front[prev as usize].next = new;
                self.front[nn as usize].prev = new;
                self.queue.push_front(new);
                o
            },
            symbol @ (Symbol::Vertex | Symbol::Split) => {
                let o = if symbol == Symbol::Vertex {
                    self.new_vertex(|t| Quad::new(t, e.v0, e.v2, e.v1))?
                } else {
                    self.read_index()?
                };
                let first = self.front.len() as u32;
                let second = first + 1;
                self.push_edge(FrontEdge {
                    v0: e.v0, v1: o, v2: e.v1,
                    face: 0, side: 0,
                    prev, next: second,
                    deleted: false,
                });
                self.push_edge(FrontEdge {
                    v0: o, v1: e.v1, v2: e.v0,
                    face: 0, side: 0,
                    prev: first, next,
                    deleted: false,
                });
                self.front[prev as usize].next = first;
                self.front[next as usize].prev = second;
                self.queue.push_front(first);
                self.queue.push_back(second);
                o
            },
        };
        self.faces.push([o, e.v1, e.v0]);
        self.check_front()
    }

    fn push_edge(&mut self, edge: FrontEdge) -> u32 {
        self.front.push(edge);
        (self.front.len() - 1) as u32
    }
}
