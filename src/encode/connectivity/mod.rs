pub(crate) mod adjacency;
pub(crate) mod clers;
pub(crate) mod point_cloud;

use serde::Serialize;

use crate::core::bit_coder::ByteWriter;
use crate::core::buffer;
use crate::core::shared::{Face, Group, Quad};
use crate::debug_write;
use crate::shared::connectivity::{Symbol, MAX_VERTICES};
use crate::shared::entropy::EntropyMode;
use super::{entropy, frame};
use clers::ClersEncoder;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Bit packing error: {0}")]
    BitError(#[from] buffer::Err),
    #[error("Entropy coding error: {0}")]
    EntropyError(#[from] entropy::Err),
    #[error("Group covers faces {start}..{end}, outside the face list")]
    InvalidGroupRange { start: usize, end: usize },
    #[error("Too many vertices: {0}")]
    TooManyVertices(usize),
    #[error("Vertex {0} was used before it was reached by the traversal")]
    UnencodedVertex(u32),
}

/// How often each CLERS symbol was emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SymbolCounts {
    pub vertex: usize,
    pub left: usize,
    pub right: usize,
    pub end: usize,
    pub boundary: usize,
    pub delay: usize,
    pub split: usize,
    /// indices written for vertices reached a second time, including those of start faces.
    pub split_vertices: usize,
}

impl SymbolCounts {
    pub(crate) fn record(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::Vertex => self.vertex += 1,
            Symbol::Left => self.left += 1,
            Symbol::Right => self.right += 1,
            Symbol::End => self.end += 1,
            Symbol::Boundary => self.boundary += 1,
            Symbol::Delay => self.delay += 1,
            Symbol::Split => self.split += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.vertex + self.left + self.right + self.end + self.boundary + self.delay + self.split
    }
}

/// Result of linearizing the connectivity: the order vertices are coded in and the context
/// each of them is predicted from.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConnectivityOutput {
    /// `order[original] = traversal index`.
    pub order: Vec<u32>,
    /// one entry per traversal index.
    pub context: Vec<Quad>,
    /// faces as the decoder rebuilds them, in traversal indices.
    pub faces: Vec<Face>,
    pub counts: SymbolCounts,
}

/// Drops the faces that repeat a vertex. The end of every group shrinks by the number of
/// faces removed up to it.
pub(crate) fn remove_degenerate_faces(faces: &[Face], groups: &[Group]) -> (Vec<Face>, Vec<Group>) {
    let is_valid = |f: &Face| f[0] != f[1] && f[1] != f[2] && f[2] != f[0];
    let kept = faces.iter().copied().filter(is_valid).collect::<Vec<_>>();

    let groups = groups.iter()
        .map(|g| {
            let end = (g.end as usize).min(faces.len());
            let removed = faces[..end].iter().filter(|f| !is_valid(f)).count();
            Group { end: (end - removed) as u32, properties: g.properties.clone() }
        })
        .collect::<Vec<_>>();

    let removed = faces.len() - kept.len();
    if removed > 0 {
        tracing::debug!(removed, "dropped degenerate faces");
    }
    (kept, groups)
}

/// Writes the connectivity block: the largest front, the CLERS symbols and the bit block of
/// split masks and indices. 'group_ends' must cover every face.
pub(crate) fn encode_connectivity<W>(
    faces: &[Face],
    group_ends: &[u32],
    num_vertices: usize,
    mode: EntropyMode,
    writer: &mut W,
) -> Result<ConnectivityOutput, Err>
    where W: ByteWriter
{
    if num_vertices > MAX_VERTICES {
        return Err(Err::TooManyVertices(num_vertices));
    }
    let mut encoder = ClersEncoder::new(faces, num_vertices);
    let mut start = 0;
    for &end in group_ends {
        let end = end as usize;
        encoder.encode_group(start..end)?;
        start = end;
    }
    encoder.append_unreferenced();

    let counts = encoder.counts;
    tracing::debug!(
        symbols = counts.total(),
        vertex = counts.vertex,
        left = counts.left,
        right = counts.right,
        end = counts.end,
        boundary = counts.boundary,
        delay = counts.delay,
        split = counts.split,
        split_vertices = counts.split_vertices,
        max_front = encoder.max_front,
        "encoded connectivity"
    );

    writer.write_u32(encoder.max_front as u32);
    entropy::compress(&encoder.symbols, mode, writer)?;
    debug_write!("clers", writer);
    let order = encoder.vertex_order();
    let ClersEncoder { bits, context, decoded_faces, .. } = encoder;
    frame::write_bit_buffer(&bits.into_buffer(), writer);

    Ok(ConnectivityOutput { order, context, faces: decoded_faces, counts })
}
