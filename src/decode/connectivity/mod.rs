pub(crate) mod clers;

use crate::core::bit_coder::{ByteReader, ReaderErr};
use crate::core::buffer;
use crate::core::shared::{Face, Quad};
use crate::debug_expect;
use crate::shared::connectivity::{Symbol, MAX_VERTICES};
use crate::shared::header::Header;
use super::{entropy, frame};
use clers::ClersDecoder;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Bit unpacking error: {0}")]
    BitError(#[from] buffer::Err),
    #[error("Entropy decoding error: {0}")]
    EntropyError(#[from] entropy::Err),
    #[error("Frame error: {0}")]
    FrameError(#[from] frame::Err),
    #[error("Front grows past the {0} edges the stream declares")]
    FrontOverflow(usize),
    #[error("Split index {index} refers to a vertex not decoded yet ({decoded} so far)")]
    InvalidSplitIndex { index: u32, decoded: u32 },
    #[error("Invalid symbol {0}")]
    InvalidSymbol(u8),
    #[error("Not enough data: {0}")]
    ReaderError(#[from] ReaderErr),
    #[error("Symbols ran out before the front was exhausted")]
    SymbolsExhausted,
    #[error("Faces overrun the group ending at {0}")]
    TooManyFaces(usize),
    #[error("More vertices than the {0} declared")]
    TooManyVertices(usize),
    #[error("{0} symbols left after the last group")]
    TrailingSymbols(usize),
    #[error("A component cannot start with {0:?}")]
    UnexpectedStartSymbol(Symbol),
}

/// Faces in traversal indices and the prediction context of every vertex.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConnectivityOutput {
    pub faces: Vec<Face>,
    pub context: Vec<Quad>,
}

/// Reads the connectivity block of a container whose header is 'header'.
pub(crate) fn decode_connectivity<R>(reader: &mut R, header: &Header) -> Result<ConnectivityOutput, Err>
    where R: ByteReader
{
    let num_vertices = header.num_vertices as usize;
    let num_faces = header.num_faces as usize;
    if num_vertices > MAX_VERTICES {
        return Err(Err::TooManyVertices(MAX_VERTICES));
    }

    let max_front = reader.read_u32()? as usize;
    // every face takes at most six symbols, delays included, and every component one more.
    let max_symbols = num_faces.saturating_mul(8).saturating_add(16);
    let symbols = entropy::decompress(reader, header.entropy, max_symbols)?;
    debug_expect!("clers", reader);
    let bits = frame::read_bit_buffer(reader)?.into_reader();
    tracing::trace!(symbols = symbols.len(), max_front, "read connectivity block");

    let mut decoder = ClersDecoder::new(symbols, bits, num_vertices, num_faces, max_front);
    for end in header.group_ends() {
        decoder.decode_group(end as usize)?;
    }
    decoder.finish()?;
    tracing::debug!(faces = decoder.faces.len(), vertices = decoder.context.len(), "decoded connectivity");

    let ClersDecoder { faces, context, .. } = decoder;
    Ok(ConnectivityOutput { faces, context })
}
