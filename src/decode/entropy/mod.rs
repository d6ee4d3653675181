pub(crate) mod tunstall;

use crate::core::bit_coder::{ByteReader, ReaderErr};
use crate::shared::entropy::tunstall::SymbolProbability;
use crate::shared::entropy::EntropyMode;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("A stream of {0} bytes has no symbols")]
    EmptyAlphabet(usize),
    #[error("Invalid dictionary index {index}: the dictionary has {dictionary_size} words")]
    InvalidWord { index: u8, dictionary_size: usize },
    #[error("Decoded words overrun the expected size {0}")]
    Overrun(usize),
    #[error("Not enough data: {0}")]
    ReaderError(#[from] ReaderErr),
    #[error("Expected {expected} decoded bytes, found {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("Stream declares {size} bytes, more than the {limit} allowed here")]
    TooLarge { size: usize, limit: usize },
    #[error("Invalid symbol count {0}")]
    TooManySymbols(usize),
}

/// Reads one compressed sub-stream. 'max_len' bounds the decompressed size the caller
/// is willing to accept.
pub(crate) fn decompress<R>(reader: &mut R, mode: EntropyMode, max_len: usize) -> Result<Vec<u8>, Err>
    where R: ByteReader
{
    match mode {
        EntropyMode::None => {
            let size = reader.read_u32()? as usize;
            check_size(size, max_len)?;
            Ok(reader.read_bytes(size)?)
        },
        EntropyMode::Tunstall => {
            let num_symbols = reader.read_u32()? as usize;
            if num_symbols > 256 {
                return Err(Err::TooManySymbols(num_symbols));
            }
            let probabilities = (0..num_symbols)
                .map(|_| Ok(SymbolProbability {
                    symbol: reader.read_u8()?,
                    probability: reader.read_u8()?,
                }))
                .collect::<Result<Vec<_>, ReaderErr>>()?;
            let size = reader.read_u32()? as usize;
            check_size(size, max_len)?;
            let compressed_size = reader.read_u32()? as usize;
            let compressed = reader.read_bytes(compressed_size)?;
            tunstall::decompress(&probabilities, &compressed, size)
        },
    }
}

fn check_size(size: usize, limit: usize) -> Result<(), Err> {
    if size > limit {
        Err(Err::TooLarge { size, limit })
    } else {
        Ok(())
    }
}
