pub(crate) mod tunstall;

use crate::core::bit_coder::ByteWriter;
use crate::shared::entropy::EntropyMode;
use tunstall::TunstallEncoder;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Dictionary word {0} collides with another word in the lookup table")]
    LookupConflict(usize),
    #[error("No dictionary word matches the input at position {0}")]
    MissingLookupEntry(usize),
}

/// Writes 'data' as one compressed sub-stream.
///
/// With [EntropyMode::Tunstall] the sub-stream is the probability table, the size of 'data',
/// and the size and bytes of the compressed data. With [EntropyMode::None] it is the size
/// followed by the raw bytes.
pub(crate) fn compress<W>(data: &[u8], mode: EntropyMode, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    match mode {
        EntropyMode::None => {
            writer.write_u32(data.len() as u32);
            writer.write_bytes(data);
        },
        EntropyMode::Tunstall => {
            let encoder = TunstallEncoder::new(data)?;
            let compressed = encoder.compress(data)?;

            let probabilities = encoder.probabilities();
            writer.write_u32(probabilities.len() as u32);
            for p in probabilities {
                writer.write_u8(p.symbol);
                writer.write_u8(p.probability);
            }
            writer.write_u32(data.len() as u32);
            writer.write_u32(compressed.len() as u32);
            writer.write_bytes(&compressed);
            tracing::trace!(
                symbols = probabilities.len(),
                input = data.len(),
                output = compressed.len(),
                "tunstall stream"
            );
        },
    }
    Ok(())
}
