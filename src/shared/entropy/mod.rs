pub(crate) mod tunstall;

use crate::prelude::{ByteReader, ByteWriter};
use crate::core::bit_coder::ReaderErr;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Invalid entropy mode: {0}")]
    InvalidEntropyMode(u8),
    #[error("Reader error: {0}")]
    ReaderError(#[from] ReaderErr),
}

/// How every compressed sub-stream of a container is coded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntropyMode {
    /// bytes are stored as they are, after their length.
    None,
    /// bytes are coded with a Tunstall dictionary of 256 words.
    #[default]
    Tunstall,
}

impl EntropyMode {
    pub fn get_id(self) -> u8 {
        match self {
            EntropyMode::None => 0,
            EntropyMode::Tunstall => 1,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, Err> {
        match id {
            0 => Ok(EntropyMode::None),
            1 => Ok(EntropyMode::Tunstall),
            _ => Err(Err::InvalidEntropyMode(id)),
        }
    }

    pub fn write_to<W: ByteWriter>(self, writer: &mut W) {
        writer.write_u8(self.get_id());
    }

    pub fn read_from<R: ByteReader>(reader: &mut R) -> Result<Self, Err> {
        Self::from_id(reader.read_u8()?)
    }
}
