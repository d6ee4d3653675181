pub mod reader;
pub mod writer;

use reader::Reader;

/// widest value a single write or read call accepts.
pub const MAX_WIDTH: u32 = 31;

/// number of bits held by one word of the buffer.
pub(crate) const WORD_BITS: u32 = 32;

/// words reserved up front by a fresh writer.
const INITIAL_WORDS: usize = 256;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Err {
    #[error("Invalid bit width {0}: a single call packs at most 31 bits")]
    InvalidWidth(u32),
    #[error("Attempted to read beyond the end of the bit buffer")]
    NotEnoughData,
}

/// Packed integers of arbitrary width, stored as 32-bit words.
/// Within each word the first value written occupies the most significant bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    words: Vec<u32>,
}

impl BitBuffer {
    pub fn from_words(words: Vec<u32>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// returns the number of words stored in the buffer.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// returns the reader for the buffer.
    pub fn into_reader(self) -> Reader {
        Reader::new(self.words)
    }
}

#[inline]
pub(crate) fn low_mask(nbits: u32) -> u32 {
    debug_assert!(nbits <= MAX_WIDTH);
    (1_u32 << nbits) - 1
}
