use crate::shared::entropy::tunstall::{build_dictionary, build_probabilities, Dictionary, SymbolProbability};
use super::Err;

/// the lookup window never spans more than this many symbols.
const MAX_LOOKUP_DEPTH: u32 = 3;

/// entries of a single lookup table are bounded by this.
const MAX_TABLE_SIZE: usize = 1 << 16;

/// Resolution of one window of input symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lookup {
    Missing,
    /// the window starts with the word of this index.
    Word(u8),
    /// every word starting with the window is longer than it; continue in the table at this offset.
    Table(u32),
}

/// Greedy Tunstall compressor over a byte alphabet.
pub(crate) struct TunstallEncoder {
    probabilities: Vec<SymbolProbability>,
    dictionary: Dictionary,
    /// position of each byte in the probability table.
    rank: [usize; 256],
    depth: usize,
    table_size: usize,
    lookup: Vec<Lookup>,
}

impl TunstallEncoder {
    /// Builds the probability table, the dictionary and the lookup tables for 'data'.
    pub fn new(data: &[u8]) -> Result<Self, Err> {
        let probabilities = build_probabilities(data);
        let dictionary = build_dictionary(&probabilities);
        let mut rank = [0; 256];
        for (i, p) in probabilities.iter().enumerate() {
            rank[p.symbol as usize] = i;
        }
        let n = probabilities.len().max(1);
        let mut depth = MAX_LOOKUP_DEPTH;
        while depth > 1 && n.pow(depth) > MAX_TABLE_SIZE {
            depth -= 1;
        }
        let depth = depth as usize;
        let mut encoder = Self {
            probabilities,
            dictionary,
            rank,
            depth,
            table_size: n.pow(depth as u32),
            lookup: Vec::new(),
        };
        if encoder.probabilities.len() > 1 {
            encoder.build_lookup()?;
        }
        Ok(encoder)
    }

    pub fn probabilities(&self) -> &[SymbolProbability] {
        &self.probabilities
    }

    /// base-n code of the first 'depth' symbols of 'window', padded with rank 0.
    fn window_code(&self, window: &[u8]) -> usize {
        (0..self.depth).fold(0, |code, i| {
            let r = window.get(i).map_or(0, |&s| self.rank[s as usize]);
            code * self.probabilities.len() + r
        })
    }

    fn build_lookup(&mut self) -> Result<(), Err> {
        let n = self.probabilities.len();
        self.lookup = vec![Lookup::Missing; self.table_size];

        let words = self.dictionary.words().map(|w| w.to_vec()).collect::<Vec<_>>();
        for (index, word) in words.iter().enumerate() {
            let mut base = 0;
            let mut rest = &word[..];
            while rest.len() > self.depth {
                let slot = base + self.window_code(&rest[..self.depth]);
                base = match self.lookup[slot] {
                    Lookup::Missing => {
                        let table = self.lookup.len();
                        self.lookup.resize(table + self.table_size, Lookup::Missing);
                        self.lookup[slot] = Lookup::Table(table as u32);
                        table
                    },
                    Lookup::Table(table) => table as usize,
                    Lookup::Word(_) => return Err(Err::LookupConflict(index)),
                };
                rest = &rest[self.depth..];
            }

            // a word shorter than the window covers every window it is a prefix of.
            let span = n.pow((self.depth - rest.len()) as u32);
            let low = base + self.window_code(rest);
            for entry in &mut self.lookup[low..low + span] {
                if *entry != Lookup::Missing {
                    return Err(Err::LookupConflict(index));
                }
                *entry = Lookup::Word(index as u8);
            }
        }
        Ok(())
    }

    /// Replaces the longest dictionary word at every position of 'data' by its index.
    /// The last word may reach past the end of the data.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, Err> {
        if self.probabilities.len() <= 1 {
            return Ok(Vec::new());
        }
        let mut output = Vec::with_capacity(data.len() / 2 + 1);
        let mut pos = 0;
        while pos < data.len() {
            let mut base = 0;
            let mut offset = pos;
            let index = loop {
                let window = data.get(offset..).unwrap_or(&[]);
                match self.lookup.get(base + self.window_code(window)) {
                    Some(Lookup::Word(index)) => break *index,
                    Some(Lookup::Table(table)) => {
                        base = *table as usize;
                        offset += self.depth;
                    },
                    _ => return Err(Err::MissingLookupEntry(pos)),
                }
            };
            output.push(index);
            pos += self.dictionary.word(index as usize).map_or(0, |w| w.len()).max(1);
        }
        Ok(output)
    }
}
