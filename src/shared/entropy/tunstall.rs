use std::collections::VecDeque;

/// number of words in a dictionary; each word is coded as one byte.
pub(crate) const DICTIONARY_SIZE: usize = 256;

/// A symbol of the source alphabet and its probability scaled to 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SymbolProbability {
    pub symbol: u8,
    pub probability: u8,
}

/// Histograms 'data' and returns the symbols present, most probable first.
/// Symbols of equal probability keep ascending byte order.
pub(crate) fn build_probabilities(data: &[u8]) -> Vec<SymbolProbability> {
    let mut counts = [0_u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let size = data.len() as u64;
    let mut probabilities = counts.iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .map(|(symbol, &count)| SymbolProbability {
            symbol: symbol as u8,
            probability: (count * 255 / size) as u8,
        })
        .collect::<Vec<_>>();
    // stable
    probabilities.sort_by(|a, b| b.probability.cmp(&a.probability));
    probabilities
}


/// The words of a Tunstall dictionary. Word `i` is the byte sequence coded by output byte `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Dictionary {
    table: Vec<u8>,
    offsets: Vec<usize>,
    lengths: Vec<usize>,
}

impl Dictionary {
    pub(crate) fn len(&self) -> usize {
        self.offsets.len()
    }

    pub(crate) fn word(&self, index: usize) -> Option<&[u8]> {
        let offset = *self.offsets.get(index)?;
        self.table.get(offset..offset + self.lengths[index])
    }

    pub(crate) fn words(&self) -> impl Iterator<Item = &[u8]> {
        self.offsets.iter()
            .zip(&self.lengths)
            .map(|(&o, &l)| &self.table[o..o + l])
    }
}


/// A word under construction: where it lives in the scratch table and how likely it is,
/// in 16-bit fixed point.
#[derive(Clone, Copy, Debug)]
struct Entry {
    offset: usize,
    length: usize,
    probability: u32,
}

/// Builds the dictionary that both the compressor and the decompressor derive from the
/// probability table.
///
/// Starting from the singleton words, the most probable word is replaced by its extensions
/// with every symbol, until one more replacement would exceed [DICTIONARY_SIZE] words.
/// Words ending in symbol `i` are kept in queue `i`; a queue's front is its most probable word,
/// so the best candidate is found by looking at the fronts only. Ties go to the lowest queue.
pub(crate) fn build_dictionary(probabilities: &[SymbolProbability]) -> Dictionary {
    let n = probabilities.len();
    if n <= 1 {
        // nothing to code; a lone symbol still gets its word so that decoding can fill with it.
        return Dictionary {
            table: probabilities.iter().map(|p| p.symbol).collect(),
            offsets: (0..n).collect(),
            lengths: vec![1; n],
        };
    }

    let scaled = probabilities.iter()
        .map(|p| (p.probability as u32) << 8)
        .collect::<Vec<_>>();
    let mut table = probabilities.iter().map(|p| p.symbol).collect::<Vec<_>>();
    let mut queues = (0..n)
        .map(|i| VecDeque::from([Entry { offset: i, length: 1, probability: scaled[i] }]))
        .collect::<Vec<_>>();

    let mut num_words = n;

    // The most probable symbol keeps winning while its runs stay at least as likely as
    // the second symbol: p0^k >= p1. Those splits all hit queue 0 while the other queues
    // are still untouched, so they need no search.
    while num_words + n - 1 <= DICTIONARY_SIZE && front_probability(&queues[0]) >= scaled[1] {
        split(&mut queues, 0, &scaled, probabilities, &mut table);
        num_words += n - 1;
    }

    while num_words + n - 1 <= DICTIONARY_SIZE {
        let mut best = 0;
        let mut max_probability = front_probability(&queues[0]);
        for (i, q) in queues.iter().enumerate().skip(1) {
            let p = front_probability(q);
            if p > max_probability {
                best = i;
                max_probability = p;
            }
        }
        split(&mut queues, best, &scaled, probabilities, &mut table);
        num_words += n - 1;
    }

    // compact the surviving words into a fresh table
    let mut dictionary = Dictionary {
        table: Vec::new(),
        offsets: Vec::with_capacity(num_words),
        lengths: Vec::with_capacity(num_words),
    };
    for entry in queues.iter().flatten() {
        dictionary.offsets.push(dictionary.table.len());
        dictionary.lengths.push(entry.length);
        dictionary.table.extend_from_slice(&table[entry.offset..entry.offset + entry.length]);
    }
    dictionary
}

fn front_probability(queue: &VecDeque<Entry>) -> u32 {
    queue.front().map_or(0, |e| e.probability)
}

/// replaces the front word of queue 'best' with its extensions by every symbol.
fn split(
    queues: &mut [VecDeque<Entry>],
    best: usize,
    scaled: &[u32],
    probabilities: &[SymbolProbability],
    table: &mut Vec<u8>,
) {
    // every split pushes one word back into each queue, so no queue ever runs empty.
    let Some(word) = queues[best].pop_front() else { return };
    for (i, p) in probabilities.iter().enumerate() {
        let offset = table.len();
        table.extend_from_within(word.offset..word.offset + word.length);
        table.push(p.symbol);
        queues[i].push_back(Entry {
            offset,
            length: word.length + 1,
            probability: (word.probability * scaled[i]) >> 16,
        });
    }
}
