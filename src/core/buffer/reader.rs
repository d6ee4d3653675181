use super::{low_mask, Err, MAX_WIDTH, WORD_BITS};

/// Reads the integers of a word buffer back in the order they were written.
/// Mostly used by the decoder.
#[derive(Debug)]
pub struct Reader {
	words: Vec<u32>,

	/// index of the next word to load.
	pos: usize,

	/// the word being consumed.
	acc: u32,

	/// the number of unread bits at the bottom of 'acc'. It is always less than 32.
	avail: u32,
}

impl Reader {
	pub(super) fn new(words: Vec<u32>) -> Self {
		Self { words, pos: 0, acc: 0, avail: 0 }
	}

	/// reads the next 'nbits' bits. The output is stored in the low bits.
	pub fn read(&mut self, nbits: u32) -> Result<u32, Err> {
		if nbits > MAX_WIDTH {
			return Err(Err::InvalidWidth(nbits));
		}
		if nbits == 0 {
			return Ok(0);
		}

		if nbits <= self.avail {
			let value = (self.acc >> (self.avail - nbits)) & low_mask(nbits);
			self.avail -= nbits;
			return Ok(value);
		}

		let high_bits = self.avail;
		let high = self.acc & low_mask(high_bits);
		let word = *self.words.get(self.pos).ok_or(Err::NotEnoughData)?;
		self.pos += 1;

		// 1..=31 bits are taken from the fresh word.
		let low_bits = nbits - high_bits;
		let low = word >> (WORD_BITS - low_bits);
		self.acc = word;
		self.avail = WORD_BITS - low_bits;
		Ok((high << low_bits) | low)
	}
}
