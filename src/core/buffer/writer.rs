use super::{low_mask, BitBuffer, Err, INITIAL_WORDS, MAX_WIDTH, WORD_BITS};

/// Appends integers of arbitrary width to a word buffer.
/// Mostly used by the encoder.
#[derive(Debug)]
pub struct Writer {
	words: Vec<u32>,

	/// bits written to the current word but not yet committed.
	acc: u32,

	/// the number of bits still free in the accumulator, in 1..=32.
	free: u32,
}

impl Writer {
	pub fn new() -> Self {
		Self {
			words: Vec::with_capacity(INITIAL_WORDS),
			acc: 0,
			free: WORD_BITS,
		}
	}

	/// writes the low 'nbits' bits of 'value'.
	pub fn write(&mut self, value: u32, nbits: u32) -> Result<(), Err> {
		if nbits > MAX_WIDTH {
			return Err(Err::InvalidWidth(nbits));
		}
		if nbits == 0 {
			return Ok(());
		}
		let value = value & low_mask(nbits);

		if nbits >= self.free {
			// 'free' is at most 31 here since 'nbits' is.
			let spill = nbits - self.free;
			self.acc = (self.acc << self.free) | (value >> spill);
			// Vec doubles its capacity when it runs out.
			self.words.push(self.acc);
			self.acc = value & low_mask(spill);
			self.free = WORD_BITS - spill;
		} else {
			self.acc = (self.acc << nbits) | value;
			self.free -= nbits;
		}
		Ok(())
	}

	/// pads the partially filled word with zero bits and commits it.
	pub fn flush(&mut self) {
		if self.free != WORD_BITS {
			self.words.push(self.acc << self.free);
			self.acc = 0;
			self.free = WORD_BITS;
		}
	}

	pub fn into_buffer(mut self) -> BitBuffer {
		self.flush();
		BitBuffer { words: self.words }
	}
}

impl Default for Writer {
	fn default() -> Self {
		Self::new()
	}
}
