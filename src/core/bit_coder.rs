/// Little-endian typed writes into an in-memory container.
pub trait ByteWriter: Sized {
    fn write_u8(&mut self, value: u8);

    /// number of bytes written since the writer was created.
    fn bytes_written(&self) -> usize;

    fn write_u16(&mut self, value: u16) {
        self.write_u8(value as u8);
        self.write_u8((value >> 8) as u8);
    }
    fn write_u32(&mut self, value: u32) {
        self.write_u16(value as u16);
        self.write_u16((value >> 16) as u16);
    }
    fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }
    fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_u8(b);
        }
    }
}

impl ByteWriter for Vec<u8> {
    fn write_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn bytes_written(&self) -> usize {
        self.len()
    }

    fn write_u16(&mut self, value: u16) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}


#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderErr {
    #[error("Not enough data to read")]
    NotEnoughData,
}

/// Little-endian typed reads. Every read is bounds checked against the remaining input.
pub trait ByteReader {
    fn read_u8(&mut self) -> Result<u8, ReaderErr>;

    /// number of bytes that can still be read.
    fn remaining(&self) -> usize;

    /// number of bytes consumed since the reader was created.
    fn bytes_read(&self) -> usize;

    fn read_u16(&mut self) -> Result<u16, ReaderErr> {
        let b0 = self.read_u8()? as u16;
        let b1 = self.read_u8()? as u16;
        Ok(b0 | (b1 << 8))
    }
    fn read_u32(&mut self) -> Result<u32, ReaderErr> {
        let lo = self.read_u16()? as u32;
        let hi = self.read_u16()? as u32;
        Ok(lo | (hi << 16))
    }
    fn read_i32(&mut self) -> Result<i32, ReaderErr> {
        Ok(self.read_u32()? as i32)
    }
    fn read_f32(&mut self) -> Result<f32, ReaderErr> {
        Ok(f32::from_bits(self.read_u32()?))
    }
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ReaderErr> {
        if len > self.remaining() {
            return Err(ReaderErr::NotEnoughData);
        }
        (0..len).map(|_| self.read_u8()).collect()
    }
}

/// Reads a container held in a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteReader for SliceReader<'_> {
    fn read_u8(&mut self) -> Result<u8, ReaderErr> {
        let b = *self.data.get(self.pos).ok_or(ReaderErr::NotEnoughData)?;
        self.pos += 1;
        Ok(b)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn bytes_read(&self) -> usize {
        self.pos
    }

    fn read_u32(&mut self) -> Result<u32, ReaderErr> {
        let bytes = self.data.get(self.pos..self.pos + 4).ok_or(ReaderErr::NotEnoughData)?;
        self.pos += 4;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ReaderErr> {
        let end = self.pos.checked_add(len).ok_or(ReaderErr::NotEnoughData)?;
        let bytes = self.data.get(self.pos..end).ok_or(ReaderErr::NotEnoughData)?;
        self.pos = end;
        Ok(bytes.to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values_are_little_endian() {
        let mut buffer = Vec::new();
        buffer.write_u8(0xAB);
        buffer.write_u16(0x1234);
        buffer.write_u32(0xDEADBEEF);
        buffer.write_i32(-2);
        buffer.write_f32(1.5);
        assert_eq!(&buffer[..7], &[0xAB, 0x34, 0x12, 0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(buffer.bytes_written(), 15);

        let mut reader = SliceReader::new(&buffer);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_i32().unwrap(), -2);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.bytes_read(), 15);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let buffer = vec![1_u8, 2, 3];
        let mut reader = SliceReader::new(&buffer);
        assert_eq!(reader.read_u32(), Err(ReaderErr::NotEnoughData));
        assert_eq!(reader.read_bytes(4), Err(ReaderErr::NotEnoughData));
        assert_eq!(reader.read_bytes(usize::MAX), Err(ReaderErr::NotEnoughData));
        assert_eq!(reader.read_bytes(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(reader.read_u8(), Err(ReaderErr::NotEnoughData));
    }
}
