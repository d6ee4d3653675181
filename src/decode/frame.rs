use crate::core::bit_coder::{ByteReader, ReaderErr};
use crate::core::buffer::{self, reader::Reader, BitBuffer};
use crate::shared::entropy::EntropyMode;
use super::entropy;

/// widest bit length a log array may hold; index logs may be one wider.
const MAX_LOG: u8 = 32;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Bit unpacking error: {0}")]
    BitError(#[from] buffer::Err),
    #[error("Entropy decoding error: {0}")]
    EntropyError(#[from] entropy::Err),
    #[error("Invalid bit length {0}")]
    InvalidBitLength(u8),
    #[error("Invalid string length 0")]
    InvalidString,
    #[error("String is not valid UTF-8")]
    InvalidUtf8,
    #[error("Invalid word count {0}")]
    InvalidWordCount(i32),
    #[error("Expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("Not enough data: {0}")]
    ReaderError(#[from] ReaderErr),
}

pub(crate) fn read_string<R>(reader: &mut R) -> Result<String, Err>
    where R: ByteReader
{
    let len = reader.read_u16()? as usize;
    if len == 0 {
        return Err(Err::InvalidString);
    }
    let mut bytes = reader.read_bytes(len)?;
    if bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|_| Err::InvalidUtf8)
}

pub(crate) fn read_bit_buffer<R>(reader: &mut R) -> Result<BitBuffer, Err>
    where R: ByteReader
{
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Err::InvalidWordCount(count));
    }
    while reader.bytes_read() % 4 != 0 {
        reader.read_u8()?;
    }
    let count = count as usize;
    if count > reader.remaining() / 4 {
        return Err(Err::InvalidWordCount(count as i32));
    }
    let words = (0..count)
        .map(|_| reader.read_u32())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BitBuffer::from_words(words))
}

/// reads a log array that must hold exactly 'count' lengths of at most 'max_log'.
fn read_logs<R>(reader: &mut R, mode: EntropyMode, count: usize, max_log: u8) -> Result<Vec<u8>, Err>
    where R: ByteReader
{
    let logs = entropy::decompress(reader, mode, count)?;
    if logs.len() != count {
        return Err(Err::LengthMismatch { expected: count, found: logs.len() });
    }
    if let Some(&bad) = logs.iter().find(|&&len| len > max_log) {
        return Err(Err::InvalidBitLength(bad));
    }
    Ok(logs)
}

fn read_wide(bits: &mut Reader, len: u32) -> Result<u32, buffer::Err> {
    if len > 16 {
        let hi = bits.read(len - 16)?;
        let lo = bits.read(16)?;
        Ok((hi << 16) | lo)
    } else {
        bits.read(len)
    }
}

fn read_signed(bits: &mut Reader, len: u32) -> Result<i32, buffer::Err> {
    if len == 0 {
        return Ok(0);
    }
    let packed = read_wide(bits, len)?;
    Ok((packed as i64 - (1_i64 << (len - 1))) as i32)
}

/// Inverse of `encode_values`: 'count' items of 'n' components.
pub(crate) fn decode_values<R>(reader: &mut R, mode: EntropyMode, count: usize, n: usize) -> Result<Vec<i32>, Err>
    where R: ByteReader
{
    let logs = (0..n)
        .map(|_| read_logs(reader, mode, count, MAX_LOG))
        .collect::<Result<Vec<_>, _>>()?;
    let mut bits = read_bit_buffer(reader)?.into_reader();
    let mut values = vec![0; count * n];
    for (c, channel) in logs.iter().enumerate() {
        for (i, &len) in channel.iter().enumerate() {
            values[i * n + c] = read_signed(&mut bits, len as u32)?;
        }
    }
    Ok(values)
}

/// Inverse of `encode_array`.
pub(crate) fn decode_array<R>(reader: &mut R, mode: EntropyMode, count: usize, n: usize) -> Result<Vec<i32>, Err>
    where R: ByteReader
{
    let logs = read_logs(reader, mode, count, MAX_LOG)?;
    let mut bits = read_bit_buffer(reader)?.into_reader();
    let mut values = Vec::with_capacity(count * n);
    for &len in &logs {
        for _ in 0..n {
            values.push(read_signed(&mut bits, len as u32)?);
        }
    }
    Ok(values)
}

/// Inverse of `encode_diffs`.
pub(crate) fn decode_diffs<R>(reader: &mut R, mode: EntropyMode, count: usize) -> Result<Vec<i32>, Err>
    where R: ByteReader
{
    let mut values = decode_values(reader, mode, count, 1)?;
    let mut acc = 0_i32;
    for v in values.iter_mut() {
        acc = acc.wrapping_add(*v);
        *v = acc;
    }
    Ok(values)
}

/// Inverse of `encode_indices`.
pub(crate) fn decode_indices<R>(reader: &mut R, mode: EntropyMode, count: usize) -> Result<Vec<u32>, Err>
    where R: ByteReader
{
    let logs = read_logs(reader, mode, count, MAX_LOG + 1)?;
    let mut bits = read_bit_buffer(reader)?.into_reader();
    logs.iter()
        .map(|&len| {
            if len == 0 {
                return Err(Err::InvalidBitLength(len));
            }
            let len = len as u32;
            let packed = read_wide(&mut bits, len - 1)? as u64;
            let u = packed + (1_u64 << (len - 1)) - 1;
            u32::try_from(u).map_err(|_| Err::InvalidBitLength(len as u8))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bit_coder::SliceReader;
    use crate::encode::frame::{encode_array, encode_diffs, encode_indices, encode_values, write_string};
    use proptest::prelude::*;

    #[test]
    fn strings_round_trip() {
        let mut buffer = Vec::new();
        write_string("position", &mut buffer).unwrap();
        write_string("", &mut buffer).unwrap();
        let mut reader = SliceReader::new(&buffer);
        assert_eq!(read_string(&mut reader).unwrap(), "position");
        assert_eq!(read_string(&mut reader).unwrap(), "");
        assert_eq!(read_string(&mut reader), Err(Err::ReaderError(ReaderErr::NotEnoughData)));
    }

    #[test]
    fn corrupt_bit_blocks_are_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(-1_i32).to_le_bytes());
        assert_eq!(read_bit_buffer(&mut SliceReader::new(&buffer)), Err(Err::InvalidWordCount(-1)));

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&1000_i32.to_le_bytes());
        buffer.extend_from_slice(&[0; 16]);
        assert_eq!(read_bit_buffer(&mut SliceReader::new(&buffer)), Err(Err::InvalidWordCount(1000)));
    }

    #[test]
    fn wrong_counts_are_rejected() {
        let mut buffer = Vec::new();
        encode_values(&[1, 2, 3], 1, EntropyMode::None, &mut buffer).unwrap();
        let result = decode_values(&mut SliceReader::new(&buffer), EntropyMode::None, 4, 1);
        assert_eq!(result, Err(Err::LengthMismatch { expected: 4, found: 3 }));
    }

    #[test]
    fn oversized_counts_fail_before_expanding() {
        let count = 1_usize << 28;
        // a raw log array longer than the input.
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(count as u32).to_le_bytes());
        buffer.extend_from_slice(&[0; 8]);
        assert_eq!(
            decode_values(&mut SliceReader::new(&buffer), EntropyMode::None, count, 3),
            Err(Err::EntropyError(entropy::Err::ReaderError(ReaderErr::NotEnoughData)))
        );

        // a single Tunstall word cannot expand to the declared size.
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&2_u32.to_le_bytes());
        buffer.extend_from_slice(&[0, 128, 1, 127]);
        buffer.extend_from_slice(&(count as u32).to_le_bytes());
        buffer.extend_from_slice(&1_u32.to_le_bytes());
        buffer.push(0);
        assert!(matches!(
            decode_values(&mut SliceReader::new(&buffer), EntropyMode::Tunstall, count, 3),
            Err(Err::EntropyError(entropy::Err::SizeMismatch { expected, .. })) if expected == count
        ));
    }

    #[test]
    fn extreme_values_survive() {
        let values = [i32::MIN, i32::MAX, 0, -1, 65535, -65536];
        let mut buffer = Vec::new();
        encode_values(&values, 2, EntropyMode::Tunstall, &mut buffer).unwrap();
        encode_indices(&[u32::MAX, 0, 1 << 31], EntropyMode::Tunstall, &mut buffer).unwrap();
        let mut reader = SliceReader::new(&buffer);
        assert_eq!(decode_values(&mut reader, EntropyMode::Tunstall, 3, 2).unwrap(), values);
        assert_eq!(decode_indices(&mut reader, EntropyMode::Tunstall, 3).unwrap(), vec![u32::MAX, 0, 1 << 31]);
    }

    fn mode() -> impl Strategy<Value = EntropyMode> {
        prop_oneof![Just(EntropyMode::None), Just(EntropyMode::Tunstall)]
    }

    proptest! {
        #[test]
        fn residual_streams_round_trip(
            items in proptest::collection::vec(proptest::array::uniform3(-5000_i32..5000), 0..120),
            wide in proptest::collection::vec(any::<i32>(), 0..40),
            indices in proptest::collection::vec(any::<u32>(), 0..40),
            mode in mode(),
        ) {
            let flat = items.iter().flatten().copied().collect::<Vec<_>>();
            let mut buffer = vec![0xff];
            encode_values(&flat, 3, mode, &mut buffer).unwrap();
            encode_array(&flat, 3, mode, &mut buffer).unwrap();
            encode_diffs(&wide, mode, &mut buffer).unwrap();
            encode_indices(&indices, mode, &mut buffer).unwrap();

            let mut reader = SliceReader::new(&buffer);
            reader.read_u8().unwrap();
            prop_assert_eq!(decode_values(&mut reader, mode, items.len(), 3).unwrap(), flat.clone());
            prop_assert_eq!(decode_array(&mut reader, mode, items.len(), 3).unwrap(), flat);
            prop_assert_eq!(decode_diffs(&mut reader, mode, wide.len()).unwrap(), wide);
            prop_assert_eq!(decode_indices(&mut reader, mode, indices.len()).unwrap(), indices);
            prop_assert_eq!(reader.remaining(), 0);
        }
    }
}
