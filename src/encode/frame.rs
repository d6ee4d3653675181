use crate::core::bit_coder::ByteWriter;
use crate::core::buffer::{self, writer::Writer, BitBuffer};
use crate::shared::entropy::EntropyMode;
use crate::utils::{bit_length, signed_bit_length};
use super::entropy;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Err {
    #[error("Bit packing error: {0}")]
    BitError(#[from] buffer::Err),
    #[error("Entropy coding error: {0}")]
    EntropyError(#[from] entropy::Err),
    #[error("String of {0} bytes is too long to be stored")]
    StringTooLong(usize),
}

/// Writes a string as its length plus one, its bytes and a terminating zero.
pub(crate) fn write_string<W>(s: &str, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    let len = u16::try_from(s.len() + 1).map_err(|_| Err::StringTooLong(s.len()))?;
    writer.write_u16(len);
    writer.write_bytes(s.as_bytes());
    writer.write_u8(0);
    Ok(())
}

/// Writes the word count, zero padding up to a multiple of four bytes from the start of
/// the container, and the words.
pub(crate) fn write_bit_buffer<W>(buffer: &BitBuffer, writer: &mut W)
    where W: ByteWriter
{
    writer.write_i32(buffer.len() as i32);
    while writer.bytes_written() % 4 != 0 {
        writer.write_u8(0);
    }
    for &word in buffer.words() {
        writer.write_u32(word);
    }
}

/// packs 'v' biased into `[0, 2^len)`; 'len' must be at least `signed_bit_length(v)`.
fn write_signed(bits: &mut Writer, v: i32, len: u32) -> Result<(), buffer::Err> {
    if len == 0 {
        return Ok(());
    }
    let packed = (v as i64 + (1_i64 << (len - 1))) as u32;
    write_wide(bits, packed, len)
}

/// writes up to 32 bits, in two calls when wider than 16.
fn write_wide(bits: &mut Writer, value: u32, len: u32) -> Result<(), buffer::Err> {
    if len > 16 {
        bits.write(value >> 16, len - 16)?;
        bits.write(value & 0xffff, 16)
    } else {
        bits.write(value, len)
    }
}

/// Codes 'values', 'n' components per item, with one bit length per value.
/// Each channel gets its own compressed log array; the payload is packed channel by channel.
pub(crate) fn encode_values<W>(values: &[i32], n: usize, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    let count = values.len() / n.max(1);
    let mut bits = Writer::new();
    for c in 0..n {
        let channel = (0..count).map(|i| values[i * n + c]);
        let logs = channel.clone()
            .map(|v| signed_bit_length(v) as u8)
            .collect::<Vec<_>>();
        entropy::compress(&logs, mode, writer)?;
        for (v, &len) in channel.zip(&logs) {
            write_signed(&mut bits, v, len as u32)?;
        }
    }
    write_bit_buffer(&bits.into_buffer(), writer);
    Ok(())
}

/// Codes 'values', 'n' components per item, with one bit length per item: the widest of
/// its components.
pub(crate) fn encode_array<W>(values: &[i32], n: usize, mode: EntropyMode, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    let n = n.max(1);
    let logs = values.chunks_exact(n)
        .map(|item| item.iter().map(|&v| signed_bit_length(v)).max().unwrap_or(0) as u8)
        .collect::<Vec<_>>();
    entropy::compress(&logs, mode, writer)?;

    let mut bits = Writer::new();
    for (item, &len) in values.chunks_exact(n).zip(&logs) {
        for &v in item {
            write_signed(&mut bits, v, len as u32)?;
        }
    }
    write_bit_buffer(&bits.into_buffer(), writer);
    Ok(())
}

/// Codes a single channel as the differences between consecutive values.
pub(crate) fn encode_diffs<W>(values: &[i32], mode: EntropyMode, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    let mut prev = 0_i32;
    let diffs = values.iter()
        .map(|&v| {
            let d = v.wrapping_sub(prev);
            prev = v;
            d
        })
        .collect::<Vec<_>>();
    encode_values(&diffs, 1, mode, writer)
}

/// Codes non-negative values. `u` has length `bit_length(u + 1)` and its leading one is implied.
pub(crate) fn encode_indices<W>(values: &[u32], mode: EntropyMode, writer: &mut W) -> Result<(), Err>
    where W: ByteWriter
{
    let logs = values.iter()
        .map(|&u| bit_length(u as u64 + 1) as u8)
        .collect::<Vec<_>>();
    entropy::compress(&logs, mode, writer)?;

    let mut bits = Writer::new();
    for (&u, &len) in values.iter().zip(&logs) {
        let len = len as u32;
        let packed = (u as u64 + 1 - (1_u64 << (len - 1))) as u32;
        write_wide(&mut bits, packed, len - 1)?;
    }
    write_bit_buffer(&bits.into_buffer(), writer);
    Ok(())
}
