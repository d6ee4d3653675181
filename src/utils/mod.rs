pub(crate) mod debug;

/// number of bits needed to represent 'value'; 0 for 0.
#[inline]
pub(crate) fn bit_length(value: u64) -> u32 {
    64 - value.leading_zeros()
}

/// smallest 'k' with '2^k >= n'; 0 for n <= 1.
#[inline]
pub(crate) fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        bit_length(n - 1)
    }
}

/// the smallest 'len' with '-2^(len-1) <= v < 2^(len-1)'; 0 is the only value with length 0.
#[inline]
pub(crate) fn signed_bit_length(v: i32) -> u32 {
    if v == 0 {
        return 0;
    }
    let magnitude = (if v < 0 { !v } else { v }) as u32;
    bit_length(magnitude as u64) + 1
}

/// spreads the low 21 bits of 'v' so that two zero bits separate consecutive bits.
fn spread_bits_21(v: u64) -> u64 {
    let mut x = v & 0x1f_ffff;
    x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// interleaves three 21-bit coordinates into a z-order (Morton) code.
pub(crate) fn morton_code(x: u32, y: u32, z: u32) -> u64 {
    spread_bits_21(x as u64) | (spread_bits_21(y as u64) << 1) | (spread_bits_21(z as u64) << 2)
}
