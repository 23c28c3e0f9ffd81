//! Variant integers, zigzag mapping and dynamic-width integers.

use crate::error::{Error, Result};
use crate::types::MAX_TAG_BYTES;

/// Encodes `value` as little-endian 7-bit groups into `buf`.
///
/// Returns the number of bytes used. The encoding is minimal: `0` is a
/// single `0x00` byte.
#[inline]
pub fn encode_u32(mut value: u32, buf: &mut [u8; MAX_TAG_BYTES]) -> usize {
    let mut i = 0;
    while value > 0x7f {
        buf[i] = (value as u8 & 0x7f) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Decodes a 32-bit variant integer from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u32(data: &[u8]) -> Result<(u32, usize)> {
    let mut result: u32 = 0;
    let mut shift = 0;

    for i in 0..MAX_TAG_BYTES {
        let b = *data
            .get(i)
            .ok_or_else(|| Error::stream_too_short(i + 1, data.len()))?;

        // The 5th byte can only contribute 4 more bits.
        if i == MAX_TAG_BYTES - 1 && (b & 0xf0) != 0 {
            return Err(Error::VarintOverflow);
        }

        result |= ((b & 0x7f) as u32) << shift;
        if b & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(Error::VarintOverflow)
}

/// Encodes a signed integer using ZigZag encoding.
#[inline]
pub fn zigzag_encode_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Encodes a signed 64-bit integer using ZigZag encoding.
#[inline]
pub fn zigzag_encode_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Decodes a ZigZag encoded integer.
#[inline]
pub fn zigzag_decode_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ (-((n & 1) as i32))
}

/// Decodes a ZigZag encoded 64-bit integer.
#[inline]
pub fn zigzag_decode_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ (-((n & 1) as i64))
}

/// Number of low-order bytes needed to hold `value`.
///
/// Starts from 4 or 8 depending on whether the high half is zero, then drops
/// trailing zero bytes. The count doubles as the record's object type.
#[inline]
pub fn significant_bytes(value: u64) -> usize {
    let bytes = value.to_le_bytes();
    let mut count = if (value >> 32) == 0 { 4 } else { 8 };
    while count > 0 && bytes[count - 1] == 0 {
        count -= 1;
    }
    count
}

/// Signed 64-bit integer written with as few payload bytes as possible.
///
/// The value is zigzag-mapped before its significant bytes are stored, so
/// small magnitudes of either sign stay short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VInt(pub i64);

/// Unsigned 64-bit integer written with as few payload bytes as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VUInt(pub u64);

impl From<i64> for VInt {
    fn from(value: i64) -> Self {
        VInt(value)
    }
}

impl From<VInt> for i64 {
    fn from(value: VInt) -> Self {
        value.0
    }
}

impl From<u64> for VUInt {
    fn from(value: u64) -> Self {
        VUInt(value)
    }
}

impl From<VUInt> for u64 {
    fn from(value: VUInt) -> Self {
        value.0
    }
}
