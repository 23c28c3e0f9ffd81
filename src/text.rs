//! Character-set encoders for string payloads.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::types::{Encoding, Endian};

const ASCII_REPLACEMENT: u8 = b'?';

/// Returns the payload length of `value` under `encoding`.
pub fn encoded_len(encoding: Encoding, value: &str) -> usize {
    match encoding {
        Encoding::Unicode => value.encode_utf16().count() * 2,
        Encoding::Ascii => value.chars().count(),
        Encoding::Utf8 => value.len(),
    }
}

/// Encodes `value` into `out`, which must be exactly
/// [`encoded_len`] bytes long.
pub fn encode_into(encoding: Encoding, endian: Endian, value: &str, out: &mut [u8]) {
    match encoding {
        Encoding::Unicode => {
            for (dst, unit) in out.chunks_exact_mut(2).zip(value.encode_utf16()) {
                match endian {
                    Endian::Little => LittleEndian::write_u16(dst, unit),
                    Endian::Big => BigEndian::write_u16(dst, unit),
                }
            }
        }
        Encoding::Ascii => {
            for (dst, c) in out.iter_mut().zip(value.chars()) {
                *dst = if c.is_ascii() { c as u8 } else { ASCII_REPLACEMENT };
            }
        }
        Encoding::Utf8 => out.copy_from_slice(value.as_bytes()),
    }
}

/// Decodes a string payload.
pub fn decode(encoding: Encoding, endian: Endian, bytes: &[u8]) -> Result<String> {
    match encoding {
        Encoding::Unicode => {
            if bytes.len() % 2 != 0 {
                return Err(Error::InvalidUtf16);
            }
            let units = bytes.chunks_exact(2).map(|unit| match endian {
                Endian::Little => LittleEndian::read_u16(unit),
                Endian::Big => BigEndian::read_u16(unit),
            });
            char::decode_utf16(units)
                .collect::<std::result::Result<String, _>>()
                .map_err(|_| Error::InvalidUtf16)
        }
        Encoding::Ascii => Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { ASCII_REPLACEMENT as char })
            .collect()),
        Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8),
    }
}
