//! Wire format types and utilities.

use crate::error::{Error, Result};

/// Field indices must lie in `[1, MAX_FIELD_INDEX)`.
pub const MAX_FIELD_INDEX: u32 = 1 << 28;

/// Maximum number of bytes a varint-encoded tag can occupy.
pub const MAX_TAG_BYTES: usize = 5;

/// Index used by built-in codecs when they are the top-level value.
pub(crate) const TOP_LEVEL_INDEX: u32 = 1;

/// Wire shape of a field payload, stored in the low nibble of a tag.
///
/// `Fixed*` shapes carry a payload of exactly the named number of bits.
/// `LengthPrefixed` carries a varint byte length followed by that many bytes.
/// `Missing` never appears on a well-formed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectType {
    Missing = 0,
    Fixed8 = 1,
    Fixed16 = 2,
    Fixed24 = 3,
    Fixed32 = 4,
    Fixed40 = 5,
    Fixed48 = 6,
    Fixed56 = 7,
    Fixed64 = 8,
    Fixed72 = 9,
    Fixed80 = 10,
    Fixed88 = 11,
    Fixed96 = 12,
    Fixed104 = 13,
    Fixed128 = 14,
    LengthPrefixed = 15,
}

impl ObjectType {
    /// Converts the low nibble of a tag to an object type.
    ///
    /// Every nibble value is assigned, so this never fails.
    pub fn from_nibble(value: u8) -> Self {
        match value & 0x0f {
            0 => ObjectType::Missing,
            1 => ObjectType::Fixed8,
            2 => ObjectType::Fixed16,
            3 => ObjectType::Fixed24,
            4 => ObjectType::Fixed32,
            5 => ObjectType::Fixed40,
            6 => ObjectType::Fixed48,
            7 => ObjectType::Fixed56,
            8 => ObjectType::Fixed64,
            9 => ObjectType::Fixed72,
            10 => ObjectType::Fixed80,
            11 => ObjectType::Fixed88,
            12 => ObjectType::Fixed96,
            13 => ObjectType::Fixed104,
            14 => ObjectType::Fixed128,
            _ => ObjectType::LengthPrefixed,
        }
    }

    /// Returns the payload length of a fixed shape.
    ///
    /// `None` for `LengthPrefixed` (the length follows on the wire) and for
    /// `Missing` (no payload rule at all).
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            ObjectType::Missing | ObjectType::LengthPrefixed => None,
            ObjectType::Fixed128 => Some(16),
            fixed => Some(fixed as usize),
        }
    }

    /// Picks the smallest shape able to carry a payload of `len` bytes.
    ///
    /// Canonical fixed sizes map to their `Fixed*` shape, everything else
    /// (including empty payloads) is length-prefixed.
    pub fn for_length(len: usize) -> Self {
        match len {
            1..=13 => ObjectType::from_nibble(len as u8),
            16 => ObjectType::Fixed128,
            _ => ObjectType::LengthPrefixed,
        }
    }
}

/// Field tag containing field index and object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    pub index: u32,
    pub object_type: ObjectType,
}

impl FieldTag {
    /// Creates a new field tag.
    pub fn new(index: u32, object_type: ObjectType) -> Self {
        Self { index, object_type }
    }

    /// Encodes the field tag to a u32, validating the index.
    pub fn encode(&self) -> Result<u32> {
        if self.index == 0 || self.index >= MAX_FIELD_INDEX {
            return Err(Error::InvalidFieldIndex(self.index));
        }
        Ok((self.index << 4) | (self.object_type as u32))
    }

    /// Decodes a u32 to a field tag.
    pub fn decode(value: u32) -> Self {
        Self {
            index: value >> 4,
            object_type: ObjectType::from_nibble((value & 0x0f) as u8),
        }
    }
}

/// Byte order of fixed-width payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Endian {
    Big = 0,
    #[default]
    Little = 1,
}

impl Endian {
    /// Converts a u8 to an Endian.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Endian::Big),
            1 => Some(Endian::Little),
            _ => None,
        }
    }
}

/// Character set used for string payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Encoding {
    /// UTF-16 code units in the writer's byte order.
    Unicode = 0,
    /// 7-bit ASCII; other characters become `?`.
    Ascii = 1,
    #[default]
    Utf8 = 2,
}

impl Encoding {
    /// Converts a u8 to an Encoding.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Encoding::Unicode),
            1 => Some(Encoding::Ascii),
            2 => Some(Encoding::Utf8),
            _ => None,
        }
    }
}

/// Packs the global config byte: encoding in the high nibble, byte order in
/// the low nibble.
#[inline]
pub fn encode_config(encoding: Encoding, endian: Endian) -> u8 {
    ((encoding as u8) << 4) | (endian as u8)
}

/// Unpacks the global config byte.
pub fn decode_config(config: u8) -> Result<(Encoding, Endian)> {
    let encoding = Encoding::from_u8(config >> 4).ok_or(Error::InvalidConfig(config))?;
    let endian = Endian::from_u8(config & 0x0f).ok_or(Error::InvalidConfig(config))?;
    Ok((encoding, endian))
}
