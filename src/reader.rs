//! Accelbuffer decoder.

use std::any::type_name;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::registry::{Registry, Serializable};
use crate::text;
use crate::types::{decode_config, Encoding, Endian, FieldTag, ObjectType};
use crate::varint::{decode_u32, zigzag_decode_64, VInt, VUInt};

/// Largest collection count a reader accepts unless configured otherwise.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 20;

macro_rules! fixed_readers {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty => $object_type:ident, $len:expr, $read:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ty> {
                let endian = self.endian;
                let src = self.fixed(ObjectType::$object_type, $len, stringify!($ty))?;
                Ok(match endian {
                    Endian::Little => LittleEndian::$read(src),
                    Endian::Big => BigEndian::$read(src),
                })
            }
        )*
    };
}

/// Reader walks the field records of one encoded value.
///
/// The usual loop is [`next_index`](Self::next_index) followed by a typed
/// read for known indices and [`skip_next`](Self::skip_next) for the rest.
/// A reader only borrows its input, so any number of readers can run over
/// the same bytes concurrently.
pub struct Reader<'a> {
    registry: &'a Registry,
    buffer: &'a [u8],
    pos: usize,
    encoding: Encoding,
    endian: Endian,
    tag: u32,
    max_elements: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `buffer`.
    pub fn new(registry: &'a Registry, buffer: &'a [u8], encoding: Encoding, endian: Endian) -> Self {
        Self {
            registry,
            buffer,
            pos: 0,
            encoding,
            endian,
            tag: 0,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }

    /// Sets the largest collection count this reader and its nested readers
    /// accept.
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Returns the registry used to resolve nested values.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Returns the text encoding in effect.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the byte order in effect.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Returns the largest accepted collection count.
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Reads the global config byte and adopts its settings.
    pub(crate) fn read_global_config(&mut self) -> Result<()> {
        let config = self.take(1)?[0];
        let (encoding, endian) = decode_config(config)?;
        self.encoding = encoding;
        self.endian = endian;
        Ok(())
    }

    /// Returns true if another record follows, and caches its tag.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.pos >= self.buffer.len() {
            self.tag = 0;
            return Ok(false);
        }
        self.tag = self.read_varint()?;
        Ok(true)
    }

    /// Advances to the next record and returns its field index.
    pub fn next_index(&mut self) -> Result<Option<u32>> {
        Ok(if self.has_next()? { Some(self.index()) } else { None })
    }

    /// Returns the field index of the current record.
    pub fn index(&self) -> u32 {
        self.tag >> 4
    }

    /// Returns the object type of the current record.
    pub fn object_type(&self) -> ObjectType {
        FieldTag::decode(self.tag).object_type
    }

    /// Returns the current record's tag.
    pub fn tag(&self) -> FieldTag {
        FieldTag::decode(self.tag)
    }

    /// Skips the current record's payload using only its object type.
    pub fn skip_next(&mut self) -> Result<()> {
        let object_type = self.object_type();
        if object_type == ObjectType::Missing {
            return Err(Error::InvalidObjectType(object_type));
        }
        let len = self.payload_len("skipped field")?;
        self.take(len)?;
        Ok(())
    }

    /// Reads a bool. Only a payload of `1` is true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.fixed(ObjectType::Fixed8, 1, "bool")?[0] == 1)
    }

    /// Reads an i8.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.fixed(ObjectType::Fixed8, 1, "i8")?[0] as i8)
    }

    /// Reads a u8.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.fixed(ObjectType::Fixed8, 1, "u8")?[0])
    }

    fixed_readers! {
        /// Reads an i16.
        read_i16 -> i16 => Fixed16, 2, read_i16;
        /// Reads a u16.
        read_u16 -> u16 => Fixed16, 2, read_u16;
        /// Reads an i32.
        read_i32 -> i32 => Fixed32, 4, read_i32;
        /// Reads a u32.
        read_u32 -> u32 => Fixed32, 4, read_u32;
        /// Reads an i64.
        read_i64 -> i64 => Fixed64, 8, read_i64;
        /// Reads a u64.
        read_u64 -> u64 => Fixed64, 8, read_u64;
        /// Reads an i128.
        read_i128 -> i128 => Fixed128, 16, read_i128;
        /// Reads a u128.
        read_u128 -> u128 => Fixed128, 16, read_u128;
        /// Reads an f32.
        read_f32 -> f32 => Fixed32, 4, read_f32;
        /// Reads an f64.
        read_f64 -> f64 => Fixed64, 8, read_f64;
    }

    /// Reads an isize from its 64-bit payload.
    pub fn read_isize(&mut self) -> Result<isize> {
        let value = self.read_i64()?;
        isize::try_from(value).map_err(|_| Error::custom(format!("{} does not fit isize", value)))
    }

    /// Reads a usize from its 64-bit payload.
    pub fn read_usize(&mut self) -> Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value).map_err(|_| Error::custom(format!("{} does not fit usize", value)))
    }

    /// Reads a char, rejecting values that are not Unicode scalar values.
    pub fn read_char(&mut self) -> Result<char> {
        let value = self.read_u32()?;
        char::from_u32(value).ok_or(Error::InvalidChar(value))
    }

    /// Reads a dynamic-width unsigned integer.
    pub fn read_vuint(&mut self) -> Result<VUInt> {
        self.read_dynamic("VUInt").map(VUInt)
    }

    /// Reads a dynamic-width signed integer.
    pub fn read_vint(&mut self) -> Result<VInt> {
        self.read_dynamic("VInt").map(|raw| VInt(zigzag_decode_64(raw)))
    }

    /// Reads a string in the reader's text encoding.
    pub fn read_str(&mut self) -> Result<String> {
        let len = self.payload_len("String")?;
        let (encoding, endian) = (self.encoding, self.endian);
        text::decode(encoding, endian, self.take(len)?)
    }

    /// Reads a raw byte blob.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.payload_len("bytes")?;
        Ok(self.take(len)?.to_vec())
    }

    /// Reads any value the registry can resolve.
    ///
    /// Built-in codecs decode the current record in place. Other codecs get a
    /// sub-reader bounded to exactly the record's payload.
    pub fn read_value<T: Serializable>(&mut self) -> Result<T> {
        let entry = self.registry.entry::<T>()?;
        let serializer = entry.serializer();

        if serializer.is_builtin() {
            return serializer.deserialize(self);
        }

        let len = self.payload_len(type_name::<T>())?;
        let payload = self.take(len)?;
        let mut nested = Reader::new(self.registry, payload, self.encoding, self.endian)
            .with_max_elements(self.max_elements);
        serializer.deserialize(&mut nested)
    }

    fn read_dynamic(&mut self, target: &'static str) -> Result<u64> {
        let object_type = self.object_type();
        let len = match object_type {
            ObjectType::Fixed8
            | ObjectType::Fixed16
            | ObjectType::Fixed24
            | ObjectType::Fixed32
            | ObjectType::Fixed40
            | ObjectType::Fixed48
            | ObjectType::Fixed56
            | ObjectType::Fixed64 => object_type as usize,
            found => return Err(Error::tag_mismatch(target, found)),
        };
        let endian = self.endian;
        let src = self.take(len)?;
        Ok(match endian {
            Endian::Little => LittleEndian::read_uint(src, len),
            Endian::Big => BigEndian::read_uint(src, len),
        })
    }

    /// Returns the payload length of the current record, consuming the
    /// length prefix if there is one.
    fn payload_len(&mut self, target: &'static str) -> Result<usize> {
        match self.object_type() {
            ObjectType::Missing => Err(Error::tag_mismatch(target, ObjectType::Missing)),
            ObjectType::LengthPrefixed => Ok(self.read_varint()? as usize),
            fixed => fixed
                .fixed_len()
                .ok_or_else(|| Error::tag_mismatch(target, fixed)),
        }
    }

    /// Checks the current record's shape and takes its payload.
    fn fixed(&mut self, expected: ObjectType, len: usize, target: &'static str) -> Result<&'a [u8]> {
        let found = self.object_type();
        if found != expected {
            return Err(Error::tag_mismatch(target, found));
        }
        self.take(len)
    }

    fn read_varint(&mut self) -> Result<u32> {
        let (value, n) = decode_u32(&self.buffer[self.pos..])?;
        self.pos += n;
        Ok(value)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(Error::stream_too_short(n, remaining));
        }
        let buffer: &'a [u8] = self.buffer;
        let bytes = &buffer[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }
}
