//! Accelbuffer encoder.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::memory::Allocator;
use crate::registry::{Registry, Serializable};
use crate::text;
use crate::types::{
    encode_config, Encoding, Endian, FieldTag, ObjectType, MAX_TAG_BYTES, TOP_LEVEL_INDEX,
};
use crate::varint::{encode_u32, significant_bytes, zigzag_encode_64, VInt, VUInt};

macro_rules! fixed_writers {
    ($($(#[$doc:meta])* $name:ident($ty:ty) => $object_type:ident, $len:expr, $write:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, index: u32, value: $ty) -> Result<()> {
                if value == 0 {
                    return Ok(());
                }
                let endian = self.endian;
                let dst = self.fixed(index, ObjectType::$object_type, $len)?;
                match endian {
                    Endian::Little => LittleEndian::$write(dst, value),
                    Endian::Big => BigEndian::$write(dst, value),
                }
                Ok(())
            }
        )*
    };
}

/// Writer emits tagged field records into a borrowed [`Allocator`].
///
/// Every `write_*` call takes the field index first. Values equal to their
/// type's default are omitted entirely; a reader fills them back in as
/// defaults.
pub struct Writer<'a> {
    registry: &'a Registry,
    memory: &'a mut Allocator,
    encoding: Encoding,
    endian: Endian,
    byte_count: usize,
    index: u32,
}

impl<'a> Writer<'a> {
    /// Creates a writer that appends to `memory` starting at offset zero.
    pub fn new(
        registry: &'a Registry,
        memory: &'a mut Allocator,
        encoding: Encoding,
        endian: Endian,
    ) -> Self {
        Self {
            registry,
            memory,
            encoding,
            endian,
            byte_count: 0,
            index: TOP_LEVEL_INDEX,
        }
    }

    /// Returns the registry used to resolve nested values.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Returns the configured text encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the configured byte order.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Returns the field index a built-in codec should write under.
    pub fn field_index(&self) -> u32 {
        self.index
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.byte_count
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.byte_count == 0
    }

    /// Returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.memory.as_slice()[..self.byte_count]
    }

    /// Writes the global config byte.
    pub(crate) fn write_global_config(&mut self) -> Result<()> {
        let config = encode_config(self.encoding, self.endian);
        self.reserve(1)?[0] = config;
        Ok(())
    }

    /// Writes a field tag.
    pub fn write_tag(&mut self, index: u32, object_type: ObjectType) -> Result<()> {
        let tag = FieldTag::new(index, object_type).encode()?;
        self.write_varint(tag)
    }

    /// Writes a bool field. Only `true` reaches the wire.
    pub fn write_bool(&mut self, index: u32, value: bool) -> Result<()> {
        if !value {
            return Ok(());
        }
        self.fixed(index, ObjectType::Fixed8, 1)?[0] = 1;
        Ok(())
    }

    /// Writes an i8 field.
    pub fn write_i8(&mut self, index: u32, value: i8) -> Result<()> {
        self.write_u8(index, value as u8)
    }

    /// Writes a u8 field.
    pub fn write_u8(&mut self, index: u32, value: u8) -> Result<()> {
        if value == 0 {
            return Ok(());
        }
        self.fixed(index, ObjectType::Fixed8, 1)?[0] = value;
        Ok(())
    }

    fixed_writers! {
        /// Writes an i16 field.
        write_i16(i16) => Fixed16, 2, write_i16;
        /// Writes a u16 field.
        write_u16(u16) => Fixed16, 2, write_u16;
        /// Writes an i32 field.
        write_i32(i32) => Fixed32, 4, write_i32;
        /// Writes a u32 field.
        write_u32(u32) => Fixed32, 4, write_u32;
        /// Writes an i64 field.
        write_i64(i64) => Fixed64, 8, write_i64;
        /// Writes a u64 field.
        write_u64(u64) => Fixed64, 8, write_u64;
        /// Writes an i128 field.
        write_i128(i128) => Fixed128, 16, write_i128;
        /// Writes a u128 field.
        write_u128(u128) => Fixed128, 16, write_u128;
    }

    /// Writes an isize field as a 64-bit payload.
    pub fn write_isize(&mut self, index: u32, value: isize) -> Result<()> {
        self.write_i64(index, value as i64)
    }

    /// Writes a usize field as a 64-bit payload.
    pub fn write_usize(&mut self, index: u32, value: usize) -> Result<()> {
        self.write_u64(index, value as u64)
    }

    /// Writes an f32 field. Any value other than `+0.0` is written, so `-0.0`
    /// and NaN payloads survive.
    pub fn write_f32(&mut self, index: u32, value: f32) -> Result<()> {
        self.write_u32(index, value.to_bits())
    }

    /// Writes an f64 field.
    pub fn write_f64(&mut self, index: u32, value: f64) -> Result<()> {
        self.write_u64(index, value.to_bits())
    }

    /// Writes a char field as its 32-bit scalar value.
    pub fn write_char(&mut self, index: u32, value: char) -> Result<()> {
        self.write_u32(index, value as u32)
    }

    /// Writes a dynamic-width unsigned integer.
    ///
    /// The payload is the value's significant low-order bytes and the object
    /// type records how many there are.
    pub fn write_vuint(&mut self, index: u32, value: VUInt) -> Result<()> {
        self.write_dynamic(index, value.0)
    }

    /// Writes a dynamic-width signed integer, zigzag-mapped first.
    pub fn write_vint(&mut self, index: u32, value: VInt) -> Result<()> {
        self.write_dynamic(index, zigzag_encode_64(value.0))
    }

    /// Writes a string field in the configured text encoding. Empty strings
    /// are omitted.
    pub fn write_str(&mut self, index: u32, value: &str) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        let len = text::encoded_len(self.encoding, value);
        self.write_payload_header(index, len)?;
        let (encoding, endian) = (self.encoding, self.endian);
        let dst = self.reserve(len)?;
        text::encode_into(encoding, endian, value, dst);
        Ok(())
    }

    /// Writes a raw byte blob. Empty blobs are omitted.
    pub fn write_bytes(&mut self, index: u32, value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.write_payload_header(index, value.len())?;
        self.reserve(value.len())?.copy_from_slice(value);
        Ok(())
    }

    /// Writes any value the registry can resolve.
    ///
    /// Built-in codecs write inline under `index`. Other codecs write into a
    /// scratch buffer sized by the type's memory hint, and the result is
    /// copied in as one record. A nested value that encodes to nothing is
    /// omitted like any other default.
    pub fn write_value<T: Serializable>(&mut self, index: u32, value: &T) -> Result<()> {
        let entry = self.registry.entry::<T>()?;
        let serializer = entry.serializer();

        if serializer.is_builtin() {
            let outer = std::mem::replace(&mut self.index, index);
            let result = serializer.serialize(value, self);
            self.index = outer;
            return result;
        }

        let mut scratch = Allocator::with_capacity(entry.memory_size())?;
        let len = {
            let mut nested = Writer::new(self.registry, &mut scratch, self.encoding, self.endian);
            serializer.serialize(value, &mut nested)?;
            nested.len()
        };
        if len == 0 {
            return Ok(());
        }

        self.write_payload_header(index, len)?;
        self.reserve(len)?.copy_from_slice(&scratch.as_slice()[..len]);
        Ok(())
    }

    fn write_dynamic(&mut self, index: u32, raw: u64) -> Result<()> {
        let len = significant_bytes(raw);
        if len == 0 {
            return Ok(());
        }
        let endian = self.endian;
        let dst = self.fixed(index, ObjectType::from_nibble(len as u8), len)?;
        match endian {
            Endian::Little => LittleEndian::write_uint(dst, raw, len),
            Endian::Big => BigEndian::write_uint(dst, raw, len),
        }
        Ok(())
    }

    /// Writes a tag and the length prefix its object type calls for.
    fn write_payload_header(&mut self, index: u32, len: usize) -> Result<()> {
        let object_type = ObjectType::for_length(len);
        self.write_tag(index, object_type)?;
        if object_type == ObjectType::LengthPrefixed {
            let prefix = u32::try_from(len).map_err(|_| Error::PayloadTooLarge(len))?;
            self.write_varint(prefix)?;
        }
        Ok(())
    }

    fn write_varint(&mut self, value: u32) -> Result<()> {
        let mut buf = [0u8; MAX_TAG_BYTES];
        let n = encode_u32(value, &mut buf);
        self.reserve(n)?.copy_from_slice(&buf[..n]);
        Ok(())
    }

    /// Writes a tag and reserves its fixed payload.
    fn fixed(&mut self, index: u32, object_type: ObjectType, len: usize) -> Result<&mut [u8]> {
        self.write_tag(index, object_type)?;
        self.reserve(len)
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        let start = self.byte_count;
        let end = start
            .checked_add(n)
            .ok_or_else(|| Error::buffer_overflow(n, usize::MAX - start))?;
        let view = self.memory.acquire(end, start)?;
        self.byte_count = end;
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(endian: Endian, f: impl FnOnce(&mut Writer<'_>) -> Result<()>) -> Vec<u8> {
        let registry = Registry::new();
        let mut memory = Allocator::new();
        let mut writer = Writer::new(&registry, &mut memory, Encoding::Utf8, endian);
        f(&mut writer).unwrap();
        writer.as_bytes().to_vec()
    }

    #[test]
    fn test_write_defaults_are_omitted() {
        let bytes = encode(Endian::Little, |w| {
            w.write_bool(1, false)?;
            w.write_u8(2, 0)?;
            w.write_i32(3, 0)?;
            w.write_f64(4, 0.0)?;
            w.write_char(5, '\0')?;
            w.write_vint(6, VInt(0))?;
            w.write_str(7, "")?;
            w.write_bytes(8, &[])
        });
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_write_negative_zero_is_kept() {
        let bytes = encode(Endian::Big, |w| w.write_f32(1, -0.0));
        assert_eq!(bytes, [0x14, 0x80, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_write_fixed_byte_order() {
        assert_eq!(
            encode(Endian::Little, |w| w.write_u32(2, 0x0102_0304)),
            [0x24, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            encode(Endian::Big, |w| w.write_u32(2, 0x0102_0304)),
            [0x24, 0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(encode(Endian::Big, |w| w.write_bool(3, true)), [0x31, 0x01]);
    }

    #[test]
    fn test_write_dynamic_width() {
        assert_eq!(encode(Endian::Little, |w| w.write_vuint(1, VUInt(0x1234))), [0x12, 0x34, 0x12]);
        assert_eq!(encode(Endian::Big, |w| w.write_vuint(1, VUInt(0x1234))), [0x12, 0x12, 0x34]);
        // zigzag(-1) = 1
        assert_eq!(encode(Endian::Little, |w| w.write_vint(1, VInt(-1))), [0x11, 0x01]);
        assert_eq!(
            encode(Endian::Little, |w| w.write_vuint(1, VUInt(u64::MAX))),
            [0x18, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_write_length_prefixed() {
        let value = "x".repeat(14);
        let bytes = encode(Endian::Little, |w| w.write_str(1, &value));
        assert_eq!(&bytes[..2], &[0x1f, 14]);
        assert_eq!(bytes.len(), 16);

        let bytes = encode(Endian::Little, |w| w.write_bytes(1, &[7; 16]));
        assert_eq!(bytes[0], 0x1e);
        assert_eq!(bytes.len(), 17);
    }

    #[test]
    fn test_write_invalid_index() {
        let registry = Registry::new();
        let mut memory = Allocator::new();
        let mut writer = Writer::new(&registry, &mut memory, Encoding::Utf8, Endian::Little);
        assert!(matches!(writer.write_u8(0, 1), Err(Error::InvalidFieldIndex(0))));
        assert!(matches!(
            writer.write_u8(1 << 28, 1),
            Err(Error::InvalidFieldIndex(_))
        ));
    }

    #[test]
    fn test_write_value_builtin_is_inline() {
        let bytes = encode(Endian::Little, |w| {
            w.write_value(3, &7u16)?;
            assert_eq!(w.field_index(), TOP_LEVEL_INDEX);
            w.write_value(4, &String::from("ok"))
        });
        assert_eq!(bytes, [0x32, 0x07, 0x00, 0x42, b'o', b'k']);
    }

    #[test]
    fn test_write_value_nested() {
        let bytes = encode(Endian::Little, |w| w.write_value(2, &vec![5u8, 6u8]));
        // count (1, Fixed8, 2), element 0 at 2, element 1 at 3
        assert_eq!(bytes, [0x26, 0x11, 0x02, 0x21, 0x05, 0x31, 0x06]);
    }

    #[test]
    fn test_write_value_empty_nested_is_omitted() {
        let bytes = encode(Endian::Little, |w| w.write_value(2, &Vec::<u8>::new()));
        assert!(bytes.is_empty());
    }
}
