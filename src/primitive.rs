//! Built-in codecs for primitive types.
//!
//! Every codec here is inline: it writes exactly one record under the
//! caller's field index.

use std::sync::Arc;

use crate::error::Result;
use crate::reader::Reader;
use crate::registry::{Serializable, SharedSerializer, TypeSerializer};
use crate::varint::{VInt, VUInt};
use crate::writer::Writer;

/// Inline codec shared by every primitive type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveSerializer;

macro_rules! primitive {
    ($($ty:ty => $write:ident, $read:ident, $size:expr;)*) => {
        $(
            impl TypeSerializer<$ty> for PrimitiveSerializer {
                fn serialize(&self, value: &$ty, writer: &mut Writer<'_>) -> Result<()> {
                    writer.$write(writer.field_index(), *value)
                }

                fn deserialize(&self, reader: &mut Reader<'_>) -> Result<$ty> {
                    reader.$read()
                }

                fn is_builtin(&self) -> bool {
                    true
                }

                fn approximate_memory_size(&self) -> Option<usize> {
                    Some($size)
                }
            }

            impl Serializable for $ty {
                fn builtin_serializer() -> Option<SharedSerializer<Self>> {
                    let serializer: SharedSerializer<Self> = Arc::new(PrimitiveSerializer);
                    Some(serializer)
                }
            }
        )*
    };
}

primitive! {
    bool => write_bool, read_bool, 1;
    i8 => write_i8, read_i8, 1;
    u8 => write_u8, read_u8, 1;
    i16 => write_i16, read_i16, 2;
    u16 => write_u16, read_u16, 2;
    i32 => write_i32, read_i32, 4;
    u32 => write_u32, read_u32, 4;
    i64 => write_i64, read_i64, 8;
    u64 => write_u64, read_u64, 8;
    i128 => write_i128, read_i128, 16;
    u128 => write_u128, read_u128, 16;
    isize => write_isize, read_isize, 8;
    usize => write_usize, read_usize, 8;
    f32 => write_f32, read_f32, 4;
    f64 => write_f64, read_f64, 8;
    char => write_char, read_char, 4;
    VInt => write_vint, read_vint, 8;
    VUInt => write_vuint, read_vuint, 8;
}

impl TypeSerializer<String> for PrimitiveSerializer {
    fn serialize(&self, value: &String, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_str(writer.field_index(), value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<String> {
        reader.read_str()
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

impl Serializable for String {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(PrimitiveSerializer);
        Some(serializer)
    }
}
