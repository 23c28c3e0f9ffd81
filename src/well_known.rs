//! Built-in codecs for well-known value types.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::registry::{Serializable, SharedSerializer, TypeSerializer};
use crate::writer::Writer;

/// Codec for [`Uuid`]: the 128-bit value at index 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSerializer;

impl TypeSerializer<Uuid> for UuidSerializer {
    fn serialize(&self, value: &Uuid, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u128(1, value.as_u128())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Uuid> {
        let mut value = Uuid::nil();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => value = Uuid::from_u128(reader.read_u128()?),
                _ => reader.skip_next()?,
            }
        }
        Ok(value)
    }

    fn approximate_memory_size(&self) -> Option<usize> {
        Some(16)
    }
}

impl Serializable for Uuid {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(UuidSerializer);
        Some(serializer)
    }
}

/// Codec for [`Duration`]: whole seconds at index 1, subsecond nanoseconds at
/// index 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationSerializer;

impl TypeSerializer<Duration> for DurationSerializer {
    fn serialize(&self, value: &Duration, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u64(1, value.as_secs())?;
        writer.write_u32(2, value.subsec_nanos())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Duration> {
        let (mut secs, mut nanos) = (0, 0);
        while let Some(index) = reader.next_index()? {
            match index {
                1 => secs = reader.read_u64()?,
                2 => nanos = reader.read_u32()?,
                _ => reader.skip_next()?,
            }
        }
        if nanos >= 1_000_000_000 {
            return Err(Error::custom(format!("{} nanoseconds out of range", nanos)));
        }
        Ok(Duration::new(secs, nanos))
    }

    fn approximate_memory_size(&self) -> Option<usize> {
        Some(12)
    }
}

impl Serializable for Duration {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(DurationSerializer);
        Some(serializer)
    }
}
