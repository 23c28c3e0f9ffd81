//! Top-level encode/decode entry points.

use tracing::trace;

use crate::error::{Error, Result};
use crate::reader::{Reader, DEFAULT_MAX_ELEMENTS};
use crate::registry::{Registry, Serializable};
use crate::types::{Encoding, Endian, TOP_LEVEL_INDEX};
use crate::writer::Writer;

/// Options for one encode or decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Text encoding for string payloads.
    pub encoding: Encoding,
    /// Byte order for fixed-width payloads.
    pub endian: Endian,
    /// Write (and expect) the global config byte at the start of a message.
    /// When set, decoding takes encoding and byte order from the message.
    pub header: bool,
    /// Largest collection count accepted while decoding.
    pub max_elements: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            endian: Endian::Little,
            header: true,
            max_elements: DEFAULT_MAX_ELEMENTS,
        }
    }
}

impl Settings {
    /// Sets the text encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the byte order.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Enables or disables the config byte.
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Sets the largest collection count accepted while decoding.
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }
}

/// Encodes and decodes whole values against a [`Registry`].
///
/// Encoding a `T` locks `T`'s long-lived buffer for the whole session, so
/// concurrent encodes of the same type run one at a time while different
/// types never contend. Decoding takes no lock.
#[derive(Clone, Copy)]
pub struct Serializer<'r> {
    registry: &'r Registry,
    settings: Settings,
}

impl<'r> Serializer<'r> {
    /// Creates a serializer with default settings.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_settings(registry, Settings::default())
    }

    /// Creates a serializer with the given settings.
    pub fn with_settings(registry: &'r Registry, settings: Settings) -> Self {
        Self { registry, settings }
    }

    /// Returns the settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Encodes `value` into a new byte vector.
    pub fn serialize<T: Serializable>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode(value, |bytes| Ok(bytes.to_vec()))
    }

    /// Encodes `value` into `out` and returns the number of bytes written.
    pub fn serialize_into<T: Serializable>(&self, value: &T, out: &mut [u8]) -> Result<usize> {
        self.encode(value, |bytes| {
            let available = out.len();
            let dst = out
                .get_mut(..bytes.len())
                .ok_or_else(|| Error::buffer_overflow(bytes.len(), available))?;
            dst.copy_from_slice(bytes);
            Ok(bytes.len())
        })
    }

    /// Decodes a `T` from `bytes`. Empty input decodes to `T::default()`.
    ///
    /// A built-in `T` is read from the record at index 1; other records are
    /// skipped, and without one the result is `T::default()`.
    pub fn deserialize<T: Serializable>(&self, bytes: &[u8]) -> Result<T> {
        if bytes.is_empty() {
            return Ok(T::default());
        }

        let entry = self.registry.entry::<T>()?;
        let mut reader = Reader::new(
            self.registry,
            bytes,
            self.settings.encoding,
            self.settings.endian,
        )
        .with_max_elements(self.settings.max_elements);
        if self.settings.header {
            reader.read_global_config()?;
        }

        let serializer = entry.serializer();
        if !serializer.is_builtin() {
            return serializer.deserialize(&mut reader);
        }

        let mut value = T::default();
        while let Some(index) = reader.next_index()? {
            if index == TOP_LEVEL_INDEX {
                value = serializer.deserialize(&mut reader)?;
            } else {
                reader.skip_next()?;
            }
        }
        Ok(value)
    }

    fn encode<T, R>(&self, value: &T, finish: impl FnOnce(&[u8]) -> Result<R>) -> Result<R>
    where
        T: Serializable,
    {
        let entry = self.registry.entry::<T>()?;
        let mut memory = entry.allocator().lock();
        memory.acquire(entry.memory_size(), 0)?;

        let mut writer = Writer::new(
            self.registry,
            &mut memory,
            self.settings.encoding,
            self.settings.endian,
        );
        if self.settings.header {
            writer.write_global_config()?;
        }
        entry.serializer().serialize(value, &mut writer)?;
        trace!(
            type_name = std::any::type_name::<T>(),
            len = writer.len(),
            "encoded value"
        );
        finish(writer.as_bytes())
    }
}
