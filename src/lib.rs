//! Accelbuffer - compact tagged binary serialization runtime for Rust
//!
//! Every encoded value is a sequence of field records. A record is a tag
//! (`index << 4 | object_type`, written as a variant integer) followed by a
//! payload whose size the object type alone determines, so readers can skip
//! fields they do not know. Fields holding their type's default value are
//! left out entirely.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use accelbuffer::{Reader, Result, Serializable, SharedSerializer, TypeSerializer, Writer};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! struct UserSerializer;
//!
//! impl TypeSerializer<User> for UserSerializer {
//!     fn serialize(&self, value: &User, writer: &mut Writer<'_>) -> Result<()> {
//!         writer.write_u32(1, value.id)?;
//!         writer.write_str(2, &value.name)?;
//!         writer.write_value(3, &value.tags)
//!     }
//!
//!     fn deserialize(&self, reader: &mut Reader<'_>) -> Result<User> {
//!         let mut user = User::default();
//!         while let Some(index) = reader.next_index()? {
//!             match index {
//!                 1 => user.id = reader.read_u32()?,
//!                 2 => user.name = reader.read_str()?,
//!                 3 => user.tags = reader.read_value()?,
//!                 _ => reader.skip_next()?,
//!             }
//!         }
//!         Ok(user)
//!     }
//! }
//!
//! impl Serializable for User {
//!     fn generated_serializer() -> Option<SharedSerializer<Self>> {
//!         Some(Arc::new(UserSerializer))
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let user = User {
//!         id: 7,
//!         name: "ferris".into(),
//!         tags: vec!["crab".into()],
//!     };
//!     let bytes = accelbuffer::serialize(&user)?;
//!     assert_eq!(accelbuffer::deserialize::<User>(&bytes)?, user);
//!     Ok(())
//! }
//! ```

mod collection;
mod error;
mod memory;
mod primitive;
mod reader;
mod registry;
mod serializer;
pub mod text;
mod types;
pub mod varint;
mod well_known;
mod writer;

pub use collection::{
    ArraySerializer, Mapping, MappingSerializer, OptionSerializer, PairSerializer, Sequence,
    SequenceSerializer,
};
pub use error::{Error, Result};
pub use memory::Allocator;
pub use primitive::PrimitiveSerializer;
pub use reader::{Reader, DEFAULT_MAX_ELEMENTS};
pub use registry::{
    CacheEntry, Registry, Serializable, SerializerSource, SharedSerializer, TypeSerializer,
    DEFAULT_MEMORY_SIZE,
};
pub use serializer::{Serializer, Settings};
pub use types::{
    decode_config, encode_config, Encoding, Endian, FieldTag, ObjectType, MAX_FIELD_INDEX,
    MAX_TAG_BYTES,
};
pub use varint::{VInt, VUInt};
pub use well_known::{DurationSerializer, UuidSerializer};
pub use writer::Writer;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encodes `value` with the global registry and default settings.
pub fn serialize<T: Serializable>(value: &T) -> Result<Vec<u8>> {
    Serializer::new(Registry::global()).serialize(value)
}

/// Decodes a `T` with the global registry and default settings.
pub fn deserialize<T: Serializable>(bytes: &[u8]) -> Result<T> {
    Serializer::new(Registry::global()).deserialize(bytes)
}
