//! Process-wide codec registry.
//!
//! Each closed type `T` is resolved once to a [`TypeSerializer<T>`] and cached
//! together with its memory-size hint and a long-lived [`Allocator`]. Cache
//! entries are never replaced once published.
//!
//! Resolution order, first match wins:
//!
//! 1. an explicit binding added with [`Registry::add_binding`]
//! 2. the type's built-in codec ([`Serializable::builtin_serializer`])
//! 3. a codec declared by the type ([`Serializable::declared_serializer`])
//! 4. a generated codec ([`Serializable::generated_serializer`])

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::Allocator;
use crate::reader::Reader;
use crate::types::MAX_TAG_BYTES;
use crate::writer::Writer;

/// Buffer hint used when neither the codec nor the type declares one.
pub const DEFAULT_MEMORY_SIZE: usize = 160;

/// Stateless codec for one closed type.
///
/// Built-in codecs (`is_builtin() == true`) write a single record inline under
/// the caller's field index, see [`Writer::field_index`]. All other codecs
/// write a complete field stream of their own, which the caller nests as one
/// record.
pub trait TypeSerializer<T>: Send + Sync + 'static {
    /// Writes `value` into `writer`.
    fn serialize(&self, value: &T, writer: &mut Writer<'_>) -> Result<()>;

    /// Reads a value from `reader`.
    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<T>;

    /// Whether the codec writes inline under the caller's field index.
    fn is_builtin(&self) -> bool {
        false
    }

    /// Expected encoded size in bytes, used to presize buffers.
    fn approximate_memory_size(&self) -> Option<usize> {
        None
    }
}

/// Shared handle to a type's codec.
pub type SharedSerializer<T> = Arc<dyn TypeSerializer<T>>;

/// A type the registry can resolve a codec for.
///
/// Absent fields decode as `Default::default()`, so every serializable type
/// has a default value. Implementations override the hook matching where
/// their codec comes from; the rest keep returning `None`.
pub trait Serializable: Default + Sized + 'static {
    /// Codec shipped with this crate.
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        None
    }

    /// Codec explicitly declared by the type's author.
    fn declared_serializer() -> Option<SharedSerializer<Self>> {
        None
    }

    /// Codec emitted by a schema compiler.
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        None
    }

    /// Expected encoded size in bytes.
    fn approximate_memory_size() -> Option<usize> {
        None
    }
}

/// Cached state for one closed type.
pub struct CacheEntry<T> {
    serializer: SharedSerializer<T>,
    source: SerializerSource,
    memory_size: usize,
    allocator: Arc<Mutex<Allocator>>,
}

impl<T> CacheEntry<T> {
    /// Returns the resolved codec.
    pub fn serializer(&self) -> &SharedSerializer<T> {
        &self.serializer
    }

    /// Returns where the codec was resolved from.
    pub fn source(&self) -> SerializerSource {
        self.source
    }

    /// Returns the buffer presize hint, tag headroom included.
    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    /// Returns the long-lived buffer for top-level sessions of this type.
    ///
    /// Hold the lock for the whole session.
    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }
}

/// Where a type's codec came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerSource {
    /// [`Registry::add_binding`]
    Binding,
    /// [`Serializable::builtin_serializer`]
    Builtin,
    /// [`Serializable::declared_serializer`]
    Declared,
    /// [`Serializable::generated_serializer`]
    Generated,
}

struct Slot {
    entry: Arc<dyn Any + Send + Sync>,
    allocator: Arc<Mutex<Allocator>>,
}

/// Registry of resolved codecs, keyed by type.
///
/// Thread-safe: concurrent first access to the same type publishes exactly
/// one entry, and every caller observes that entry.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<TypeId, Slot>>,
    bindings: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Binds `serializer` as the codec for `T`, overriding every other source.
    ///
    /// Bindings must be added before `T` is first used.
    pub fn add_binding<T: Serializable>(&self, serializer: SharedSerializer<T>) -> Result<()> {
        let id = TypeId::of::<T>();
        // Held across the insert so no entry for T can be published meanwhile.
        let entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(Error::BindingAfterResolution(type_name::<T>()));
        }

        self.bindings.write().insert(id, Box::new(serializer));
        debug!(type_name = type_name::<T>(), "added serializer binding");
        Ok(())
    }

    /// Returns true if an explicit binding exists for `T`.
    pub fn has_binding<T: Serializable>(&self) -> bool {
        self.bindings.read().contains_key(&TypeId::of::<T>())
    }

    /// Returns true if `T` has already been resolved.
    pub fn is_resolved<T: Serializable>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    /// Resolves `T` eagerly.
    pub fn prepare<T: Serializable>(&self) -> Result<()> {
        self.entry::<T>().map(|_| ())
    }

    /// Returns the cache entry for `T`, resolving it on first use.
    pub fn entry<T: Serializable>(&self) -> Result<Arc<CacheEntry<T>>> {
        let id = TypeId::of::<T>();

        // Fast path: already resolved (read lock)
        if let Some(slot) = self.entries.read().get(&id) {
            return downcast(&slot.entry);
        }

        // Resolve without holding any lock; codecs may resolve their element
        // types while being constructed.
        let resolved = self.resolve::<T>();

        // Slow path: publish with write lock, first writer wins. A binding
        // added while resolving still takes precedence.
        let mut entries = self.entries.write();
        if let Some(slot) = entries.get(&id) {
            return downcast(&slot.entry);
        }
        let (serializer, source) = match self.binding::<T>() {
            Some(bound) => (bound, SerializerSource::Binding),
            None => resolved?,
        };
        let slot = entries.entry(id).or_insert_with(|| {
            let memory_size = serializer
                .approximate_memory_size()
                .or_else(T::approximate_memory_size)
                .map_or(DEFAULT_MEMORY_SIZE, |size| size.saturating_add(MAX_TAG_BYTES));
            debug!(
                type_name = type_name::<T>(),
                ?source,
                memory_size,
                "resolved serializer"
            );
            let allocator = Arc::new(Mutex::new(Allocator::new()));
            let entry = CacheEntry {
                serializer,
                source,
                memory_size,
                allocator: Arc::clone(&allocator),
            };
            Slot {
                entry: Arc::new(entry),
                allocator,
            }
        });
        downcast(&slot.entry)
    }

    /// Releases every per-type buffer.
    ///
    /// Blocks until in-progress sessions finish. Entries stay resolved.
    pub fn free_memory(&self) {
        let entries = self.entries.read();
        for slot in entries.values() {
            slot.allocator.lock().free();
        }
        debug!(count = entries.len(), "freed serializer buffers");
    }

    /// Forgets every entry and binding.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.bindings.write().clear();
    }

    /// Returns the number of resolved types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no type has been resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn binding<T: Serializable>(&self) -> Option<SharedSerializer<T>> {
        self.bindings
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|binding| binding.downcast_ref::<SharedSerializer<T>>())
            .cloned()
    }

    fn resolve<T: Serializable>(&self) -> Result<(SharedSerializer<T>, SerializerSource)> {
        self.binding::<T>()
            .map(|serializer| (serializer, SerializerSource::Binding))
            .or_else(|| T::builtin_serializer().map(|s| (s, SerializerSource::Builtin)))
            .or_else(|| T::declared_serializer().map(|s| (s, SerializerSource::Declared)))
            .or_else(|| T::generated_serializer().map(|s| (s, SerializerSource::Generated)))
            .ok_or(Error::UnsupportedType(type_name::<T>()))
    }
}

fn downcast<T: Serializable>(entry: &Arc<dyn Any + Send + Sync>) -> Result<Arc<CacheEntry<T>>> {
    Arc::clone(entry)
        .downcast::<CacheEntry<T>>()
        .map_err(|_| Error::UnsupportedType(type_name::<T>()))
}
