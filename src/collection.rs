//! Built-in codecs for collections, arrays, optionals and pairs.
//!
//! Collections nest as one record. Inside it, sequences write their element
//! count at index 1 and element `i` at index `i + 2`; maps write the count at
//! index 1, key `i` at `2 + 2i` and value `i` at `3 + 2i`. Because every
//! element has its own index, default elements can be omitted like default
//! fields and still come back in place.

use std::collections::{
    btree_map, btree_set, hash_map, hash_set, linked_list, vec_deque, BTreeMap, BTreeSet, HashMap,
    HashSet, LinkedList, VecDeque,
};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::registry::{Serializable, SharedSerializer, TypeSerializer};
use crate::varint::VUInt;
use crate::writer::Writer;

const COUNT_INDEX: u32 = 1;
const FIRST_ELEMENT_INDEX: u32 = 2;

/// A collection that can be rebuilt from its items in iteration order.
pub trait Sequence: Default + 'static {
    type Item: Serializable;
    type Iter<'a>: Iterator<Item = &'a Self::Item>
    where
        Self: 'a;

    /// Returns the number of items.
    fn item_count(&self) -> usize;

    /// Iterates the items in encoding order.
    fn items(&self) -> Self::Iter<'_>;

    /// Rebuilds the collection from decoded items.
    fn from_items(items: Vec<Self::Item>) -> Self;
}

/// A key-value collection.
pub trait Mapping: Default + 'static {
    type Key: Serializable;
    type Value: Serializable;
    type Iter<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Value)>
    where
        Self: 'a;

    /// Returns the number of entries.
    fn entry_count(&self) -> usize;

    /// Iterates the entries in encoding order.
    fn entries(&self) -> Self::Iter<'_>;

    /// Rebuilds the map from decoded entries.
    fn from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Self;
}

fn position_index(position: usize, stride: usize) -> Result<u32> {
    position
        .checked_mul(stride)
        .and_then(|offset| u32::try_from(offset).ok())
        .and_then(|offset| offset.checked_add(FIRST_ELEMENT_INDEX))
        .ok_or(Error::InvalidFieldIndex(u32::MAX))
}

/// Slots reserved up front from a decoded count; the rest grow on demand.
const PRESIZE_LIMIT: usize = 64;

/// Positional element buffer for one decoded collection.
///
/// The count comes from the wire and default elements are never written, so
/// slots are only materialized as elements arrive and the tail is filled
/// with defaults when the record ends.
struct Slots<T> {
    items: Vec<T>,
    count: usize,
}

impl<T: Default> Slots<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
        }
    }

    /// Reads the element count, rejecting counts above the reader's limit.
    fn read_count(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let count = reader.read_vuint()?.0;
        let max = reader.max_elements();
        let count = usize::try_from(count)
            .ok()
            .filter(|&count| count <= max)
            .ok_or(Error::TooManyElements { count, max })?;

        self.items.truncate(count);
        let presize = count.min(PRESIZE_LIMIT).saturating_sub(self.items.len());
        self.items.try_reserve_exact(presize)?;
        self.count = count;
        Ok(())
    }

    /// Returns the slot at `position`, or `None` past the count.
    fn get_mut(&mut self, position: usize) -> Result<Option<&mut T>> {
        if position >= self.count {
            return Ok(None);
        }
        if position >= self.items.len() {
            self.items.try_reserve(position + 1 - self.items.len())?;
            self.items.resize_with(position + 1, T::default);
        }
        Ok(self.items.get_mut(position))
    }

    fn finish(mut self) -> Result<Vec<T>> {
        self.items.try_reserve_exact(self.count - self.items.len())?;
        self.items.resize_with(self.count, T::default);
        Ok(self.items)
    }
}

/// Codec for any [`Sequence`].
pub struct SequenceSerializer<S>(PhantomData<fn() -> S>);

impl<S> SequenceSerializer<S> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<S> Default for SequenceSerializer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sequence> TypeSerializer<S> for SequenceSerializer<S> {
    fn serialize(&self, value: &S, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_vuint(COUNT_INDEX, VUInt(value.item_count() as u64))?;
        for (position, item) in value.items().enumerate() {
            writer.write_value(position_index(position, 1)?, item)?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<S> {
        let mut items: Slots<S::Item> = Slots::new();
        while let Some(index) = reader.next_index()? {
            if index == COUNT_INDEX {
                items.read_count(reader)?;
                continue;
            }
            let slot = match index.checked_sub(FIRST_ELEMENT_INDEX) {
                Some(position) => items.get_mut(position as usize)?,
                None => None,
            };
            match slot {
                Some(slot) => *slot = reader.read_value()?,
                None => reader.skip_next()?,
            }
        }
        Ok(S::from_items(items.finish()?))
    }
}

/// Codec for any [`Mapping`].
pub struct MappingSerializer<M>(PhantomData<fn() -> M>);

impl<M> MappingSerializer<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<M> Default for MappingSerializer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Mapping> TypeSerializer<M> for MappingSerializer<M> {
    fn serialize(&self, value: &M, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_vuint(COUNT_INDEX, VUInt(value.entry_count() as u64))?;
        for (position, (key, item)) in value.entries().enumerate() {
            let key_index = position_index(position, 2)?;
            writer.write_value(key_index, key)?;
            writer.write_value(key_index + 1, item)?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<M> {
        let mut entries: Slots<(M::Key, M::Value)> = Slots::new();
        while let Some(index) = reader.next_index()? {
            if index == COUNT_INDEX {
                entries.read_count(reader)?;
                continue;
            }
            let Some(offset) = index.checked_sub(FIRST_ELEMENT_INDEX) else {
                reader.skip_next()?;
                continue;
            };
            match entries.get_mut((offset / 2) as usize)? {
                Some((key, _)) if offset % 2 == 0 => *key = reader.read_value()?,
                Some((_, value)) => *value = reader.read_value()?,
                None => reader.skip_next()?,
            }
        }
        Ok(M::from_entries(entries.finish()?))
    }
}

impl<T: Serializable> Sequence for Vec<T> {
    type Item = T;
    type Iter<'a> = std::slice::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items
    }
}

impl<T: Serializable> Sequence for Box<[T]> {
    type Item = T;
    type Iter<'a> = std::slice::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_boxed_slice()
    }
}

impl<T: Serializable> Sequence for VecDeque<T> {
    type Item = T;
    type Iter<'a> = vec_deque::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into()
    }
}

impl<T: Serializable> Sequence for LinkedList<T> {
    type Item = T;
    type Iter<'a> = linked_list::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Serializable + Ord> Sequence for BTreeSet<T> {
    type Item = T;
    type Iter<'a> = btree_set::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T, S> Sequence for HashSet<T, S>
where
    T: Serializable + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    type Item = T;
    type Iter<'a> = hash_set::Iter<'a, T>;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn items(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_items(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<K, V, S> Mapping for HashMap<K, V, S>
where
    K: Serializable + Eq + Hash,
    V: Serializable,
    S: BuildHasher + Default + 'static,
{
    type Key = K;
    type Value = V;
    type Iter<'a> = hash_map::Iter<'a, K, V>;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_entries(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Serializable + Ord, V: Serializable> Mapping for BTreeMap<K, V> {
    type Key = K;
    type Value = V;
    type Iter<'a> = btree_map::Iter<'a, K, V>;

    fn entry_count(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> Self::Iter<'_> {
        self.iter()
    }

    fn from_entries(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

macro_rules! sequence_serializable {
    ($(<$($param:ident),*> $ty:ty where [$($bound:tt)*];)*) => {
        $(
            impl<$($param),*> Serializable for $ty
            where
                $($bound)*
            {
                fn builtin_serializer() -> Option<SharedSerializer<Self>> {
                    let serializer: SharedSerializer<Self> = Arc::new(SequenceSerializer::<Self>::new());
                    Some(serializer)
                }
            }
        )*
    };
}

sequence_serializable! {
    <T> Vec<T> where [T: Serializable];
    <T> Box<[T]> where [T: Serializable];
    <T> VecDeque<T> where [T: Serializable];
    <T> LinkedList<T> where [T: Serializable];
    <T> BTreeSet<T> where [T: Serializable + Ord];
    <T, S> HashSet<T, S> where [T: Serializable + Eq + Hash, S: BuildHasher + Default + 'static];
}

impl<K, V, S> Serializable for HashMap<K, V, S>
where
    K: Serializable + Eq + Hash,
    V: Serializable,
    S: BuildHasher + Default + 'static,
{
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(MappingSerializer::<Self>::new());
        Some(serializer)
    }
}

impl<K: Serializable + Ord, V: Serializable> Serializable for BTreeMap<K, V> {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(MappingSerializer::<Self>::new());
        Some(serializer)
    }
}

/// Codec for fixed-size arrays. Element `i` is written at index `i + 1`;
/// there is no count.
pub struct ArraySerializer<T, const N: usize>(PhantomData<fn() -> T>);

impl<T: Serializable, const N: usize> TypeSerializer<[T; N]> for ArraySerializer<T, N>
where
    [T; N]: Default,
{
    fn serialize(&self, value: &[T; N], writer: &mut Writer<'_>) -> Result<()> {
        for (position, item) in value.iter().enumerate() {
            let index = u32::try_from(position + 1).map_err(|_| Error::InvalidFieldIndex(u32::MAX))?;
            writer.write_value(index, item)?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<[T; N]> {
        let mut array = <[T; N]>::default();
        while let Some(index) = reader.next_index()? {
            let slot = index
                .checked_sub(1)
                .and_then(|position| array.get_mut(position as usize));
            match slot {
                Some(slot) => *slot = reader.read_value()?,
                None => reader.skip_next()?,
            }
        }
        Ok(array)
    }
}

impl<T: Serializable, const N: usize> Serializable for [T; N]
where
    [T; N]: Default,
{
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(ArraySerializer::<T, N>(PhantomData));
        Some(serializer)
    }
}

/// Codec for `Option<T>`: a has-value flag at index 1 and the value at
/// index 2.
pub struct OptionSerializer<T>(PhantomData<fn() -> T>);

impl<T: Serializable> TypeSerializer<Option<T>> for OptionSerializer<T> {
    fn serialize(&self, value: &Option<T>, writer: &mut Writer<'_>) -> Result<()> {
        if let Some(inner) = value {
            writer.write_bool(1, true)?;
            writer.write_value(2, inner)?;
        }
        Ok(())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Option<T>> {
        let mut has_value = false;
        let mut value = None;
        while let Some(index) = reader.next_index()? {
            match index {
                1 => has_value = reader.read_bool()?,
                2 => value = Some(reader.read_value()?),
                _ => reader.skip_next()?,
            }
        }
        Ok(has_value.then(|| value.unwrap_or_default()))
    }
}

impl<T: Serializable> Serializable for Option<T> {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(OptionSerializer::<T>(PhantomData));
        Some(serializer)
    }
}

/// Codec for `(K, V)` pairs: key at index 1, value at index 2.
pub struct PairSerializer<K, V>(PhantomData<fn() -> (K, V)>);

impl<K: Serializable, V: Serializable> TypeSerializer<(K, V)> for PairSerializer<K, V> {
    fn serialize(&self, (key, value): &(K, V), writer: &mut Writer<'_>) -> Result<()> {
        writer.write_value(1, key)?;
        writer.write_value(2, value)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<(K, V)> {
        let mut pair = <(K, V)>::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => pair.0 = reader.read_value()?,
                2 => pair.1 = reader.read_value()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(pair)
    }
}

impl<K: Serializable, V: Serializable> Serializable for (K, V) {
    fn builtin_serializer() -> Option<SharedSerializer<Self>> {
        let serializer: SharedSerializer<Self> = Arc::new(PairSerializer::<K, V>(PhantomData));
        Some(serializer)
    }
}
