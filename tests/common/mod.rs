//! Test schemas with hand-written codecs, shaped like compiler output.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use accelbuffer::{
    Reader, Result, Serializable, SharedSerializer, TypeSerializer, VInt, VUInt, Writer,
};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scalars {
    pub flag: bool,
    pub tiny: i8,
    pub byte: u8,
    pub short: i16,
    pub ushort: u16,
    pub int: i32,
    pub uint: u32,
    pub long: i64,
    pub ulong: u64,
    pub huge: i128,
    pub uhuge: u128,
    pub size: isize,
    pub count: usize,
    pub single: f32,
    pub double: f64,
    pub letter: char,
    pub vint: VInt,
    pub vuint: VUInt,
    pub text: String,
}

pub struct ScalarsSerializer;

impl TypeSerializer<Scalars> for ScalarsSerializer {
    fn serialize(&self, v: &Scalars, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_bool(1, v.flag)?;
        writer.write_i8(2, v.tiny)?;
        writer.write_u8(3, v.byte)?;
        writer.write_i16(4, v.short)?;
        writer.write_u16(5, v.ushort)?;
        writer.write_i32(6, v.int)?;
        writer.write_u32(7, v.uint)?;
        writer.write_i64(8, v.long)?;
        writer.write_u64(9, v.ulong)?;
        writer.write_i128(10, v.huge)?;
        writer.write_u128(11, v.uhuge)?;
        writer.write_isize(12, v.size)?;
        writer.write_usize(13, v.count)?;
        writer.write_f32(14, v.single)?;
        writer.write_f64(15, v.double)?;
        writer.write_char(16, v.letter)?;
        writer.write_vint(17, v.vint)?;
        writer.write_vuint(18, v.vuint)?;
        writer.write_str(19, &v.text)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Scalars> {
        let mut v = Scalars::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => v.flag = reader.read_bool()?,
                2 => v.tiny = reader.read_i8()?,
                3 => v.byte = reader.read_u8()?,
                4 => v.short = reader.read_i16()?,
                5 => v.ushort = reader.read_u16()?,
                6 => v.int = reader.read_i32()?,
                7 => v.uint = reader.read_u32()?,
                8 => v.long = reader.read_i64()?,
                9 => v.ulong = reader.read_u64()?,
                10 => v.huge = reader.read_i128()?,
                11 => v.uhuge = reader.read_u128()?,
                12 => v.size = reader.read_isize()?,
                13 => v.count = reader.read_usize()?,
                14 => v.single = reader.read_f32()?,
                15 => v.double = reader.read_f64()?,
                16 => v.letter = reader.read_char()?,
                17 => v.vint = reader.read_vint()?,
                18 => v.vuint = reader.read_vuint()?,
                19 => v.text = reader.read_str()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(v)
    }

    fn approximate_memory_size(&self) -> Option<usize> {
        Some(128)
    }
}

impl Serializable for Scalars {
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        Some(Arc::new(ScalarsSerializer))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub zip: u32,
}

pub struct AddressSerializer;

impl TypeSerializer<Address> for AddressSerializer {
    fn serialize(&self, v: &Address, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_str(1, &v.street)?;
        writer.write_u32(2, v.zip)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Address> {
        let mut v = Address::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => v.street = reader.read_str()?,
                2 => v.zip = reader.read_u32()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(v)
    }
}

impl Serializable for Address {
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        Some(Arc::new(AddressSerializer))
    }
}

/// Current profile schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub address: Address,
    pub nicknames: Vec<String>,
    pub scores: BTreeMap<String, i32>,
    pub avatar: Option<Uuid>,
    pub session: Duration,
    pub history: Vec<Address>,
    pub checksum: [u8; 4],
}

pub struct ProfileSerializer;

impl TypeSerializer<Profile> for ProfileSerializer {
    fn serialize(&self, v: &Profile, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u64(1, v.id)?;
        writer.write_str(2, &v.name)?;
        writer.write_value(3, &v.address)?;
        writer.write_value(4, &v.nicknames)?;
        writer.write_value(5, &v.scores)?;
        writer.write_value(6, &v.avatar)?;
        writer.write_value(7, &v.session)?;
        writer.write_value(8, &v.history)?;
        writer.write_value(9, &v.checksum)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Profile> {
        let mut v = Profile::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => v.id = reader.read_u64()?,
                2 => v.name = reader.read_str()?,
                3 => v.address = reader.read_value()?,
                4 => v.nicknames = reader.read_value()?,
                5 => v.scores = reader.read_value()?,
                6 => v.avatar = reader.read_value()?,
                7 => v.session = reader.read_value()?,
                8 => v.history = reader.read_value()?,
                9 => v.checksum = reader.read_value()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(v)
    }
}

impl Serializable for Profile {
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        Some(Arc::new(ProfileSerializer))
    }
}

/// Older profile schema: shares `id` and `name` with [`Profile`] and has a
/// field at index 10 the newer schema never had.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileV1 {
    pub id: u64,
    pub name: String,
    pub legacy_flag: bool,
}

pub struct ProfileV1Serializer;

impl TypeSerializer<ProfileV1> for ProfileV1Serializer {
    fn serialize(&self, v: &ProfileV1, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u64(1, v.id)?;
        writer.write_str(2, &v.name)?;
        writer.write_bool(10, v.legacy_flag)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<ProfileV1> {
        let mut v = ProfileV1::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => v.id = reader.read_u64()?,
                2 => v.name = reader.read_str()?,
                10 => v.legacy_flag = reader.read_bool()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(v)
    }
}

impl Serializable for ProfileV1 {
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        Some(Arc::new(ProfileV1Serializer))
    }
}

pub fn sample_profile() -> Profile {
    Profile {
        id: 42,
        name: "Ferris \u{1f980}".to_string(),
        address: Address {
            street: "1 Harbour Rd".to_string(),
            zip: 90210,
        },
        nicknames: vec!["crab".to_string(), String::new(), "rustacean".to_string()],
        scores: BTreeMap::from([("math".to_string(), 97), ("art".to_string(), 0)]),
        avatar: Some(Uuid::from_u128(0x6ba7_b810_9dad_11d1_80b4_00c0_4fd4_30c8)),
        session: Duration::new(3600, 250_000_000),
        history: vec![
            Address::default(),
            Address {
                street: "Old Pier".to_string(),
                zip: 0,
            },
        ],
        checksum: [0xde, 0xad, 0x00, 0xef],
    }
}
