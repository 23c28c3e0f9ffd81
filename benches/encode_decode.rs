use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::Arc;

use accelbuffer::{
    Encoding, Reader, Registry, Result, Serializable, Serializer, Settings, SharedSerializer,
    TypeSerializer, Writer,
};
use criterion::{criterion_group, criterion_main, Criterion};

#[derive(Debug, Default, Clone, PartialEq)]
struct Order {
    id: u64,
    customer: String,
    lines: Vec<(u32, u16)>,
    notes: BTreeMap<String, String>,
    total: f64,
}

struct OrderSerializer;

impl TypeSerializer<Order> for OrderSerializer {
    fn serialize(&self, v: &Order, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_u64(1, v.id)?;
        writer.write_str(2, &v.customer)?;
        writer.write_value(3, &v.lines)?;
        writer.write_value(4, &v.notes)?;
        writer.write_f64(5, v.total)
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<Order> {
        let mut v = Order::default();
        while let Some(index) = reader.next_index()? {
            match index {
                1 => v.id = reader.read_u64()?,
                2 => v.customer = reader.read_str()?,
                3 => v.lines = reader.read_value()?,
                4 => v.notes = reader.read_value()?,
                5 => v.total = reader.read_f64()?,
                _ => reader.skip_next()?,
            }
        }
        Ok(v)
    }

    fn approximate_memory_size(&self) -> Option<usize> {
        Some(512)
    }
}

impl Serializable for Order {
    fn generated_serializer() -> Option<SharedSerializer<Self>> {
        Some(Arc::new(OrderSerializer))
    }
}

fn sample_order() -> Order {
    Order {
        id: 1_000_042,
        customer: "Harbour Supplies Ltd".to_string(),
        lines: (0..32).map(|i| (i * 7, (i % 5) as u16)).collect(),
        notes: BTreeMap::from([
            ("gift".to_string(), "yes".to_string()),
            ("dock".to_string(), "east".to_string()),
        ]),
        total: 1234.5,
    }
}

fn bench_encode_decode(c: &mut Criterion) {
    let registry = Registry::new();
    let order = sample_order();
    let mut group = c.benchmark_group("order");

    for (name, encoding) in [("utf8", Encoding::Utf8), ("unicode", Encoding::Unicode)] {
        let serializer =
            Serializer::with_settings(&registry, Settings::default().with_encoding(encoding));
        let bytes = serializer.serialize(&order).unwrap();

        group.bench_function(format!("serialize_{}", name), |b| {
            b.iter(|| serializer.serialize(black_box(&order)).unwrap())
        });
        group.bench_function(format!("deserialize_{}", name), |b| {
            b.iter(|| serializer.deserialize::<Order>(black_box(&bytes)).unwrap())
        });
    }

    let serializer = Serializer::new(&registry);
    let mut out = vec![0u8; 4096];
    group.bench_function("serialize_into", |b| {
        b.iter(|| serializer.serialize_into(black_box(&order), &mut out).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_encode_decode);
criterion_main!(benches);
