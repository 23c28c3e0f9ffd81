//! Concurrent resolution and encoding.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use accelbuffer::{
    Reader, Registry, Result, Serializer, SerializerSource, TypeSerializer, Writer,
};

use common::{sample_profile, Address, Profile};

const THREADS: usize = 8;

#[test]
fn test_concurrent_first_access_publishes_one_entry() {
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.entry::<Profile>().unwrap()
            })
        })
        .collect();

    let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for entry in &entries[1..] {
        assert!(Arc::ptr_eq(&entries[0], entry));
    }
    assert!(Arc::ptr_eq(&entries[0], &registry.entry::<Profile>().unwrap()));
}

#[test]
fn test_concurrent_encode_same_type() {
    let registry = Registry::new();
    let expected = Serializer::new(&registry).serialize(&sample_profile()).unwrap();

    thread::scope(|scope| {
        for i in 0..THREADS {
            let registry = &registry;
            let expected = &expected;
            scope.spawn(move || {
                let serializer = Serializer::new(registry);
                for _ in 0..50 {
                    let bytes = serializer.serialize(&sample_profile()).unwrap();
                    assert_eq!(&bytes, expected);

                    let address = Address {
                        street: format!("Dock {}", i),
                        zip: i as u32,
                    };
                    let bytes = serializer.serialize(&address).unwrap();
                    assert_eq!(serializer.deserialize::<Address>(&bytes).unwrap(), address);
                }
            });
        }
    });
}

struct Upper;

impl TypeSerializer<String> for Upper {
    fn serialize(&self, value: &String, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_str(writer.field_index(), &value.to_uppercase())
    }

    fn deserialize(&self, reader: &mut Reader<'_>) -> Result<String> {
        reader.read_str()
    }

    fn is_builtin(&self) -> bool {
        true
    }
}

#[test]
fn test_binding_racing_first_use() {
    for _ in 0..200 {
        let registry = Registry::new();
        let barrier = Barrier::new(2);

        let (bound, entry) = thread::scope(|scope| {
            let binder = scope.spawn(|| {
                barrier.wait();
                registry.add_binding::<String>(Arc::new(Upper))
            });
            let user = scope.spawn(|| {
                barrier.wait();
                registry.entry::<String>().unwrap()
            });
            (binder.join().unwrap(), user.join().unwrap())
        });

        // an accepted binding is always the codec in use
        if bound.is_ok() {
            assert_eq!(entry.source(), SerializerSource::Binding);
            let bytes = Serializer::new(&registry).serialize(&"ab".to_string()).unwrap();
            assert_eq!(bytes, [0x21, 0x12, b'A', b'B']);
        } else {
            assert_eq!(entry.source(), SerializerSource::Builtin);
        }
    }
}

#[test]
fn test_free_memory_between_sessions() {
    let registry = Registry::new();
    let serializer = Serializer::new(&registry);
    let profile = sample_profile();
    let before = serializer.serialize(&profile).unwrap();

    registry.free_memory();
    assert_eq!(registry.entry::<Profile>().unwrap().allocator().lock().capacity(), 0);

    let after = serializer.serialize(&profile).unwrap();
    assert_eq!(before, after);
}
