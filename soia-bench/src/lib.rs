//! Shared fixtures for the soia benchmarks.

use soia::{
    array_serializer, init_module, int32_serializer, string_serializer, Record, StructBuilder,
    UnrecognizedFields,
};
use std::sync::Once;

/// A representative record for serializer benchmarks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub tags: Vec<String>,
    pub _unrecognized: Option<UnrecognizedFields>,
}

impl Record for Item {
    const MODULE_PATH: &'static str = "bench/item.soia";
    const QUALIFIED_NAME: &'static str = "Item";
}

/// Registers the benchmark module exactly once per process.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        init_module(
            "bench/item.soia",
            vec![StructBuilder::<Item>::new(
                |r| r._unrecognized.as_ref(),
                |r, u| r._unrecognized = u,
            )
            .field("id", 0, |r| &r.id, |r, v| r.id = v, int32_serializer)
            .field("name", 1, |r| &r.name, |r, v| r.name = v, string_serializer)
            .field(
                "tags",
                2,
                |r| &r.tags,
                |r, v| r.tags = v,
                || array_serializer(string_serializer()),
            )
            .build()],
        )
        .expect("benchmark module registration failed");
    });
}

/// Builds an item whose tag list is roughly `size` bytes of payload.
pub fn sample_item(size: usize) -> Item {
    Item {
        id: 12345,
        name: "benchmark-item".to_owned(),
        tags: (0..size / 16)
            .map(|i| format!("tag-{i:012}"))
            .collect(),
        _unrecognized: None,
    }
}
