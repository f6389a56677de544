//! Test records in the exact shape the schema compiler generates:
//! plain structs with an `_unrecognized` slot, enums with `Unknown` and
//! `Unrecognized` variants, and a one-shot module registration call.

use crate::containers::{array_serializer, optional_serializer};
use crate::enums::EnumBuilder;
use crate::primitive::{int32_serializer, string_serializer, timestamp_serializer};
use crate::registry::{init_module, Record};
use crate::structs::StructBuilder;
use crate::timestamp::Timestamp;
use crate::unrecognized::{UnrecognizedEnum, UnrecognizedFields};
use std::sync::Once;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub label: String,
    pub _unrecognized: Option<UnrecognizedFields>,
}

impl Record for Point {
    const MODULE_PATH: &'static str = "demo/shapes.soia";
    const QUALIFIED_NAME: &'static str = "Point";
}

/// Field number 2 was removed from the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Drawing {
    pub name: String,
    pub points: Vec<Point>,
    pub created: Timestamp,
    pub origin: Option<Point>,
    pub _unrecognized: Option<UnrecognizedFields>,
}

impl Record for Drawing {
    const MODULE_PATH: &'static str = "demo/shapes.soia";
    const QUALIFIED_NAME: &'static str = "Drawing";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    pub value: i32,
    pub children: Vec<TreeNode>,
    pub _unrecognized: Option<UnrecognizedFields>,
}

impl Record for TreeNode {
    const MODULE_PATH: &'static str = "demo/shapes.soia";
    const QUALIFIED_NAME: &'static str = "TreeNode";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Shade {
    #[default]
    Unknown,
    Light,
    Dark,
    Custom(String),
    Rgb(Vec<i32>),
    Unrecognized(UnrecognizedEnum),
}

impl Record for Shade {
    const MODULE_PATH: &'static str = "demo/shapes.soia";
    const QUALIFIED_NAME: &'static str = "Shade";
}

/// Registers the test module exactly once per process.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        init_module(
            "demo/shapes.soia",
            vec![
                StructBuilder::<Point>::new(
                    |r| r._unrecognized.as_ref(),
                    |r, u| r._unrecognized = u,
                )
                .field("x", 0, |r| &r.x, |r, v| r.x = v, int32_serializer)
                .field("y", 1, |r| &r.y, |r, v| r.y = v, int32_serializer)
                .field(
                    "label",
                    2,
                    |r| &r.label,
                    |r, v| r.label = v,
                    string_serializer,
                )
                .build(),
                StructBuilder::<Drawing>::new(
                    |r| r._unrecognized.as_ref(),
                    |r, u| r._unrecognized = u,
                )
                .field("name", 0, |r| &r.name, |r, v| r.name = v, string_serializer)
                .field(
                    "points",
                    1,
                    |r| &r.points,
                    |r, v| r.points = v,
                    || array_serializer(Point::serializer()),
                )
                .field(
                    "created",
                    3,
                    |r| &r.created,
                    |r, v| r.created = v,
                    timestamp_serializer,
                )
                .field(
                    "origin",
                    4,
                    |r| &r.origin,
                    |r, v| r.origin = v,
                    || optional_serializer(Point::serializer()),
                )
                .removed_numbers(&[2])
                .build(),
                StructBuilder::<TreeNode>::new(
                    |r| r._unrecognized.as_ref(),
                    |r, u| r._unrecognized = u,
                )
                .field("value", 0, |r| &r.value, |r, v| r.value = v, int32_serializer)
                .field(
                    "children",
                    1,
                    |r| &r.children,
                    |r, v| r.children = v,
                    || array_serializer(TreeNode::serializer()),
                )
                .build(),
                EnumBuilder::<Shade>::new(
                    |r| matches!(r, Shade::Unknown),
                    Shade::Unrecognized,
                    |r| match r {
                        Shade::Unrecognized(u) => Some(u),
                        _ => None,
                    },
                )
                .constant("LIGHT", 1, Shade::Light, |r| matches!(r, Shade::Light))
                .constant("DARK", 2, Shade::Dark, |r| matches!(r, Shade::Dark))
                .value_variant(
                    "custom",
                    3,
                    Shade::Custom,
                    |r| match r {
                        Shade::Custom(s) => Some(s),
                        _ => None,
                    },
                    string_serializer,
                )
                .value_variant(
                    "rgb",
                    5,
                    Shade::Rgb,
                    |r| match r {
                        Shade::Rgb(v) => Some(v),
                        _ => None,
                    },
                    || array_serializer(int32_serializer()),
                )
                .build(),
            ],
        )
        .expect("test module registration failed");
    });
}
