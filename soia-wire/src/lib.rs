//! # soia-wire
//!
//! Low-level building blocks for the soia binary format:
//! - [`Writer`]: append-only output buffer with explicit little-endian puts
//! - [`Reader`]: forward-only cursor over a byte slice
//! - [`wire`]: the variable-length wire grammar shared by every codec
//! - [`skip_value`]: consumes exactly one wire element of unknown type
//!
//! The grammar classifies each element by a single prefix byte:
//!
//! ```text
//! 0..=231   the value itself          242/243   empty / non-empty string
//! 232..=234 u16 / u32 / u64 LE        244/245   empty / non-empty bytes
//! 235/236   negative byte / word      246/247/249  0, 1, 2 slots
//! 237/238   i32 / i64 LE              250       N slots, N >= 3
//! 239       timestamp millis (i64)    248, 251..=254  enum value variants
//! 240/241   f32 / f64 LE              255       null
//! ```
//!
//! All multi-byte integers are little-endian on the wire regardless of the
//! host byte order.

mod error;
mod reader;
mod skip;
pub mod wire;
mod writer;

pub use error::WireError;
pub use reader::Reader;
pub use skip::skip_value;
pub use writer::Writer;

/// Magic bytes prefixed to every standalone binary serialization: "soia".
pub const MAGIC: [u8; 4] = *b"soia";
