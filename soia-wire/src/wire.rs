//! The variable-length wire grammar.
//!
//! A single prefix byte classifies every element. Values `0..=231` stand
//! for themselves; `232..=255` are discriminators for wider integers,
//! floats, timestamps, strings, byte strings, arrays/structs, enum value
//! variants and null. Encoders always emit the smallest applicable form so
//! that output is deterministic; decoders accept any wire that yields a
//! value of the requested kind.

use crate::error::WireError;
use crate::reader::Reader;
use crate::writer::Writer;
use bytes::Bytes;

/// Largest integer encoded as the wire byte itself.
pub const EMBEDDED_MAX: u8 = 231;

pub const WIRE_U16: u8 = 232;
pub const WIRE_U32: u8 = 233;
pub const WIRE_U64: u8 = 234;
/// One byte `b` follows; the value is `-(256 - b)`.
pub const WIRE_NEG_U8: u8 = 235;
/// One LE word `w` follows; the value is `-(65536 - w)`.
pub const WIRE_NEG_U16: u8 = 236;
pub const WIRE_I32: u8 = 237;
pub const WIRE_I64: u8 = 238;
/// Timestamp, milliseconds since the Unix epoch as LE i64.
pub const WIRE_TIMESTAMP: u8 = 239;
pub const WIRE_F32: u8 = 240;
pub const WIRE_F64: u8 = 241;
pub const WIRE_STRING_EMPTY: u8 = 242;
pub const WIRE_STRING: u8 = 243;
pub const WIRE_BYTES_EMPTY: u8 = 244;
pub const WIRE_BYTES: u8 = 245;
/// Empty array, or struct with zero slots.
pub const WIRE_LEN_0: u8 = 246;
pub const WIRE_LEN_1: u8 = 247;
/// Enum value variant with number >= 5; the number follows as a wire uint.
pub const WIRE_ENUM_VALUE: u8 = 248;
pub const WIRE_LEN_2: u8 = 249;
/// Array/struct with N >= 3 slots; N follows as a wire uint.
pub const WIRE_LEN_N: u8 = 250;
/// `251..=254` carry enum value-variant numbers 1 through 4 directly.
pub const WIRE_ENUM_VALUE_1: u8 = 251;
pub const WIRE_ENUM_VALUE_4: u8 = 254;
pub const WIRE_NULL: u8 = 255;

/// A decoded numeric wire element, before narrowing to the target type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    U64(u64),
    I64(i64),
    F64(f64),
}

impl Numeric {
    /// Narrows to 32-bit two's complement. Floats truncate toward zero and
    /// wrap modulo 2^32; non-finite floats become 0.
    pub fn to_i32(self) -> i32 {
        match self {
            Numeric::U64(u) => u as u32 as i32,
            Numeric::I64(v) => v as i32,
            Numeric::F64(f) => {
                if !f.is_finite() {
                    return 0;
                }
                let m = f.trunc().rem_euclid(4_294_967_296.0);
                m as u32 as i32
            }
        }
    }

    /// Converts to i64, clamping at the type bounds.
    pub fn to_i64(self) -> i64 {
        match self {
            Numeric::U64(u) => u.min(i64::MAX as u64) as i64,
            Numeric::I64(v) => v,
            // Float-to-int casts saturate; NaN becomes 0.
            Numeric::F64(f) => f as i64,
        }
    }

    /// Converts to u64, clamping negatives at 0.
    pub fn to_u64(self) -> u64 {
        match self {
            Numeric::U64(u) => u,
            Numeric::I64(v) => v.max(0) as u64,
            Numeric::F64(f) => f as u64,
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Numeric::U64(u) => u as f64,
            Numeric::I64(v) => v as f64,
            Numeric::F64(f) => f,
        }
    }

    /// Truthiness: non-zero, with NaN counting as false.
    pub fn truthy(self) -> bool {
        match self {
            Numeric::U64(u) => u != 0,
            Numeric::I64(v) => v != 0,
            Numeric::F64(f) => !f.is_nan() && f != 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// Encodes a non-negative integer (also used for length prefixes and enum
/// numbers) in its smallest form.
pub fn encode_uint(w: &mut Writer, value: u64) {
    if value <= EMBEDDED_MAX as u64 {
        w.put_u8(value as u8);
    } else if value < 65_536 {
        w.put_u8(WIRE_U16);
        w.put_u16_le(value as u16);
    } else if value < 4_294_967_296 {
        w.put_u8(WIRE_U32);
        w.put_u32_le(value as u32);
    } else {
        w.put_u8(WIRE_U64);
        w.put_u64_le(value);
    }
}

pub fn encode_i32(w: &mut Writer, value: i32) {
    if value < 0 {
        if value >= -256 {
            w.put_u8(WIRE_NEG_U8);
            w.put_u8((value + 256) as u8);
        } else if value >= -65_536 {
            w.put_u8(WIRE_NEG_U16);
            w.put_u16_le((value + 65_536) as u16);
        } else {
            w.put_u8(WIRE_I32);
            w.put_i32_le(value);
        }
    } else if value <= EMBEDDED_MAX as i32 {
        w.put_u8(value as u8);
    } else if value < 65_536 {
        w.put_u8(WIRE_U16);
        w.put_u16_le(value as u16);
    } else {
        w.put_u8(WIRE_U32);
        w.put_u32_le(value as u32);
    }
}

pub fn encode_i64(w: &mut Writer, value: i64) {
    if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
        encode_i32(w, value as i32);
    } else {
        w.put_u8(WIRE_I64);
        w.put_i64_le(value);
    }
}

pub fn encode_bool(w: &mut Writer, value: bool) {
    w.put_u8(value as u8);
}

pub fn encode_f32(w: &mut Writer, value: f32) {
    if value == 0.0 {
        w.put_u8(0);
    } else {
        w.put_u8(WIRE_F32);
        w.put_f32_le(value);
    }
}

pub fn encode_f64(w: &mut Writer, value: f64) {
    if value == 0.0 {
        w.put_u8(0);
    } else {
        w.put_u8(WIRE_F64);
        w.put_f64_le(value);
    }
}

pub fn encode_timestamp_millis(w: &mut Writer, millis: i64) {
    if millis == 0 {
        w.put_u8(0);
    } else {
        w.put_u8(WIRE_TIMESTAMP);
        w.put_i64_le(millis);
    }
}

pub fn encode_string(w: &mut Writer, value: &str) {
    if value.is_empty() {
        w.put_u8(WIRE_STRING_EMPTY);
    } else {
        w.put_u8(WIRE_STRING);
        encode_uint(w, value.len() as u64);
        w.put_str(value);
    }
}

pub fn encode_byte_string(w: &mut Writer, value: &[u8]) {
    if value.is_empty() {
        w.put_u8(WIRE_BYTES_EMPTY);
    } else {
        w.put_u8(WIRE_BYTES);
        encode_uint(w, value.len() as u64);
        w.put_slice(value);
    }
}

/// Encodes an array length using the slot-count branches.
pub fn encode_array_len(w: &mut Writer, len: usize) {
    match len {
        0 => w.put_u8(WIRE_LEN_0),
        1 => w.put_u8(WIRE_LEN_1),
        2 => w.put_u8(WIRE_LEN_2),
        n => {
            w.put_u8(WIRE_LEN_N);
            encode_uint(w, n as u64);
        }
    }
}

/// Encodes a struct slot count. A default struct (zero slots) is the single
/// byte `0x00`; decoders also accept the empty-array wire.
pub fn encode_struct_len(w: &mut Writer, len: usize) {
    if len == 0 {
        w.put_u8(0);
    } else {
        encode_array_len(w, len);
    }
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Decodes any numeric wire element (integers, floats, timestamps).
pub fn decode_numeric(r: &mut Reader<'_>) -> Result<Numeric, WireError> {
    let offset = r.position();
    let wire = r.read_u8()?;
    match wire {
        0..=EMBEDDED_MAX => Ok(Numeric::U64(wire as u64)),
        WIRE_U16 => Ok(Numeric::U64(r.read_u16_le()? as u64)),
        WIRE_U32 => Ok(Numeric::U64(r.read_u32_le()? as u64)),
        WIRE_U64 => Ok(Numeric::U64(r.read_u64_le()?)),
        WIRE_NEG_U8 => Ok(Numeric::I64(r.read_u8()? as i64 - 256)),
        WIRE_NEG_U16 => Ok(Numeric::I64(r.read_u16_le()? as i64 - 65_536)),
        WIRE_I32 => Ok(Numeric::I64(r.read_i32_le()? as i64)),
        WIRE_I64 | WIRE_TIMESTAMP => Ok(Numeric::I64(r.read_i64_le()?)),
        WIRE_F32 => Ok(Numeric::F64(r.read_f32_le()? as f64)),
        WIRE_F64 => Ok(Numeric::F64(r.read_f64_le()?)),
        _ => Err(WireError::InvalidWire { wire, offset }),
    }
}

/// Decodes an unsigned integer, accepting only the unsigned wire branches.
/// Used for length prefixes and enum numbers.
pub fn decode_uint(r: &mut Reader<'_>) -> Result<u64, WireError> {
    let offset = r.position();
    let wire = r.read_u8()?;
    match wire {
        0..=EMBEDDED_MAX => Ok(wire as u64),
        WIRE_U16 => Ok(r.read_u16_le()? as u64),
        WIRE_U32 => Ok(r.read_u32_le()? as u64),
        WIRE_U64 => Ok(r.read_u64_le()?),
        _ => Err(WireError::InvalidWire { wire, offset }),
    }
}

pub fn decode_bool(r: &mut Reader<'_>) -> Result<bool, WireError> {
    Ok(decode_numeric(r)?.truthy())
}

pub fn decode_i32(r: &mut Reader<'_>) -> Result<i32, WireError> {
    Ok(decode_numeric(r)?.to_i32())
}

pub fn decode_i64(r: &mut Reader<'_>) -> Result<i64, WireError> {
    Ok(decode_numeric(r)?.to_i64())
}

pub fn decode_u64(r: &mut Reader<'_>) -> Result<u64, WireError> {
    Ok(decode_numeric(r)?.to_u64())
}

pub fn decode_f32(r: &mut Reader<'_>) -> Result<f32, WireError> {
    Ok(decode_numeric(r)?.to_f64() as f32)
}

pub fn decode_f64(r: &mut Reader<'_>) -> Result<f64, WireError> {
    Ok(decode_numeric(r)?.to_f64())
}

pub fn decode_timestamp_millis(r: &mut Reader<'_>) -> Result<i64, WireError> {
    Ok(decode_numeric(r)?.to_i64())
}

pub fn decode_string(r: &mut Reader<'_>) -> Result<String, WireError> {
    let offset = r.position();
    let wire = r.read_u8()?;
    match wire {
        0 | WIRE_STRING_EMPTY => Ok(String::new()),
        WIRE_STRING => {
            let len = decode_uint(r)? as usize;
            let bytes = r.read_slice(len)?;
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| WireError::InvalidUtf8)
        }
        _ => Err(WireError::InvalidWire { wire, offset }),
    }
}

pub fn decode_byte_string(r: &mut Reader<'_>) -> Result<Bytes, WireError> {
    let offset = r.position();
    let wire = r.read_u8()?;
    match wire {
        0 | WIRE_BYTES_EMPTY => Ok(Bytes::new()),
        WIRE_BYTES => {
            let len = decode_uint(r)? as usize;
            Ok(Bytes::copy_from_slice(r.read_slice(len)?))
        }
        _ => Err(WireError::InvalidWire { wire, offset }),
    }
}

/// Decodes an array/struct slot count. The single byte `0x00` and the
/// empty-array wire both mean zero slots.
pub fn decode_array_len(r: &mut Reader<'_>) -> Result<usize, WireError> {
    let offset = r.position();
    let wire = r.read_u8()?;
    match wire {
        0 | WIRE_LEN_0 => Ok(0),
        WIRE_LEN_1 => Ok(1),
        WIRE_LEN_2 => Ok(2),
        WIRE_LEN_N => Ok(decode_uint(r)? as usize),
        _ => Err(WireError::InvalidWire { wire, offset }),
    }
}
