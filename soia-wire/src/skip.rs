//! Skipper for wire elements of unknown type.

use crate::error::WireError;
use crate::reader::Reader;
use crate::wire::{self, EMBEDDED_MAX};

/// Consumes exactly one wire element starting at the cursor, recursing
/// through arrays, structs and enum value variants. This is the only way to
/// discard a value whose schema is unknown.
pub fn skip_value(r: &mut Reader<'_>) -> Result<(), WireError> {
    let wire = r.read_u8()?;
    match wire {
        0..=EMBEDDED_MAX => Ok(()),
        wire::WIRE_U16 | wire::WIRE_NEG_U16 => r.read_slice(2).map(|_| ()),
        wire::WIRE_U32 | wire::WIRE_I32 | wire::WIRE_F32 => r.read_slice(4).map(|_| ()),
        wire::WIRE_U64 | wire::WIRE_I64 | wire::WIRE_TIMESTAMP | wire::WIRE_F64 => {
            r.read_slice(8).map(|_| ())
        }
        wire::WIRE_NEG_U8 => r.read_slice(1).map(|_| ()),
        wire::WIRE_STRING_EMPTY
        | wire::WIRE_BYTES_EMPTY
        | wire::WIRE_LEN_0
        | wire::WIRE_NULL => Ok(()),
        wire::WIRE_STRING | wire::WIRE_BYTES => {
            let len = wire::decode_uint(r)? as usize;
            r.read_slice(len).map(|_| ())
        }
        wire::WIRE_LEN_1 => skip_value(r),
        wire::WIRE_LEN_2 => {
            skip_value(r)?;
            skip_value(r)
        }
        wire::WIRE_LEN_N => {
            let len = wire::decode_uint(r)?;
            for _ in 0..len {
                skip_value(r)?;
            }
            Ok(())
        }
        wire::WIRE_ENUM_VALUE => {
            wire::decode_uint(r)?;
            skip_value(r)
        }
        // 251..=254: enum value variant with the number in the wire byte.
        _ => skip_value(r),
    }
}
