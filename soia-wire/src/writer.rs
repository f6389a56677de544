//! Append-only output buffer.

use bytes::{BufMut, Bytes, BytesMut};

/// Initial capacity of a fresh writer; the buffer doubles on overflow.
const INITIAL_CAPACITY: usize = 128;

/// Grow-on-demand output buffer with explicit little-endian puts.
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity.max(INITIAL_CAPACITY)),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16_le(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn put_u32_le(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_u64_le(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn put_i32_le(&mut self, value: i32) {
        self.buf.put_i32_le(value);
    }

    pub fn put_i64_le(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn put_f32_le(&mut self, value: f32) {
        self.buf.put_f32_le(value);
    }

    pub fn put_f64_le(&mut self, value: f64) {
        self.buf.put_f64_le(value);
    }

    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Appends the UTF-8 encoding of `s`, returning the number of bytes
    /// written.
    pub fn put_str(&mut self, s: &str) -> usize {
        self.buf.put_slice(s.as_bytes());
        s.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, yielding the immutable output.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_puts() {
        let mut w = Writer::new();
        w.put_u16_le(0x1234);
        w.put_u32_le(0xAABBCCDD);
        assert_eq!(w.as_slice(), &[0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn test_put_str_returns_byte_count() {
        let mut w = Writer::new();
        // 'é' is two bytes in UTF-8
        assert_eq!(w.put_str("café"), 5);
        assert_eq!(w.len(), 5);
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut w = Writer::new();
        let big = vec![0x42u8; 4096];
        w.put_slice(&big);
        assert_eq!(w.len(), 4096);
        assert_eq!(w.freeze(), Bytes::from(big));
    }

    #[test]
    fn test_default_is_empty() {
        let w = Writer::default();
        assert!(w.is_empty());
    }
}
