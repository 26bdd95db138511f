//! Big-endian wire codec
//!
//! Every value on the wire is big-endian. Strings and `u32` arrays carry a
//! 4-byte prefix (byte count for strings, element count for arrays). There is
//! no version tag, so any change here breaks every client.

use thiserror::Error;

/// Error raised when a payload cannot be decoded
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CodecError {
    /// The payload ended before a value (or its declared length) was complete
    #[error("truncated payload: needed {needed} bytes, {remaining} remaining")]
    Bounds {
        /// Number of bytes the value required
        needed: usize,
        /// Number of bytes left in the payload
        remaining: usize,
    },
    /// A string value was not valid UTF-8
    #[error("string is not valid UTF-8")]
    Utf8,
}

/// Builds a payload by appending values
#[derive(Clone, Default, Debug)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create an empty [`Encoder`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an [`Encoder`] with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append a `u32`
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append an `i64`
    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append an `f64` as its IEEE-754 bit pattern
    pub fn put_f64(&mut self, value: f64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
        self
    }

    /// Append a string prefixed with its length in bytes
    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Append a `u32` array prefixed with its element count
    pub fn put_u32_array(&mut self, values: &[u32]) -> &mut Self {
        self.buf.reserve(4 + values.len() * 4);
        self.put_u32(values.len() as u32);
        for value in values {
            self.put_u32(*value);
        }
        self
    }

    /// Append raw bytes without a prefix
    pub fn put_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Return the encoded bytes
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads values from the front of a payload
///
/// Every read checks the remaining length first and fails with
/// [`CodecError::Bounds`] instead of reading past the end.
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Create a [`Decoder`] over `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// The bytes not yet consumed
    pub fn rest(&self) -> &'a [u8] {
        self.buf
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        if needed > self.buf.len() {
            return Err(CodecError::Bounds {
                needed,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(needed);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a `u32`
    pub fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Read an `i64`
    pub fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Read an `f64`
    pub fn f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.array()?)))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn string(&mut self) -> Result<String, CodecError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::Utf8)
    }

    /// Read a count-prefixed `u32` array
    pub fn u32_array(&mut self) -> Result<Vec<u32>, CodecError> {
        let count = self.u32()? as usize;
        // Check the whole array up front so a bogus count cannot trigger a
        // huge allocation.
        let bytes = self.take(count.saturating_mul(4))?;
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}
