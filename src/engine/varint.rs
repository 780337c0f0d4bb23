// Variable-length integers for the diff container.
//
// Base-128, big-endian: most-significant group first, bit 7 set on every
// byte except the last (the VCDIFF layout). Signed values are zigzag-mapped
// before encoding so small negative offsets stay short.

use thiserror::Error;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT_LEN: usize = 10;

/// If any of these bits are set before a shift, the next `<< 7` overflows.
const U64_OVERFLOW_MASK: u64 = 0xFE00_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Not enough input bytes to complete the integer.
    #[error("truncated integer")]
    Underflow,
    /// Value does not fit the target integer type.
    #[error("integer overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `num` into the tail of `buf`, returning the encoded length.
#[inline]
fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = MAX_VARINT_LEN;
    loop {
        i -= 1;
        buf[i] = (num as u8 & 0x7F) | 0x80;
        num >>= 7;
        if num == 0 {
            break;
        }
    }
    buf[MAX_VARINT_LEN - 1] &= 0x7F;
    MAX_VARINT_LEN - i
}

/// Append `num` to `out`.
pub fn push_u64(out: &mut Vec<u8>, num: u64) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_u64(num, &mut buf);
    out.extend_from_slice(&buf[MAX_VARINT_LEN - len..]);
}

/// Append a `usize` to `out`.
pub fn push_usize(out: &mut Vec<u8>, num: usize) {
    push_u64(out, num as u64);
}

/// Append a signed value to `out` (zigzag-mapped).
pub fn push_i64(out: &mut Vec<u8>, num: i64) {
    push_u64(out, zigzag(num));
}

/// Encoded byte length of `num`.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    (bits.max(1).div_ceil(7) as usize).min(MAX_VARINT_LEN)
}

#[inline]
pub fn zigzag(num: i64) -> u64 {
    ((num << 1) ^ (num >> 63)) as u64
}

#[inline]
pub fn unzigzag(num: u64) -> i64 {
    ((num >> 1) as i64) ^ -((num & 1) as i64)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `u64` from the start of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        if val & U64_OVERFLOW_MASK != 0 {
            return Err(VarIntError::Overflow);
        }
        val = (val << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(VarIntError::Overflow)
    } else {
        Err(VarIntError::Underflow)
    }
}

/// Sequential reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn u64(&mut self) -> Result<u64, VarIntError> {
        let (val, len) = read_u64(&self.data[self.pos..])?;
        self.pos += len;
        Ok(val)
    }

    pub fn usize(&mut self) -> Result<usize, VarIntError> {
        usize::try_from(self.u64()?).map_err(|_| VarIntError::Overflow)
    }

    pub fn i64(&mut self) -> Result<i64, VarIntError> {
        self.u64().map(unzigzag)
    }

    pub fn byte(&mut self) -> Result<u8, VarIntError> {
        let b = *self.data.get(self.pos).ok_or(VarIntError::Underflow)?;
        self.pos += 1;
        Ok(b)
    }

    /// Take the next `len` raw bytes.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], VarIntError> {
        if len > self.remaining() {
            return Err(VarIntError::Underflow);
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
