//! A bounds-checked view on a caller-owned byte region. This is the foundation all command
//!  flyweights are built on: every field access goes through here, and every access is checked
//!  against the region's length before it touches memory.
//!
//! Some salient points:
//!
//! * generic over the backing region: `&[u8]` for decoding, `&mut [u8]` for encoding, or any
//!   other `AsRef<[u8]>` / `AsMut<[u8]>` (e.g. a memory mapped file)
//! * the view never owns the memory it looks at - lifetime is tracked by the borrow
//! * all numbers are little endian, on both the client and the driver side
//! * strings are encoded as a u32 length prefix followed by UTF-8 bytes (no terminator, no padding)
//! * there is no implicit resizing: encoding into a region that is too small fails

use std::fmt::{Debug, Formatter};
use bytes::{Buf, BufMut};
use crate::util::safe_converter::SafeCast;

/// Size of the length prefix of an encoded string
pub const STR_LENGTH_PREFIX_LEN: usize = size_of::<u32>();

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("access out of bounds: offset {offset}, width {width}, capacity {capacity}")]
    OutOfBounds { offset: usize, width: usize, capacity: usize },
    #[error("malformed length prefix at offset {offset}: {length} bytes do not fit into capacity {capacity}")]
    MalformedLength { offset: usize, length: u32, capacity: usize },
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },
    #[error("string of {length} bytes does not fit into a 4 byte length prefix")]
    StringTooLong { length: usize },
    #[error("buffer address {address:#x} is not aligned to {alignment} bytes")]
    Misaligned { address: usize, alignment: usize },
}

impl BufferError {
    /// Malformed length prefixes are bounds violations that were detected while decoding, and
    ///  callers handle them the same way
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, BufferError::OutOfBounds { .. } | BufferError::MalformedLength { .. })
    }
}

macro_rules! get_impl {
    ($getter: ident, $ty: ty, $buf_getter: ident) => {
        pub fn $getter(&self, offset: usize) -> Result<$ty, BufferError> {
            self.bounds_check(offset, size_of::<$ty>())?;
            let mut b = &self.buf.as_ref()[offset..offset + size_of::<$ty>()];
            Ok(b.$buf_getter())
        }
    }
}

macro_rules! put_impl {
    ($putter: ident, $ty: ty, $buf_putter: ident) => {
        pub fn $putter(&mut self, offset: usize, value: $ty) -> Result<(), BufferError> {
            self.bounds_check(offset, size_of::<$ty>())?;
            let mut b = &mut self.buf.as_mut()[offset..offset + size_of::<$ty>()];
            b.$buf_putter(value);
            Ok(())
        }
    }
}

/// A view on a fixed-length byte region, providing typed access at arbitrary offsets
#[derive(Clone, Copy)]
pub struct RawBuf<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> RawBuf<B> {
    pub fn new(buf: B) -> RawBuf<B> {
        RawBuf { buf }
    }

    pub fn capacity(&self) -> usize {
        self.buf.as_ref().len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    /// Succeeds iff `width` bytes starting at `offset` are inside the region.
    pub fn bounds_check(&self, offset: usize, width: usize) -> Result<(), BufferError> {
        let capacity = self.capacity();
        match offset.checked_add(width) {
            Some(end) if end <= capacity => Ok(()),
            _ => Err(BufferError::OutOfBounds { offset, width, capacity }),
        }
    }

    /// Checks that the region's base address is a multiple of `alignment`. Field offsets in
    ///  all message layouts keep 8 byte fields 8 byte aligned relative to the message's base
    ///  offset, so for a memory mapped region this should be verified once, before overlaying
    ///  flyweights on it.
    pub fn verify_alignment(&self, alignment: usize) -> Result<(), BufferError> {
        let address = self.buf.as_ref().as_ptr() as usize;
        if alignment == 0 || address % alignment != 0 {
            return Err(BufferError::Misaligned { address, alignment });
        }
        Ok(())
    }

    get_impl!(get_i8, i8, get_i8);
    get_impl!(get_i16, i16, get_i16_le);
    get_impl!(get_i32, i32, get_i32_le);
    get_impl!(get_i64, i64, get_i64_le);

    /// Returns the raw length prefix of the string at `offset`, without checking the payload.
    pub fn get_str_length(&self, offset: usize) -> Result<u32, BufferError> {
        self.bounds_check(offset, STR_LENGTH_PREFIX_LEN)?;
        let mut b = &self.buf.as_ref()[offset..offset + STR_LENGTH_PREFIX_LEN];
        Ok(b.get_u32_le())
    }

    /// Returns the number of bytes the string at `offset` occupies, prefix included. Fails if
    ///  the length prefix points past the end of the region.
    pub fn get_str_encoded_len(&self, offset: usize) -> Result<usize, BufferError> {
        let length = self.get_str_length(offset)?;
        let payload_len: usize = length.safe_cast();

        match STR_LENGTH_PREFIX_LEN.checked_add(payload_len) {
            Some(encoded_len) if self.bounds_check(offset, encoded_len).is_ok() => Ok(encoded_len),
            _ => Err(BufferError::MalformedLength { offset, length, capacity: self.capacity() }),
        }
    }

    /// Reads a length-prefixed string at `offset`, returning the total number of bytes the
    ///  encoded string occupies (prefix included) and the string itself. The string borrows
    ///  from the underlying region.
    pub fn read_str_utf8(&self, offset: usize) -> Result<(usize, &str), BufferError> {
        let encoded_len = self.get_str_encoded_len(offset)?;

        let payload = &self.buf.as_ref()[offset + STR_LENGTH_PREFIX_LEN..offset + encoded_len];
        let s = std::str::from_utf8(payload)
            .map_err(|_| BufferError::InvalidUtf8 { offset })?;
        Ok((encoded_len, s))
    }

    pub fn get_str_utf8(&self, offset: usize) -> Result<&str, BufferError> {
        self.read_str_utf8(offset)
            .map(|(_, s)| s)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RawBuf<B> {
    put_impl!(put_i8, i8, put_i8);
    put_impl!(put_i16, i16, put_i16_le);
    put_impl!(put_i32, i32, put_i32_le);
    put_impl!(put_i64, i64, put_i64_le);

    /// Writes `value` as a length-prefixed string at `offset`, returning the number of bytes
    ///  written (prefix included). Nothing is written if the encoded string does not fit.
    pub fn put_str_utf8(&mut self, offset: usize, value: &str) -> Result<usize, BufferError> {
        let payload = value.as_bytes();
        let length: u32 = payload.len().try_into()
            .map_err(|_| BufferError::StringTooLong { length: payload.len() })?;

        let encoded_len = STR_LENGTH_PREFIX_LEN + payload.len();
        self.bounds_check(offset, encoded_len)?;

        let mut b = &mut self.buf.as_mut()[offset..offset + encoded_len];
        b.put_u32_le(length);
        b.put_slice(payload);
        Ok(encoded_len)
    }

    /// Fills `length` bytes starting at `offset` with `value`
    pub fn set_memory(&mut self, offset: usize, length: usize, value: u8) -> Result<(), BufferError> {
        self.bounds_check(offset, length)?;
        self.buf.as_mut()[offset..offset + length].fill(value);
        Ok(())
    }
}

impl<B: AsRef<[u8]>> AsRef<[u8]> for RawBuf<B> {
    fn as_ref(&self) -> &[u8] {
        self.buf.as_ref()
    }
}

impl<B: AsRef<[u8]>> Debug for RawBuf<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawBuf{{capacity: {}}}", self.capacity())
    }
}
