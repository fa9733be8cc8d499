use crate::buffers::{BufferError, RawBuf};
use tracing::trace;

/// The common part of all command flyweights: a buffer view and the base offset of the message
///  inside it. All field offsets are relative to the base offset.
///
/// A flyweight has no storage of its own. Getters read from the buffer, setters write through
///  to it immediately.
pub struct Flyweight<B> {
    buffer: RawBuf<B>,
    offset: usize,
}

impl<B: AsRef<[u8]>> Flyweight<B> {
    /// Binds to `buffer` at `offset`, checking that a fixed header of `header_len` bytes fits.
    ///  Field contents are not inspected.
    pub fn new(buffer: RawBuf<B>, offset: usize, header_len: usize) -> Result<Flyweight<B>, BufferError> {
        buffer.bounds_check(offset, header_len)?;
        trace!("binding flyweight at offset {} with header length {}", offset, header_len);
        Ok(Flyweight { buffer, offset })
    }

    pub fn buffer(&self) -> &RawBuf<B> {
        &self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_buffer(self) -> RawBuf<B> {
        self.buffer
    }

    pub fn get_i32(&self, field_offset: usize) -> Result<i32, BufferError> {
        self.buffer.get_i32(self.offset + field_offset)
    }

    pub fn get_i64(&self, field_offset: usize) -> Result<i64, BufferError> {
        self.buffer.get_i64(self.offset + field_offset)
    }

    pub fn get_str(&self, field_offset: usize) -> Result<&str, BufferError> {
        self.buffer.get_str_utf8(self.offset + field_offset)
    }

    /// number of bytes the string field at `field_offset` currently occupies, prefix included
    pub fn str_encoded_len(&self, field_offset: usize) -> Result<usize, BufferError> {
        self.buffer.get_str_encoded_len(self.offset + field_offset)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Flyweight<B> {
    pub fn put_i32(&mut self, field_offset: usize, value: i32) -> Result<(), BufferError> {
        self.buffer.put_i32(self.offset + field_offset, value)
    }

    pub fn put_i64(&mut self, field_offset: usize, value: i64) -> Result<(), BufferError> {
        self.buffer.put_i64(self.offset + field_offset, value)
    }

    pub fn put_str(&mut self, field_offset: usize, value: &str) -> Result<usize, BufferError> {
        self.buffer.put_str_utf8(self.offset + field_offset, value)
    }

    pub fn zero(&mut self, field_offset: usize, length: usize) -> Result<(), BufferError> {
        self.buffer.set_memory(self.offset + field_offset, length, 0)
    }
}

/// generates a getter for a fixed-width field of a concrete flyweight type
macro_rules! flyweight_getter {
    ($getter: ident, $ty: ty, $flyweight_getter: ident, $field_offset: expr) => {
        pub fn $getter(&self) -> Result<$ty, $crate::buffers::BufferError> {
            self.flyweight.$flyweight_getter($field_offset)
        }
    }
}

/// generates a fluent setter for a fixed-width field of a concrete flyweight type
macro_rules! flyweight_setter {
    ($setter: ident, $ty: ty, $flyweight_putter: ident, $field_offset: expr) => {
        pub fn $setter(&mut self, value: $ty) -> Result<&mut Self, $crate::buffers::BufferError> {
            self.flyweight.$flyweight_putter($field_offset, value)?;
            Ok(self)
        }
    }
}

/// generates the accessors for the underlying buffer and base offset
macro_rules! flyweight_accessors {
    () => {
        pub fn buffer(&self) -> &$crate::buffers::RawBuf<B> {
            self.flyweight.buffer()
        }

        pub fn offset(&self) -> usize {
            self.flyweight.offset()
        }

        pub fn into_buffer(self) -> $crate::buffers::RawBuf<B> {
            self.flyweight.into_buffer()
        }
    }
}

pub(crate) use {flyweight_accessors, flyweight_getter, flyweight_setter};
