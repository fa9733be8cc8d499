//! Image message, sent by the driver when an image becomes unavailable.
//!
//! ```ascii
//!  0: correlation id (i64)
//!  8: stream id (i32)
//! 12: channel length (u32)
//! 16: channel (UTF-8)
//! ```

use crate::buffers::{BufferError, RawBuf, STR_LENGTH_PREFIX_LEN};
use crate::command::flyweight::{flyweight_accessors, flyweight_getter, flyweight_setter, Flyweight};

pub const CORRELATION_ID_OFFSET: usize = 0;
pub const STREAM_ID_OFFSET: usize = 8;
pub const CHANNEL_OFFSET: usize = 12;

pub const HEADER_LENGTH: usize = 12;

/// encoded length of a message with the given channel
pub fn compute_length(channel: &str) -> usize {
    HEADER_LENGTH + STR_LENGTH_PREFIX_LEN + channel.len()
}

pub struct ImageMessageFlyweight<B> {
    flyweight: Flyweight<B>,
}

impl<B: AsRef<[u8]>> ImageMessageFlyweight<B> {
    pub fn new(buffer: RawBuf<B>, offset: usize) -> Result<ImageMessageFlyweight<B>, BufferError> {
        Ok(ImageMessageFlyweight {
            flyweight: Flyweight::new(buffer, offset, HEADER_LENGTH)?,
        })
    }

    flyweight_accessors!();

    flyweight_getter!(correlation_id, i64, get_i64, CORRELATION_ID_OFFSET);
    flyweight_getter!(stream_id, i32, get_i32, STREAM_ID_OFFSET);

    pub fn channel(&self) -> Result<&str, BufferError> {
        self.flyweight.get_str(CHANNEL_OFFSET)
    }

    pub fn length(&self) -> Result<usize, BufferError> {
        Ok(HEADER_LENGTH + self.flyweight.str_encoded_len(CHANNEL_OFFSET)?)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ImageMessageFlyweight<B> {
    flyweight_setter!(set_correlation_id, i64, put_i64, CORRELATION_ID_OFFSET);
    flyweight_setter!(set_stream_id, i32, put_i32, STREAM_ID_OFFSET);

    pub fn set_channel(&mut self, value: &str) -> Result<&mut Self, BufferError> {
        self.flyweight.put_str(CHANNEL_OFFSET, value)?;
        Ok(self)
    }
}
