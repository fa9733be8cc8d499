//! Image buffers ready, sent by the driver when a new image becomes available to a subscriber.
//!
//! ```ascii
//!  0: correlation id (i64)
//!  8: session id (i32)
//! 12: stream id (i32)
//! 16: subscriber position indicator id (i32)
//! 20: reserved (4 bytes, zero)
//! 24: subscriber position registration id (i64)
//! 32: log file name length (u32)
//! 36: log file name (UTF-8)
//!  *: source identity length (u32), directly after the log file name
//!  *: source identity (UTF-8)
//! ```
//!
//! The reserved bytes keep the registration id 8 byte aligned. They are never read. Writing the
//!  log file name zeroes them, and so does setting the indicator id.
//!
//! Since the source identity's position depends on the log file name's length, the log file
//!  name must be written first. Every encode therefore writes it, which leaves the reserved bytes
//!  zeroed.

use crate::buffers::{BufferError, RawBuf, STR_LENGTH_PREFIX_LEN};
use crate::command::flyweight::{flyweight_accessors, flyweight_getter, flyweight_setter, Flyweight};

pub const CORRELATION_ID_OFFSET: usize = 0;
pub const SESSION_ID_OFFSET: usize = 8;
pub const STREAM_ID_OFFSET: usize = 12;
pub const SUBSCRIBER_POSITION_INDICATOR_ID_OFFSET: usize = 16;
pub const RESERVED_OFFSET: usize = 20;
pub const RESERVED_LEN: usize = 4;
pub const SUBSCRIBER_POSITION_REGISTRATION_ID_OFFSET: usize = 24;
pub const LOG_FILE_NAME_OFFSET: usize = 32;

pub const HEADER_LENGTH: usize = 32;

pub fn compute_length(log_file_name: &str, source_identity: &str) -> usize {
    HEADER_LENGTH
        + STR_LENGTH_PREFIX_LEN + log_file_name.len()
        + STR_LENGTH_PREFIX_LEN + source_identity.len()
}

pub struct ImageBuffersReadyFlyweight<B> {
    flyweight: Flyweight<B>,
}

impl<B: AsRef<[u8]>> ImageBuffersReadyFlyweight<B> {
    pub fn new(buffer: RawBuf<B>, offset: usize) -> Result<ImageBuffersReadyFlyweight<B>, BufferError> {
        Ok(ImageBuffersReadyFlyweight {
            flyweight: Flyweight::new(buffer, offset, HEADER_LENGTH)?,
        })
    }

    flyweight_accessors!();

    flyweight_getter!(correlation_id, i64, get_i64, CORRELATION_ID_OFFSET);
    flyweight_getter!(session_id, i32, get_i32, SESSION_ID_OFFSET);
    flyweight_getter!(stream_id, i32, get_i32, STREAM_ID_OFFSET);
    flyweight_getter!(subscriber_position_indicator_id, i32, get_i32, SUBSCRIBER_POSITION_INDICATOR_ID_OFFSET);
    flyweight_getter!(subscriber_position_registration_id, i64, get_i64, SUBSCRIBER_POSITION_REGISTRATION_ID_OFFSET);

    pub fn log_file_name(&self) -> Result<&str, BufferError> {
        self.flyweight.get_str(LOG_FILE_NAME_OFFSET)
    }

    pub fn source_identity(&self) -> Result<&str, BufferError> {
        self.flyweight.get_str(self.source_identity_offset()?)
    }

    pub fn length(&self) -> Result<usize, BufferError> {
        let source_identity_offset = self.source_identity_offset()?;
        Ok(source_identity_offset + self.flyweight.str_encoded_len(source_identity_offset)?)
    }

    fn source_identity_offset(&self) -> Result<usize, BufferError> {
        Ok(LOG_FILE_NAME_OFFSET + self.flyweight.str_encoded_len(LOG_FILE_NAME_OFFSET)?)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ImageBuffersReadyFlyweight<B> {
    flyweight_setter!(set_correlation_id, i64, put_i64, CORRELATION_ID_OFFSET);
    flyweight_setter!(set_session_id, i32, put_i32, SESSION_ID_OFFSET);
    flyweight_setter!(set_stream_id, i32, put_i32, STREAM_ID_OFFSET);
    flyweight_setter!(set_subscriber_position_registration_id, i64, put_i64, SUBSCRIBER_POSITION_REGISTRATION_ID_OFFSET);

    /// also zeroes the reserved bytes that follow the indicator id
    pub fn set_subscriber_position_indicator_id(&mut self, value: i32) -> Result<&mut Self, BufferError> {
        self.flyweight.put_i32(SUBSCRIBER_POSITION_INDICATOR_ID_OFFSET, value)?;
        self.clear_reserved()
    }

    pub fn clear_reserved(&mut self) -> Result<&mut Self, BufferError> {
        self.flyweight.zero(RESERVED_OFFSET, RESERVED_LEN)?;
        Ok(self)
    }

    /// also zeroes the reserved bytes
    pub fn set_log_file_name(&mut self, value: &str) -> Result<&mut Self, BufferError> {
        self.flyweight.put_str(LOG_FILE_NAME_OFFSET, value)?;
        self.clear_reserved()
    }

    pub fn set_source_identity(&mut self, value: &str) -> Result<&mut Self, BufferError> {
        let offset = self.source_identity_offset()?;
        self.flyweight.put_str(offset, value)?;
        Ok(self)
    }
}
