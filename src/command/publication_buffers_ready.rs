//! Publication buffers ready, sent by the driver once the log buffers of a publication are in
//!  place.
//!
//! ```ascii
//!  0: correlation id (i64)
//!  8: registration id (i64)
//! 16: session id (i32)
//! 20: stream id (i32)
//! 24: position limit counter id (i32)
//! 28: log file name length (u32)
//! 32: log file name (UTF-8)
//! ```
//!
//! NB: session id comes before stream id in memory, which is the opposite of the order in which
//!  they are usually set.

use crate::buffers::{BufferError, RawBuf, STR_LENGTH_PREFIX_LEN};
use crate::command::flyweight::{flyweight_accessors, flyweight_getter, flyweight_setter, Flyweight};

pub const CORRELATION_ID_OFFSET: usize = 0;
pub const REGISTRATION_ID_OFFSET: usize = 8;
pub const SESSION_ID_OFFSET: usize = 16;
pub const STREAM_ID_OFFSET: usize = 20;
pub const POSITION_LIMIT_COUNTER_ID_OFFSET: usize = 24;
pub const LOG_FILE_NAME_OFFSET: usize = 28;

pub const HEADER_LENGTH: usize = 28;

pub fn compute_length(log_file_name: &str) -> usize {
    HEADER_LENGTH + STR_LENGTH_PREFIX_LEN + log_file_name.len()
}

pub struct PublicationBuffersReadyFlyweight<B> {
    flyweight: Flyweight<B>,
}

impl<B: AsRef<[u8]>> PublicationBuffersReadyFlyweight<B> {
    pub fn new(buffer: RawBuf<B>, offset: usize) -> Result<PublicationBuffersReadyFlyweight<B>, BufferError> {
        Ok(PublicationBuffersReadyFlyweight {
            flyweight: Flyweight::new(buffer, offset, HEADER_LENGTH)?,
        })
    }

    flyweight_accessors!();

    flyweight_getter!(correlation_id, i64, get_i64, CORRELATION_ID_OFFSET);
    flyweight_getter!(registration_id, i64, get_i64, REGISTRATION_ID_OFFSET);
    flyweight_getter!(session_id, i32, get_i32, SESSION_ID_OFFSET);
    flyweight_getter!(stream_id, i32, get_i32, STREAM_ID_OFFSET);
    flyweight_getter!(position_limit_counter_id, i32, get_i32, POSITION_LIMIT_COUNTER_ID_OFFSET);

    pub fn log_file_name(&self) -> Result<&str, BufferError> {
        self.flyweight.get_str(LOG_FILE_NAME_OFFSET)
    }

    pub fn length(&self) -> Result<usize, BufferError> {
        Ok(HEADER_LENGTH + self.flyweight.str_encoded_len(LOG_FILE_NAME_OFFSET)?)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PublicationBuffersReadyFlyweight<B> {
    flyweight_setter!(set_correlation_id, i64, put_i64, CORRELATION_ID_OFFSET);
    flyweight_setter!(set_registration_id, i64, put_i64, REGISTRATION_ID_OFFSET);
    flyweight_setter!(set_session_id, i32, put_i32, SESSION_ID_OFFSET);
    flyweight_setter!(set_stream_id, i32, put_i32, STREAM_ID_OFFSET);
    flyweight_setter!(set_position_limit_counter_id, i32, put_i32, POSITION_LIMIT_COUNTER_ID_OFFSET);

    pub fn set_log_file_name(&mut self, value: &str) -> Result<&mut Self, BufferError> {
        self.flyweight.put_str(LOG_FILE_NAME_OFFSET, value)?;
        Ok(self)
    }
}
