//! Subscription message, sent by a client to add a subscription.
//!
//! ```ascii
//!  0: client id (i64)
//!  8: correlation id (i64)
//! 16: registration correlation id (i64)
//! 24: stream id (i32)
//! 28: channel length (u32)
//! 32: channel (UTF-8)
//! ```

use crate::buffers::{BufferError, RawBuf, STR_LENGTH_PREFIX_LEN};
use crate::command::correlated_message;
use crate::command::flyweight::{flyweight_accessors, flyweight_getter, flyweight_setter, Flyweight};

pub const CLIENT_ID_OFFSET: usize = correlated_message::CLIENT_ID_OFFSET;
pub const CORRELATION_ID_OFFSET: usize = correlated_message::CORRELATION_ID_OFFSET;
pub const REGISTRATION_CORRELATION_ID_OFFSET: usize = correlated_message::LENGTH;
pub const STREAM_ID_OFFSET: usize = REGISTRATION_CORRELATION_ID_OFFSET + size_of::<i64>();
pub const CHANNEL_OFFSET: usize = STREAM_ID_OFFSET + size_of::<i32>();

pub const HEADER_LENGTH: usize = CHANNEL_OFFSET;

pub fn compute_length(channel: &str) -> usize {
    HEADER_LENGTH + STR_LENGTH_PREFIX_LEN + channel.len()
}

pub struct SubscriptionMessageFlyweight<B> {
    flyweight: Flyweight<B>,
}

impl<B: AsRef<[u8]>> SubscriptionMessageFlyweight<B> {
    pub fn new(buffer: RawBuf<B>, offset: usize) -> Result<SubscriptionMessageFlyweight<B>, BufferError> {
        Ok(SubscriptionMessageFlyweight {
            flyweight: Flyweight::new(buffer, offset, HEADER_LENGTH)?,
        })
    }

    flyweight_accessors!();

    flyweight_getter!(client_id, i64, get_i64, CLIENT_ID_OFFSET);
    flyweight_getter!(correlation_id, i64, get_i64, CORRELATION_ID_OFFSET);
    flyweight_getter!(registration_correlation_id, i64, get_i64, REGISTRATION_CORRELATION_ID_OFFSET);
    flyweight_getter!(stream_id, i32, get_i32, STREAM_ID_OFFSET);

    pub fn channel(&self) -> Result<&str, BufferError> {
        self.flyweight.get_str(CHANNEL_OFFSET)
    }

    pub fn length(&self) -> Result<usize, BufferError> {
        Ok(HEADER_LENGTH + self.flyweight.str_encoded_len(CHANNEL_OFFSET)?)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SubscriptionMessageFlyweight<B> {
    flyweight_setter!(set_client_id, i64, put_i64, CLIENT_ID_OFFSET);
    flyweight_setter!(set_correlation_id, i64, put_i64, CORRELATION_ID_OFFSET);
    flyweight_setter!(set_registration_correlation_id, i64, put_i64, REGISTRATION_CORRELATION_ID_OFFSET);
    flyweight_setter!(set_stream_id, i32, put_i32, STREAM_ID_OFFSET);

    pub fn set_channel(&mut self, value: &str) -> Result<&mut Self, BufferError> {
        self.flyweight.put_str(CHANNEL_OFFSET, value)?;
        Ok(self)
    }
}
