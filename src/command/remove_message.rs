//! Remove message, sent by a client to remove a publication or subscription it registered
//!  earlier.
//!
//! ```ascii
//!  0: client id (i64)
//!  8: correlation id (i64)
//! 16: registration id (i64)
//! ```

use crate::buffers::{BufferError, RawBuf};
use crate::command::correlated_message;
use crate::command::flyweight::{flyweight_accessors, flyweight_getter, flyweight_setter, Flyweight};

pub const CLIENT_ID_OFFSET: usize = correlated_message::CLIENT_ID_OFFSET;
pub const CORRELATION_ID_OFFSET: usize = correlated_message::CORRELATION_ID_OFFSET;
pub const REGISTRATION_ID_OFFSET: usize = correlated_message::LENGTH;

pub const HEADER_LENGTH: usize = correlated_message::LENGTH + size_of::<i64>();

pub struct RemoveMessageFlyweight<B> {
    flyweight: Flyweight<B>,
}

impl<B: AsRef<[u8]>> RemoveMessageFlyweight<B> {
    pub fn new(buffer: RawBuf<B>, offset: usize) -> Result<RemoveMessageFlyweight<B>, BufferError> {
        Ok(RemoveMessageFlyweight {
            flyweight: Flyweight::new(buffer, offset, HEADER_LENGTH)?,
        })
    }

    flyweight_accessors!();

    flyweight_getter!(client_id, i64, get_i64, CLIENT_ID_OFFSET);
    flyweight_getter!(correlation_id, i64, get_i64, CORRELATION_ID_OFFSET);
    flyweight_getter!(registration_id, i64, get_i64, REGISTRATION_ID_OFFSET);

    /// The message has no variable-length part, but the signature matches the other command
    ///  types.
    pub fn length(&self) -> Result<usize, BufferError> {
        Ok(HEADER_LENGTH)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RemoveMessageFlyweight<B> {
    flyweight_setter!(set_client_id, i64, put_i64, CLIENT_ID_OFFSET);
    flyweight_setter!(set_correlation_id, i64, put_i64, CORRELATION_ID_OFFSET);
    flyweight_setter!(set_registration_id, i64, put_i64, REGISTRATION_ID_OFFSET);
}
