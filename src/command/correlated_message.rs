//! The header shared by all commands a client sends to the driver: the client's id and a
//!  correlation id that the driver echoes in its response.
//!
//! ```ascii
//!  0: client id (i64)
//!  8: correlation id (i64)
//! ```

pub const CLIENT_ID_OFFSET: usize = 0;
pub const CORRELATION_ID_OFFSET: usize = 8;

pub const LENGTH: usize = 16;
