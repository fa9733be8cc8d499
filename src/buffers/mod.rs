pub mod raw_buf;

pub use raw_buf::{BufferError, RawBuf, STR_LENGTH_PREFIX_LEN};
