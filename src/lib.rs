pub mod buffers;
pub mod command;
pub mod resolve;
pub mod util;
