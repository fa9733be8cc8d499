use std::time::Duration;
use anyhow::bail;

pub struct ResolutionConfig {
    /// The capacity a response buffer starts with. The buffer grows in powers of two as data
    ///  arrives, so this is rounded up to the next power of two.
    pub initial_buffer_capacity: usize,

    /// Upper bound for the header fields of a response. A response with longer headers is
    ///  treated as malformed.
    pub max_header_length: usize,

    /// Overall timeout for connecting, sending the request and receiving the response, used when
    ///  the caller does not pass an explicit timeout
    pub default_timeout: Duration,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        ResolutionConfig {
            initial_buffer_capacity: 4 * 1024,
            max_header_length: 1024,
            default_timeout: Duration::from_secs(1),
        }
    }
}

impl ResolutionConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.initial_buffer_capacity == 0 {
            bail!("initial buffer capacity must not be 0");
        }
        if self.initial_buffer_capacity.checked_next_power_of_two().is_none() {
            bail!("initial buffer capacity {} is too big", self.initial_buffer_capacity);
        }
        if self.max_header_length == 0 {
            bail!("max header length must not be 0");
        }
        if self.default_timeout.is_zero() {
            bail!("default timeout must not be 0");
        }
        Ok(())
    }
}
