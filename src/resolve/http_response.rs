//! The receiving side of an HTTP fetch. The connection layer parses the wire format and hands
//!  the response over in pieces: first the status and header fields, then body frames as they
//!  arrive. The body goes into a buffer that grows in powers of two.
//!
//! Malformed framing does not cause an error. It sets a flag instead, and callers must check
//!  [HttpResponse::parse_err] before trusting the response's code or body.

use anyhow::{anyhow, bail};
use hyper::header::{HeaderMap, CONTENT_LENGTH, TRANSFER_ENCODING};
use hyper::StatusCode;
use tracing::{debug, trace};
use crate::resolve::config::ResolutionConfig;

pub struct HttpResponse {
    body: Vec<u8>,
    capacity: usize,
    max_header_length: usize,
    headers_complete: bool,
    end_of_stream: bool,
    response_code: Option<u16>,
    content_length: Option<usize>,
    parse_err: bool,
}

impl HttpResponse {
    pub fn new(config: &ResolutionConfig) -> anyhow::Result<HttpResponse> {
        let mut result = HttpResponse {
            body: Vec::new(),
            capacity: 0,
            max_header_length: config.max_header_length,
            headers_complete: false,
            end_of_stream: false,
            response_code: None,
            content_length: None,
            parse_err: false,
        };
        result.ensure_capacity(config.initial_buffer_capacity)?;
        Ok(result)
    }

    /// Grows the body buffer to at least `new_capacity` bytes, rounding up to the next power of
    ///  two. The buffer never shrinks.
    pub fn ensure_capacity(&mut self, new_capacity: usize) -> anyhow::Result<()> {
        if new_capacity <= self.capacity {
            return Ok(());
        }

        let new_capacity = new_capacity.checked_next_power_of_two()
            .ok_or_else(|| anyhow!("response buffer capacity {} is too big", new_capacity))?;
        self.body.try_reserve_exact(new_capacity - self.body.len())?;
        trace!("growing response buffer from {} to {} bytes", self.capacity, new_capacity);
        self.capacity = new_capacity;
        Ok(())
    }

    /// Takes the parsed status and header fields. Header fields taking more than the configured
    ///  maximum, counted as `name: value\r\n` each, mark the response as malformed.
    pub fn on_headers(&mut self, status: StatusCode, headers: &HeaderMap) {
        if self.headers_complete || self.parse_err {
            return;
        }

        let header_length: usize = headers.iter()
            .map(|(name, value)| name.as_str().len() + value.len() + 4)
            .sum();
        if header_length > self.max_header_length {
            debug!("headers are {} bytes, exceeding the maximum of {}", header_length, self.max_header_length);
            self.parse_err = true;
            return;
        }

        // a chunked body ends with its last chunk, any declared length is meaningless
        let content_length = if headers.contains_key(TRANSFER_ENCODING) {
            None
        }
        else {
            match headers.get(CONTENT_LENGTH) {
                None => None,
                Some(value) => match value.to_str().ok().and_then(|s| s.trim().parse::<usize>().ok()) {
                    Some(content_length) => Some(content_length),
                    None => {
                        debug!("invalid content length {:?}", value);
                        self.parse_err = true;
                        return;
                    }
                },
            }
        };

        trace!("response code {}, content length {:?}", status.as_u16(), content_length);
        self.response_code = Some(status.as_u16());
        self.content_length = content_length;
        self.headers_complete = true;
    }

    /// Adds a frame of body data. Data exceeding a declared content length marks the response
    ///  as malformed.
    pub fn append(&mut self, data: &[u8]) -> anyhow::Result<()> {
        if !self.headers_complete {
            bail!("body data before the end of headers");
        }
        if self.parse_err {
            return Ok(());
        }

        if let Some(content_length) = self.content_length {
            if self.body.len() + data.len() > content_length {
                debug!("body exceeds content length {}", content_length);
                self.parse_err = true;
                return Ok(());
            }
        }

        self.ensure_capacity(self.body.len() + data.len())?;
        self.body.extend_from_slice(data);
        Ok(())
    }

    /// To be called after the last body frame: a response that was cut short is malformed
    pub fn on_end_of_stream(&mut self) {
        self.end_of_stream = true;
        if self.parse_err {
            return;
        }
        if !self.headers_complete {
            debug!("response ended before end of headers");
            self.parse_err = true;
        }
        else if let Some(content_length) = self.content_length {
            if self.body.len() < content_length {
                debug!("response ended after {} of {} body bytes", self.body.len(), content_length);
                self.parse_err = true;
            }
        }
    }

    /// Marks the response as malformed, for framing errors detected by the connection layer
    pub fn set_parse_err(&mut self) {
        self.parse_err = true;
    }

    pub fn headers_complete(&self) -> bool {
        self.headers_complete
    }

    /// true once the whole body has arrived: the declared content length, or everything up to
    ///  the end of the stream if no length was declared
    pub fn is_complete(&self) -> bool {
        if !self.headers_complete || self.parse_err {
            return false;
        }
        match self.content_length {
            Some(content_length) => self.body.len() == content_length,
            None => self.end_of_stream,
        }
    }

    pub fn parse_err(&self) -> bool {
        self.parse_err
    }

    pub fn response_code(&self) -> Option<u16> {
        self.response_code
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// The body received so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}


#[cfg(test)]
mod tests {
    use hyper::header::{HeaderName, HeaderValue};
    use rstest::rstest;
    use super::*;

    fn new_response() -> HttpResponse {
        HttpResponse::new(&ResolutionConfig::default()).unwrap()
    }

    fn headers(fields: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut result = HeaderMap::new();
        for &(name, value) in fields {
            result.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }
        result
    }

    #[test]
    fn test_complete_response() {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &headers(&[("content-type", "text/plain"), ("content-length", "5")]));
        response.append(b"hel").unwrap();
        assert!(!response.is_complete());
        response.append(b"lo").unwrap();
        response.on_end_of_stream();

        assert!(!response.parse_err());
        assert!(response.headers_complete());
        assert!(response.is_complete());
        assert_eq!(response.response_code(), Some(200));
        assert_eq!(response.content_length(), Some(5));
        assert_eq!(response.body(), b"hello");
    }

    #[test]
    fn test_without_content_length() {
        let mut response = new_response();
        response.on_headers(StatusCode::NOT_FOUND, &headers(&[("server", "x")]));
        response.append(b"not ").unwrap();
        response.append(b"here").unwrap();

        assert!(!response.is_complete());
        response.on_end_of_stream();

        assert!(!response.parse_err());
        assert!(response.is_complete());
        assert_eq!(response.response_code(), Some(404));
        assert_eq!(response.content_length(), None);
        assert_eq!(response.body(), b"not here");
    }

    #[test]
    fn test_chunked_ignores_content_length() {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &headers(&[("transfer-encoding", "chunked"), ("content-length", "2")]));
        response.append(b"longer than two").unwrap();
        response.on_end_of_stream();

        assert!(!response.parse_err());
        assert_eq!(response.content_length(), None);
        assert_eq!(response.body(), b"longer than two");
    }

    #[test]
    fn test_partial_body() {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &headers(&[("content-length", "5")]));
        response.append(b"hel").unwrap();
        response.on_end_of_stream();

        assert!(response.parse_err());
        assert!(!response.is_complete());
    }

    #[test]
    fn test_body_beyond_content_length() {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &headers(&[("content-length", "5")]));
        response.append(b"hello").unwrap();
        response.append(b"trailing garbage").unwrap();

        assert!(response.parse_err());
        assert_eq!(response.body(), b"hello");
    }

    #[rstest]
    #[case::not_numeric("five")]
    #[case::negative("-1")]
    #[case::empty("")]
    fn test_bad_content_length(#[case] content_length: &'static str) {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &headers(&[("content-length", content_length)]));

        assert!(response.parse_err());
        assert!(!response.headers_complete());
        assert_eq!(response.response_code(), None);
    }

    #[test]
    fn test_headers_too_long() {
        let config = ResolutionConfig { max_header_length: 32, ..Default::default() };

        let mut response = HttpResponse::new(&config).unwrap();
        // 9 + 2 + 15 + 2 = 28 bytes
        response.on_headers(StatusCode::OK, &headers(&[("x-padding", "012345678901234")]));
        assert!(!response.parse_err());

        let mut response = HttpResponse::new(&config).unwrap();
        response.on_headers(StatusCode::OK, &headers(&[("x-padding", "01234567890123456789")]));
        assert!(response.parse_err());
        assert!(!response.headers_complete());
    }

    #[test]
    fn test_end_of_stream_before_headers() {
        let mut response = new_response();
        response.on_end_of_stream();
        assert!(response.parse_err());
    }

    #[test]
    fn test_body_before_headers() {
        let mut response = new_response();
        assert!(response.append(b"x").is_err());
    }

    #[test]
    fn test_parse_err_from_connection() {
        let mut response = new_response();
        response.on_headers(StatusCode::OK, &HeaderMap::new());
        response.append(b"abc").unwrap();
        response.set_parse_err();
        response.on_end_of_stream();

        assert!(response.parse_err());
        assert!(!response.is_complete());
    }

    #[rstest]
    #[case::exact(64, 64)]
    #[case::round_up(100, 128)]
    #[case::one(1, 1)]
    fn test_initial_capacity(#[case] initial: usize, #[case] expected: usize) {
        let config = ResolutionConfig { initial_buffer_capacity: initial, ..Default::default() };
        assert_eq!(HttpResponse::new(&config).unwrap().capacity(), expected);
    }

    #[test]
    fn test_capacity_grows_in_powers_of_two() {
        let config = ResolutionConfig { initial_buffer_capacity: 16, ..Default::default() };
        let mut response = HttpResponse::new(&config).unwrap();
        response.on_headers(StatusCode::OK, &HeaderMap::new());

        response.append(&[b'x'; 16]).unwrap();
        assert_eq!(response.capacity(), 16);
        response.append(b"y").unwrap();
        assert_eq!(response.capacity(), 32);
        response.append(&[b'z'; 100]).unwrap();
        assert_eq!(response.capacity(), 128);
        assert_eq!(response.body().len(), 117);

        response.ensure_capacity(1000).unwrap();
        assert_eq!(response.capacity(), 1024);
        response.ensure_capacity(10).unwrap();
        assert_eq!(response.capacity(), 1024);
    }

    #[test]
    fn test_capacity_overflow() {
        let mut response = new_response();
        assert!(response.ensure_capacity(usize::MAX).is_err());
    }
}
