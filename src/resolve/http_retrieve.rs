use std::io::ErrorKind;
use std::time::Duration;
use anyhow::bail;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper::header::{CONNECTION, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use crate::resolve::config::ResolutionConfig;
use crate::resolve::http_response::HttpResponse;
use crate::resolve::http_url::HttpParsedUrl;

/// hyper rejects read buffer limits below this
const MIN_READ_BUF_SIZE: usize = 8192;

/// Fetches a URL with a plain HTTP/1.1 `GET`. Connecting, sending and receiving together must
///  finish within `timeout`.
///
/// A response that arrives but cannot be parsed is returned with its parse error flag set rather
///  than as an error.
pub async fn retrieve(url: &str, timeout: Duration, config: &ResolutionConfig) -> anyhow::Result<HttpResponse> {
    config.validate()?;
    let parsed = HttpParsedUrl::parse(url)?;

    match tokio::time::timeout(timeout, do_retrieve(&parsed, config)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("timed out after {:?} retrieving {:?}", timeout, parsed);
            bail!("timed out after {:?} retrieving {:?}", timeout, parsed)
        }
    }
}

/// [retrieve] with the configured default timeout
pub async fn retrieve_with_default_timeout(url: &str, config: &ResolutionConfig) -> anyhow::Result<HttpResponse> {
    retrieve(url, config.default_timeout, config).await
}

/// [retrieve] for callers outside an async context. This creates a single-threaded runtime for
///  the duration of the call, so it must not be called from within a runtime.
pub fn retrieve_blocking(url: &str, timeout: Duration, config: &ResolutionConfig) -> anyhow::Result<HttpResponse> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(retrieve(url, timeout, config))
}

/// Distinguishes a peer sending something that is not valid HTTP from I/O failures. Body
///  decoding errors surface as I/O errors wrapped by hyper.
fn is_framing_error(err: &hyper::Error) -> bool {
    if err.is_parse() || err.is_parse_status() || err.is_parse_too_large() || err.is_incomplete_message() {
        return true;
    }
    match std::error::Error::source(err).and_then(|e| e.downcast_ref::<std::io::Error>()) {
        Some(io_err) => matches!(io_err.kind(), ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof),
        None => false,
    }
}

async fn do_retrieve(url: &HttpParsedUrl, config: &ResolutionConfig) -> anyhow::Result<HttpResponse> {
    let addr = url.resolve().await?;
    debug!("connecting to {} for {:?}", addr, url);
    let stream = TcpStream::connect(addr).await?;

    let (mut sender, connection) = http1::Builder::new()
        .max_buf_size(config.max_header_length.max(MIN_READ_BUF_SIZE))
        .handshake::<_, Empty<Bytes>>(TokioIo::new(stream))
        .await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!("connection closed with error: {}", e);
        }
    });

    let request = Request::builder()
        .method(Method::GET)
        .uri(url.path_and_query.as_str())
        .header(HOST, url.host_and_port())
        .header(CONNECTION, "close")
        .body(Empty::<Bytes>::new())?;

    let mut response = HttpResponse::new(config)?;

    let incoming = match sender.send_request(request).await {
        Ok(incoming) => incoming,
        Err(e) if is_framing_error(&e) => {
            warn!("malformed response from {:?}: {}", url, e);
            response.set_parse_err();
            return Ok(response);
        }
        Err(e) => return Err(e.into()),
    };

    let (parts, mut body) = incoming.into_parts();
    response.on_headers(parts.status, &parts.headers);
    if response.parse_err() {
        warn!("malformed headers from {:?}", url);
        return Ok(response);
    }

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Ok(data) = frame.into_data() {
                    response.append(&data)?;
                }
            }
            Err(e) if is_framing_error(&e) => {
                warn!("malformed body from {:?}: {}", url, e);
                response.set_parse_err();
                return Ok(response);
            }
            Err(e) => return Err(e.into()),
        }
        if response.parse_err() {
            warn!("body from {:?} exceeds its declared length", url);
            return Ok(response);
        }
    }
    response.on_end_of_stream();

    if response.parse_err() {
        warn!("incomplete response from {:?} after {} body bytes", url, response.body().len());
    }
    else {
        debug!("response from {:?}: code {:?}, {} body bytes", url, response.response_code(), response.body().len());
    }
    Ok(response)
}
