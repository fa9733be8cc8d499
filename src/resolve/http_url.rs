use std::fmt::{Debug, Formatter};
use std::net::{Ipv4Addr, SocketAddr};
use anyhow::{anyhow, bail};
use tracing::debug;

pub const MAX_USERINFO_LENGTH: usize = 384;
pub const MAX_PATH_AND_QUERY_LENGTH: usize = 512;
pub const MAX_HOST_LENGTH: usize = 255;
pub const MAX_PORT_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

/// The parts of an `http://` URL that are needed to fetch it
#[derive(Clone, PartialEq, Eq)]
pub struct HttpParsedUrl {
    pub userinfo: Option<String>,
    /// host name or IP literal, without the brackets around an IPv6 literal
    pub host: String,
    pub port: u16,
    pub path_and_query: String,
    /// set for IP literals, preferred when resolving host names
    pub ip_version_hint: Option<IpVersion>,
}

impl Debug for HttpParsedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // userinfo may contain credentials
        let userinfo = if self.userinfo.is_some() { "***@" } else { "" };
        write!(f, "http://{}{}{}", userinfo, self.host_and_port(), self.path_and_query)
    }
}

impl HttpParsedUrl {
    pub const DEFAULT_PORT: u16 = 80;

    pub fn parse(url: &str) -> anyhow::Result<HttpParsedUrl> {
        let rest = url.strip_prefix("http://")
            .ok_or_else(|| anyhow!("only http:// URLs are supported: {}", url))?;

        let (authority, path_and_query) = match rest.find(['/', '?']) {
            Some(idx) if rest[idx..].starts_with('/') => (&rest[..idx], rest[idx..].to_string()),
            Some(idx) => (&rest[..idx], format!("/{}", &rest[idx..])),
            None => (rest, "/".to_string()),
        };
        if path_and_query.len() >= MAX_PATH_AND_QUERY_LENGTH {
            bail!("path and query exceed {} bytes", MAX_PATH_AND_QUERY_LENGTH);
        }

        let (userinfo, host_and_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_and_port)) => {
                if userinfo.len() >= MAX_USERINFO_LENGTH {
                    bail!("userinfo exceeds {} bytes", MAX_USERINFO_LENGTH);
                }
                (Some(userinfo.to_string()), host_and_port)
            }
            None => (None, authority),
        };
        if host_and_port.len() >= MAX_HOST_LENGTH + 1 + MAX_PORT_LENGTH {
            bail!("host and port exceed {} bytes", MAX_HOST_LENGTH + 1 + MAX_PORT_LENGTH - 1);
        }

        let (host, port, ip_version_hint) = if let Some(bracketed) = host_and_port.strip_prefix('[') {
            let (host, after_host) = bracketed.split_once(']')
                .ok_or_else(|| anyhow!("unterminated IPv6 address in {}", url))?;
            let port = match after_host {
                "" => None,
                s => Some(s.strip_prefix(':')
                    .ok_or_else(|| anyhow!("unexpected characters after IPv6 address in {}", url))?),
            };
            (host, port, Some(IpVersion::V6))
        }
        else {
            let (host, port) = match host_and_port.split_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (host_and_port, None),
            };
            let hint = host.parse::<Ipv4Addr>().ok().map(|_| IpVersion::V4);
            (host, port, hint)
        };

        if host.is_empty() {
            bail!("no host in {}", url);
        }
        let port = match port {
            None => Self::DEFAULT_PORT,
            Some(port) => match port.parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => bail!("invalid port {:?} in {}", port, url),
            },
        };

        Ok(HttpParsedUrl {
            userinfo,
            host: host.to_string(),
            port,
            path_and_query,
            ip_version_hint,
        })
    }

    /// host and port the way they go into a `Host` header
    pub fn host_and_port(&self) -> String {
        match self.ip_version_hint {
            Some(IpVersion::V6) => format!("[{}]:{}", self.host, self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }

    /// Looks up the host's socket address, preferring an address of the hinted IP version
    pub async fn resolve(&self) -> anyhow::Result<SocketAddr> {
        let candidates: Vec<SocketAddr> = tokio::net::lookup_host((self.host.as_str(), self.port)).await?
            .collect();
        debug!("resolved {} to {:?}", self.host, candidates);

        let preferred = candidates.iter()
            .find(|addr| match self.ip_version_hint {
                Some(IpVersion::V4) => addr.is_ipv4(),
                Some(IpVersion::V6) => addr.is_ipv6(),
                None => true,
            })
            .or(candidates.first());

        preferred
            .copied()
            .ok_or_else(|| anyhow!("no address found for {}", self.host))
    }
}
