//! Concrete request destinations.

use std::fmt;
use std::str::FromStr;

use opstack_core::ClientError;

/// URL scheme used to reach an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolType {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    #[default]
    Https,
}

impl ProtocolType {
    /// The URL scheme string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// The port used when none is given explicitly.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ClientError::EndpointResolution(format!(
                "unsupported protocol '{other}'"
            ))),
        }
    }
}

/// A fully resolved destination: scheme, host, port, and base path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name without scheme or port.
    pub host: String,
    /// Base path, always starting with `/`.
    pub path: String,
    /// Port; `None` means the protocol's default.
    pub port: Option<u16>,
    /// Scheme.
    pub protocol: ProtocolType,
}

impl Endpoint {
    /// Create an endpoint at `/` with the protocol's default port.
    pub fn new(host: impl Into<String>, protocol: ProtocolType) -> Self {
        Self {
            host: host.into(),
            path: "/".to_owned(),
            port: None,
            protocol,
        }
    }

    /// Parse an absolute URL such as `https://svc.example.com:8443/base`.
    pub fn from_url(url: &str) -> Result<Self, ClientError> {
        let uri: http::Uri = url
            .parse()
            .map_err(|e| ClientError::EndpointResolution(format!("invalid endpoint url '{url}': {e}")))?;
        let protocol = uri
            .scheme_str()
            .ok_or_else(|| ClientError::EndpointResolution(format!("endpoint url '{url}' has no scheme")))?
            .parse()?;
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ClientError::EndpointResolution(format!("endpoint url '{url}' has no host")))?;
        let path = match uri.path() {
            "" => "/".to_owned(),
            p => p.to_owned(),
        };
        Ok(Self {
            host: host.to_owned(),
            path,
            port: uri.port_u16(),
            protocol,
        })
    }

    /// The effective port.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// `host[:port]`, omitting the port when it is the protocol's default.
    #[must_use]
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) if port != self.protocol.default_port() => format!("{}:{port}", self.host),
            _ => self.host.clone(),
        }
    }

    /// The endpoint as a URL string.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.protocol, self.authority(), self.path)
    }
}
