//! Shared enums and value types used across the opstack crates.

use std::fmt;
use std::str::FromStr;

/// Error returned when a configuration string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: '{value}'")]
pub struct ParseEnumError {
    /// The enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Status and header snapshot of a response, attached to service errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseParts {
    /// The final status code.
    pub status: http::StatusCode,
    /// The response headers.
    pub headers: http::HeaderMap,
}

impl ResponseParts {
    /// Create a snapshot from status and headers.
    #[must_use]
    pub fn new(status: http::StatusCode, headers: http::HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Look up a header value as a string, ignoring non-UTF-8 values.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Jitter applied to computed retry backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    /// Use the exponential delay as-is.
    None,
    /// Pick uniformly in `[0, delay]`.
    #[default]
    Full,
    /// Pick uniformly in `[scale, previous * 3]`, capped at the maximum.
    Decorrelated,
}

impl JitterMode {
    /// The configuration string for this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Full => "full",
            Self::Decorrelated => "decorrelated",
        }
    }
}

impl fmt::Display for JitterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JitterMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "full" => Ok(Self::Full),
            "decorrelated" => Ok(Self::Decorrelated),
            _ => Err(ParseEnumError::new("jitter mode", s)),
        }
    }
}

/// What the logger middleware records for each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientLogMode {
    /// Log nothing.
    #[default]
    None,
    /// Log the request line and headers.
    Request,
    /// Log the request including its buffered body.
    RequestWithBody,
    /// Log the response status and headers.
    Response,
    /// Log the response including its buffered body.
    ResponseWithBody,
    /// Log request and response heads.
    RequestAndResponse,
    /// Log request and response including buffered bodies.
    RequestAndResponseWithBody,
}

impl ClientLogMode {
    /// Whether the request head is logged.
    #[must_use]
    pub fn logs_request(self) -> bool {
        matches!(
            self,
            Self::Request
                | Self::RequestWithBody
                | Self::RequestAndResponse
                | Self::RequestAndResponseWithBody
        )
    }

    /// Whether the request body is logged.
    #[must_use]
    pub fn logs_request_body(self) -> bool {
        matches!(self, Self::RequestWithBody | Self::RequestAndResponseWithBody)
    }

    /// Whether the response head is logged.
    #[must_use]
    pub fn logs_response(self) -> bool {
        matches!(
            self,
            Self::Response
                | Self::ResponseWithBody
                | Self::RequestAndResponse
                | Self::RequestAndResponseWithBody
        )
    }

    /// Whether the response body is logged.
    #[must_use]
    pub fn logs_response_body(self) -> bool {
        matches!(self, Self::ResponseWithBody | Self::RequestAndResponseWithBody)
    }
}

impl FromStr for ClientLogMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "none" => Ok(Self::None),
            "request" => Ok(Self::Request),
            "requestwithbody" => Ok(Self::RequestWithBody),
            "response" => Ok(Self::Response),
            "responsewithbody" => Ok(Self::ResponseWithBody),
            "requestandresponse" => Ok(Self::RequestAndResponse),
            "requestandresponsewithbody" => Ok(Self::RequestAndResponseWithBody),
            _ => Err(ParseEnumError::new("client log mode", s)),
        }
    }
}

/// How a signed request is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowType {
    /// A regular signed request sent immediately.
    #[default]
    Normal,
    /// A presigned request returned to the caller instead of being sent.
    PresignRequest,
    /// A presigned URL carrying the signature in its query string.
    PresignUrl,
}
