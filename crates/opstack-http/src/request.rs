//! Outbound request and its mutable builder form.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use opstack_core::ClientError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::body::ByteStream;
use crate::endpoint::{Endpoint, ProtocolType};

/// Characters left unescaped in query strings (RFC 3986 unreserved set).
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A single query string item. Items without a value render as `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryItem {
    /// Unencoded item name.
    pub name: String,
    /// Unencoded item value.
    pub value: Option<String>,
}

impl QueryItem {
    /// Create a query item.
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    fn encode(&self) -> String {
        let name = utf8_percent_encode(&self.name, QUERY_ENCODE_SET);
        match &self.value {
            Some(value) => format!("{name}={}", utf8_percent_encode(value, QUERY_ENCODE_SET)),
            None => name.to_string(),
        }
    }
}

/// A request ready to be handed to an [`HttpClientEngine`](crate::HttpClientEngine).
#[derive(Debug, Clone)]
pub struct SdkHttpRequest {
    method: Method,
    endpoint: Endpoint,
    headers: HeaderMap,
    trailing_headers: HeaderMap,
    query_items: Vec<QueryItem>,
    body: ByteStream,
}

impl SdkHttpRequest {
    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The destination.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    /// The path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.endpoint.path
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Headers sent after a streamed body.
    #[must_use]
    pub fn trailing_headers(&self) -> &HeaderMap {
        &self.trailing_headers
    }

    /// The query items in insertion order.
    #[must_use]
    pub fn query_items(&self) -> &[QueryItem] {
        &self.query_items
    }

    /// The body.
    #[must_use]
    pub fn body(&self) -> &ByteStream {
        &self.body
    }

    /// The encoded query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> Option<String> {
        if self.query_items.is_empty() {
            return None;
        }
        Some(
            self.query_items
                .iter()
                .map(QueryItem::encode)
                .collect::<Vec<_>>()
                .join("&"),
        )
    }

    /// The absolute request URI.
    pub fn uri(&self) -> Result<http::Uri, ClientError> {
        let mut url = self.endpoint.url();
        if let Some(query) = self.query_string() {
            url.push('?');
            url.push_str(&query);
        }
        url.parse()
            .map_err(|e| ClientError::SerializationFailed(format!("invalid request uri '{url}': {e}")))
    }

    /// Convert into an [`http::Request`] for engines built on the `http` types.
    pub fn into_http(self) -> Result<http::Request<ByteStream>, ClientError> {
        let uri = self.uri()?;
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    /// Return to the builder form, e.g. to re-sign or re-send.
    #[must_use]
    pub fn to_builder(&self) -> SdkHttpRequestBuilder {
        SdkHttpRequestBuilder {
            method: self.method.clone(),
            host: self.endpoint.host.clone(),
            path: self.endpoint.path.clone(),
            port: self.endpoint.port,
            protocol: self.endpoint.protocol,
            headers: self.headers.clone(),
            trailing_headers: self.trailing_headers.clone(),
            query_items: self.query_items.clone(),
            body: self.body.clone(),
        }
    }
}

/// The mutable form of a request, threaded through the build and finalize
/// phases.
#[derive(Debug, Clone)]
pub struct SdkHttpRequestBuilder {
    method: Method,
    host: String,
    path: String,
    port: Option<u16>,
    protocol: ProtocolType,
    headers: HeaderMap,
    trailing_headers: HeaderMap,
    query_items: Vec<QueryItem>,
    body: ByteStream,
}

impl Default for SdkHttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            host: String::new(),
            path: "/".to_owned(),
            port: None,
            protocol: ProtocolType::Https,
            headers: HeaderMap::new(),
            trailing_headers: HeaderMap::new(),
            query_items: Vec::new(),
            body: ByteStream::NoStream,
        }
    }
}

impl SdkHttpRequestBuilder {
    /// Create an empty `GET /` builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: ProtocolType) -> Self {
        self.protocol = protocol;
        self
    }

    /// Point the builder at a resolved endpoint. The endpoint's base path is
    /// prefixed to the current path.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &Endpoint) -> Self {
        self.host.clone_from(&endpoint.host);
        self.port = endpoint.port;
        self.protocol = endpoint.protocol;
        let base = endpoint.path.trim_end_matches('/');
        if !base.is_empty() {
            self.path = format!("{base}{}", self.path);
        }
        self
    }

    /// Append a header value, keeping existing values for the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append every header in `headers`.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Replace all values of a header.
    #[must_use]
    pub fn update_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Remove a header.
    #[must_use]
    pub fn without_header(mut self, name: &HeaderName) -> Self {
        self.headers.remove(name);
        self
    }

    /// Append a trailing header.
    #[must_use]
    pub fn with_trailer(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.trailing_headers.append(name, value);
        self
    }

    /// Append a query item.
    #[must_use]
    pub fn with_query_item(mut self, item: QueryItem) -> Self {
        self.query_items.push(item);
        self
    }

    /// Append several query items.
    #[must_use]
    pub fn with_query_items(mut self, items: impl IntoIterator<Item = QueryItem>) -> Self {
        self.query_items.extend(items);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: ByteStream) -> Self {
        self.body = body;
        self
    }

    /// The method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The protocol.
    #[must_use]
    pub fn protocol(&self) -> ProtocolType {
        self.protocol
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The query items.
    #[must_use]
    pub fn query_items(&self) -> &[QueryItem] {
        &self.query_items
    }

    /// The body.
    #[must_use]
    pub fn body(&self) -> &ByteStream {
        &self.body
    }

    /// Replace the body in place.
    pub fn set_body(&mut self, body: ByteStream) {
        self.body = body;
    }

    /// Freeze the builder into a request.
    #[must_use]
    pub fn build(self) -> SdkHttpRequest {
        SdkHttpRequest {
            method: self.method,
            endpoint: Endpoint {
                host: self.host,
                path: self.path,
                port: self.port,
                protocol: self.protocol,
            },
            headers: self.headers,
            trailing_headers: self.trailing_headers,
            query_items: self.query_items,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SdkHttpRequestBuilder {
        SdkHttpRequestBuilder::new()
            .with_method(Method::PUT)
            .with_host("bucket.example.com")
            .with_path("/key")
            .with_header(
                HeaderName::from_static("x-test"),
                HeaderValue::from_static("a"),
            )
            .with_header(
                HeaderName::from_static("x-test"),
                HeaderValue::from_static("b"),
            )
            .with_query_item(QueryItem::new("prefix", Some("a b/c".to_owned())))
            .with_query_item(QueryItem::new("uploads", None))
            .with_body(ByteStream::from("payload"))
    }

    #[test]
    fn test_should_build_request() {
        let request = sample().build();
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.host(), "bucket.example.com");
        assert_eq!(request.path(), "/key");
        assert_eq!(request.headers().get_all("x-test").iter().count(), 2);
        assert_eq!(request.endpoint().effective_port(), 443);
    }

    #[test]
    fn test_should_encode_query_string() {
        let request = sample().build();
        assert_eq!(
            request.query_string().as_deref(),
            Some("prefix=a%20b%2Fc&uploads")
        );
        let uri = request.uri().expect("test uri");
        assert_eq!(
            uri.to_string(),
            "https://bucket.example.com/key?prefix=a%20b%2Fc&uploads"
        );
    }

    #[test]
    fn test_should_round_trip_through_builder() {
        let request = sample().with_port(8443).build();
        let rebuilt = request.to_builder().build();
        assert_eq!(rebuilt.endpoint(), request.endpoint());
        assert_eq!(rebuilt.query_items(), request.query_items());
        assert_eq!(rebuilt.headers(), request.headers());
    }

    #[test]
    fn test_should_prefix_endpoint_base_path() {
        let endpoint = Endpoint::from_url("http://localhost:4566/base/").expect("test endpoint");
        let request = SdkHttpRequestBuilder::new()
            .with_path("/items")
            .with_endpoint(&endpoint)
            .build();
        assert_eq!(request.path(), "/base/items");
        assert_eq!(request.uri().expect("test uri").to_string(), "http://localhost:4566/base/items");
    }

    #[test]
    fn test_should_replace_and_remove_headers() {
        let builder = sample()
            .update_header(
                HeaderName::from_static("x-test"),
                HeaderValue::from_static("c"),
            )
            .without_header(&HeaderName::from_static("missing"));
        assert_eq!(builder.headers().get_all("x-test").iter().count(), 1);
        let builder = builder.without_header(&HeaderName::from_static("x-test"));
        assert!(builder.headers().get("x-test").is_none());
    }

    #[test]
    fn test_should_convert_into_http_request() {
        let request = sample().build().into_http().expect("test convert");
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.uri().host(), Some("bucket.example.com"));
        assert_eq!(request.body().length(), Some(7));
    }
}
