//! Per-call context threaded through every step.
//!
//! Attributes set by early steps (the resolved endpoint, the selected auth
//! scheme) stay visible to later steps and to the terminal handler. Typed
//! extension data that has no dedicated field goes into
//! [`Context::extensions_mut`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{Extensions, Method};
use opstack_core::{ClientConfig, ClientLogMode, FlowType};
use opstack_endpoint::ResolvedEndpoint;
use opstack_http::AuthScheme;
use tracing::{Span, info_span};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Produces tokens for idempotent operation inputs.
pub trait IdempotencyTokenGenerator: Send + Sync + fmt::Debug {
    /// A fresh token.
    fn generate_token(&self) -> String;
}

/// Generates random UUID v4 tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdempotencyTokenGenerator;

impl IdempotencyTokenGenerator for UuidIdempotencyTokenGenerator {
    fn generate_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Mutable attributes of one operation invocation.
///
/// # Examples
///
/// ```
/// use opstack_core::ClientConfig;
/// use opstack_middleware::Context;
///
/// let config = ClientConfig::builder().region("eu-west-1").build();
/// let ctx = Context::for_operation(&config, "s3", "GetObject");
/// assert_eq!(ctx.operation(), "GetObject");
/// assert_eq!(ctx.region(), Some("eu-west-1"));
/// assert_eq!(ctx.signing_name(), "s3");
/// ```
#[derive(Debug, TypedBuilder)]
pub struct Context {
    /// Operation name.
    #[builder(setter(into))]
    operation: String,

    /// Service name, substituted into endpoint templates.
    #[builder(setter(into))]
    service_name: String,

    /// Request method.
    #[builder(default = Method::GET)]
    method: Method,

    /// Request path, relative to the endpoint's base path.
    #[builder(default = String::from("/"), setter(into))]
    path: String,

    /// Prefix prepended to the resolved host.
    #[builder(default, setter(strip_option, into))]
    host_prefix: Option<String>,

    #[builder(default, setter(strip_option, into))]
    region: Option<String>,

    /// Retry partition; defaults to the resolved host.
    #[builder(default, setter(strip_option, into))]
    partition_id: Option<String>,

    #[builder(default, setter(strip_option, into))]
    signing_name: Option<String>,

    #[builder(default, setter(strip_option, into))]
    signing_region: Option<String>,

    /// Explicit endpoint URL bypassing metadata resolution.
    #[builder(default, setter(strip_option, into))]
    endpoint_url: Option<String>,

    #[builder(default, setter(skip))]
    endpoint: Option<ResolvedEndpoint>,

    /// Auth schemes supported by the operation, in preference order.
    #[builder(default)]
    auth_schemes: Vec<AuthScheme>,

    #[builder(default, setter(strip_option, into))]
    selected_auth_scheme: Option<String>,

    #[builder(default = Arc::new(UuidIdempotencyTokenGenerator))]
    idempotency_token_generator: Arc<dyn IdempotencyTokenGenerator>,

    #[builder(default)]
    unsigned_payload: bool,

    #[builder(default)]
    flow_type: FlowType,

    #[builder(default, setter(strip_option))]
    expiration: Option<Duration>,

    #[builder(default)]
    log_mode: ClientLogMode,

    #[builder(default, setter(skip))]
    attempt: u32,

    #[builder(default, setter(skip))]
    extensions: Extensions,

    /// Span every step of the operation runs in.
    #[builder(default = Span::none())]
    span: Span,
}

impl Context {
    /// A context for `operation` on `service`, seeded from the client
    /// configuration.
    #[must_use]
    pub fn for_operation(config: &ClientConfig, service: &str, operation: &str) -> Self {
        let span = info_span!("operation", service, operation);
        let mut ctx = Self::builder()
            .operation(operation)
            .service_name(service)
            .log_mode(config.log_mode)
            .span(span)
            .build();
        ctx.region.clone_from(&config.region);
        ctx.partition_id.clone_from(&config.partition_id);
        ctx.endpoint_url.clone_from(&config.endpoint);
        ctx
    }

    /// The operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Set the request method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set the request path.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// The host prefix.
    #[must_use]
    pub fn host_prefix(&self) -> Option<&str> {
        self.host_prefix.as_deref()
    }

    /// Set the host prefix.
    pub fn set_host_prefix(&mut self, prefix: impl Into<String>) {
        self.host_prefix = Some(prefix.into());
    }

    /// The region.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Set the region.
    pub fn set_region(&mut self, region: impl Into<String>) {
        self.region = Some(region.into());
    }

    /// The retry partition: the configured id, else the resolved host, else
    /// the service name.
    #[must_use]
    pub fn partition_id(&self) -> &str {
        self.partition_id
            .as_deref()
            .or_else(|| self.endpoint.as_ref().map(|e| e.endpoint.host.as_str()))
            .unwrap_or(&self.service_name)
    }

    /// Set the retry partition.
    pub fn set_partition_id(&mut self, partition_id: impl Into<String>) {
        self.partition_id = Some(partition_id.into());
    }

    /// The service name to sign for, defaulting to the service name.
    #[must_use]
    pub fn signing_name(&self) -> &str {
        self.signing_name.as_deref().unwrap_or(&self.service_name)
    }

    /// Set the signing name.
    pub fn set_signing_name(&mut self, name: impl Into<String>) {
        self.signing_name = Some(name.into());
    }

    /// The region to sign for, defaulting to the region.
    #[must_use]
    pub fn signing_region(&self) -> Option<&str> {
        self.signing_region.as_deref().or(self.region.as_deref())
    }

    /// Set the signing region.
    pub fn set_signing_region(&mut self, region: impl Into<String>) {
        self.signing_region = Some(region.into());
    }

    /// The explicit endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// The endpoint resolved during the build step.
    #[must_use]
    pub fn endpoint(&self) -> Option<&ResolvedEndpoint> {
        self.endpoint.as_ref()
    }

    /// Record the resolved endpoint.
    pub fn set_endpoint(&mut self, endpoint: ResolvedEndpoint) {
        self.endpoint = Some(endpoint);
    }

    /// The supported auth schemes.
    #[must_use]
    pub fn auth_schemes(&self) -> &[AuthScheme] {
        &self.auth_schemes
    }

    /// Choose an auth scheme by id.
    pub fn set_selected_auth_scheme(&mut self, scheme_id: impl Into<String>) {
        self.selected_auth_scheme = Some(scheme_id.into());
    }

    /// The scheme to sign with: the selected one when supported, else the
    /// first supported one, else anonymous.
    #[must_use]
    pub fn auth_scheme(&self) -> AuthScheme {
        let selected = self
            .selected_auth_scheme
            .as_deref()
            .and_then(|id| self.auth_schemes.iter().find(|s| s.scheme_id == id));
        selected
            .or_else(|| self.auth_schemes.first())
            .cloned()
            .unwrap_or_else(AuthScheme::no_auth)
    }

    /// The idempotency token generator.
    #[must_use]
    pub fn idempotency_token_generator(&self) -> &dyn IdempotencyTokenGenerator {
        self.idempotency_token_generator.as_ref()
    }

    /// Whether the payload is signed as unsigned.
    #[must_use]
    pub fn unsigned_payload(&self) -> bool {
        self.unsigned_payload
    }

    /// How the signed request is delivered.
    #[must_use]
    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    /// Validity of a presigned request.
    #[must_use]
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    /// What the logger middleware records.
    #[must_use]
    pub fn log_mode(&self) -> ClientLogMode {
        self.log_mode
    }

    /// Set what the logger middleware records.
    pub fn set_log_mode(&mut self, mode: ClientLogMode) {
        self.log_mode = mode;
    }

    /// The current attempt, starting at 1. Zero before the retry middleware
    /// has run.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
    }

    /// Typed extension data.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable typed extension data.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The operation span.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}
