//! Pluggable endpoint resolvers.

use std::fmt;

use opstack_http::Endpoint;
use tracing::debug;

use crate::error::EndpointError;
use crate::metadata::{ResolvedEndpoint, ServiceEndpointMetadata};
use crate::template::render_host_template;

/// Call-time inputs to endpoint resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointParams {
    /// Service name substituted for `{service}`.
    pub service: String,
    /// Region substituted for `{region}`.
    pub region: Option<String>,
    /// Explicit endpoint URL that bypasses metadata resolution.
    pub endpoint_url: Option<String>,
}

/// Resolves the destination of a call.
pub trait EndpointResolver: Send + Sync + fmt::Debug {
    /// Resolve `params` into a concrete endpoint.
    fn resolve(&self, params: &EndpointParams) -> Result<ResolvedEndpoint, EndpointError>;
}

/// Resolver backed by call metadata merged over service defaults.
///
/// Host templates are rendered with `service`, `region`, and `dnsSuffix`
/// before the merge result is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultEndpointResolver {
    call: ServiceEndpointMetadata,
    defaults: ServiceEndpointMetadata,
    dns_suffix: String,
}

impl DefaultEndpointResolver {
    /// DNS suffix used unless overridden.
    pub const DEFAULT_DNS_SUFFIX: &str = "amazonaws.com";

    /// Create a resolver over service defaults.
    #[must_use]
    pub fn new(defaults: ServiceEndpointMetadata) -> Self {
        Self {
            call: ServiceEndpointMetadata::default(),
            defaults,
            dns_suffix: Self::DEFAULT_DNS_SUFFIX.to_owned(),
        }
    }

    /// Set call-specific metadata merged over the defaults.
    #[must_use]
    pub fn with_call_metadata(mut self, call: ServiceEndpointMetadata) -> Self {
        self.call = call;
        self
    }

    /// Set the DNS suffix substituted for `{dnsSuffix}`.
    #[must_use]
    pub fn with_dns_suffix(mut self, dns_suffix: impl Into<String>) -> Self {
        self.dns_suffix = dns_suffix.into();
        self
    }
}

impl EndpointResolver for DefaultEndpointResolver {
    fn resolve(&self, params: &EndpointParams) -> Result<ResolvedEndpoint, EndpointError> {
        if let Some(url) = &params.endpoint_url {
            let endpoint = Endpoint::from_url(url).map_err(|e| EndpointError::InvalidUrl(e.to_string()))?;
            let merged = self.call.merge(&self.defaults);
            let scope = merged.credential_scope.clone().unwrap_or_default();
            debug!(url = %url, "using explicit endpoint url");
            return Ok(ResolvedEndpoint {
                endpoint,
                signing_name: scope.service_id,
                signing_region: scope.region,
                signature_version: merged.selected_signature_version().to_owned(),
            });
        }

        let mut resolved = self.call.resolve(&self.defaults)?;
        resolved.endpoint.host = render_host_template(&resolved.endpoint.host, |name| match name {
            "service" => Some(params.service.as_str()),
            "region" => params.region.as_deref(),
            "dnsSuffix" => Some(self.dns_suffix.as_str()),
            _ => None,
        })?;
        debug!(host = %resolved.endpoint.host, protocol = %resolved.endpoint.protocol, "resolved endpoint");
        Ok(resolved)
    }
}
