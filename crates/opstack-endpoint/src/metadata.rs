//! Endpoint metadata and the field-by-field merge.

use opstack_http::{Endpoint, ProtocolType};
use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// Protocol used when no supported protocol is listed.
pub const DEFAULT_PROTOCOL: &str = "https";

/// Signature version used when none is listed.
pub const DEFAULT_SIGNER: &str = "v4";

/// Protocols in preference order.
pub const PROTOCOL_PRIORITY: &[&str] = &["https", "http"];

/// Signature versions in preference order.
pub const SIGNER_PRIORITY: &[&str] = &["v4"];

/// A custom signing constraint for an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialScope {
    /// Region to sign for, when it differs from the client region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Service name to sign for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
}

/// Routing metadata for a service endpoint.
///
/// Two instances are merged at resolution time: the one supplied for the call
/// and the service defaults. Call-supplied fields win when present and
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpointMetadata {
    /// Host name template, e.g. `{service}.{region}.{dnsSuffix}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    /// Supported protocols.
    #[serde(default)]
    pub protocols: Vec<String>,

    /// Signing constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_scope: Option<CredentialScope>,

    /// Supported signature versions (e.g. `v4`).
    #[serde(default)]
    pub signature_versions: Vec<String>,
}

/// The effective destination and signing settings for one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedEndpoint {
    /// The destination. Its host may still contain template variables when the
    /// metadata carried an unrendered template.
    pub endpoint: Endpoint,
    /// Service name to sign for, when the credential scope overrides it.
    pub signing_name: Option<String>,
    /// Region to sign for, when the credential scope overrides it.
    pub signing_region: Option<String>,
    /// Signature version to sign with.
    pub signature_version: String,
}

impl ServiceEndpointMetadata {
    /// Metadata with only a host name.
    pub fn with_host_name(host_name: impl Into<String>) -> Self {
        Self {
            host_name: Some(host_name.into()),
            ..Self::default()
        }
    }

    /// Merge with `defaults`, preferring fields set on `self`.
    #[must_use]
    pub fn merge(&self, defaults: &Self) -> Self {
        let own_scope = self.credential_scope.as_ref();
        let default_scope = defaults.credential_scope.as_ref();
        let scope = CredentialScope {
            region: own_scope
                .and_then(|s| s.region.clone())
                .or_else(|| default_scope.and_then(|s| s.region.clone())),
            service_id: own_scope
                .and_then(|s| s.service_id.clone())
                .or_else(|| default_scope.and_then(|s| s.service_id.clone())),
        };

        Self {
            host_name: self.host_name.clone().or_else(|| defaults.host_name.clone()),
            protocols: pick_non_empty(&self.protocols, &defaults.protocols),
            credential_scope: Some(scope),
            signature_versions: pick_non_empty(&self.signature_versions, &defaults.signature_versions),
        }
    }

    /// The highest-priority supported signature version, or the default.
    pub(crate) fn selected_signature_version(&self) -> &'static str {
        select_by_priority(&self.signature_versions, SIGNER_PRIORITY, DEFAULT_SIGNER)
    }

    /// Resolve against `defaults` into one concrete endpoint.
    ///
    /// The host name is taken verbatim; template rendering happens before
    /// this step (see [`render_host_template`](crate::render_host_template)).
    pub fn resolve(&self, defaults: &Self) -> Result<ResolvedEndpoint, EndpointError> {
        let merged = self.merge(defaults);
        let host = merged.host_name.clone().ok_or(EndpointError::HostnameMissing)?;
        let protocol = select_by_priority(&merged.protocols, PROTOCOL_PRIORITY, DEFAULT_PROTOCOL);
        let signature_version = merged.selected_signature_version();
        let scope = merged.credential_scope.unwrap_or_default();

        Ok(ResolvedEndpoint {
            endpoint: Endpoint::new(host, protocol_type(protocol)),
            signing_name: scope.service_id,
            signing_region: scope.region,
            signature_version: signature_version.to_owned(),
        })
    }
}

fn pick_non_empty(own: &[String], defaults: &[String]) -> Vec<String> {
    if own.is_empty() {
        defaults.to_vec()
    } else {
        own.to_vec()
    }
}

/// The first entry of `priority` present in `supported`, or `fallback`.
fn select_by_priority<'a>(supported: &[String], priority: &[&'a str], fallback: &'a str) -> &'a str {
    priority
        .iter()
        .find(|candidate| supported.iter().any(|s| s.eq_ignore_ascii_case(candidate)))
        .copied()
        .unwrap_or(fallback)
}

fn protocol_type(protocol: &str) -> ProtocolType {
    if protocol == "http" {
        ProtocolType::Http
    } else {
        ProtocolType::Https
    }
}
