//! Signer capability and auth scheme selection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opstack_core::{ClientError, FlowType};
use typed_builder::TypedBuilder;

use crate::request::SdkHttpRequestBuilder;

/// Inputs a signer needs beyond the request itself.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct SigningParams {
    /// Service name used in the credential scope.
    #[builder(setter(into))]
    pub signing_name: String,

    /// Region used in the credential scope.
    #[builder(setter(into))]
    pub signing_region: String,

    /// Signature version, e.g. `v4`.
    #[builder(default = String::from("v4"), setter(into))]
    pub signature_version: String,

    /// Whether to sign with an unsigned payload hash.
    #[builder(default)]
    pub unsigned_payload: bool,

    /// Whether the request is sent or presigned.
    #[builder(default)]
    pub flow_type: FlowType,

    /// Validity of a presigned request.
    #[builder(default, setter(strip_option))]
    pub expiration: Option<Duration>,
}

/// Attaches credentials to an outbound request. Implemented by callers.
#[async_trait]
pub trait Signer: Send + Sync + fmt::Debug {
    /// Sign the request, returning the signed builder.
    async fn sign(
        &self,
        request: SdkHttpRequestBuilder,
        params: &SigningParams,
    ) -> Result<SdkHttpRequestBuilder, ClientError>;
}

/// Signer for operations that require no authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthSigner;

#[async_trait]
impl Signer for NoAuthSigner {
    async fn sign(
        &self,
        request: SdkHttpRequestBuilder,
        _params: &SigningParams,
    ) -> Result<SdkHttpRequestBuilder, ClientError> {
        Ok(request)
    }
}

/// A named authentication scheme and the signer implementing it.
#[derive(Debug, Clone)]
pub struct AuthScheme {
    /// Scheme identifier, e.g. `sigv4` or `noAuth`.
    pub scheme_id: String,
    /// The signer.
    pub signer: Arc<dyn Signer>,
}

impl AuthScheme {
    /// Scheme id of [`AuthScheme::no_auth`].
    pub const NO_AUTH: &str = "noAuth";

    /// Create a scheme.
    pub fn new(scheme_id: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            signer,
        }
    }

    /// The anonymous scheme.
    #[must_use]
    pub fn no_auth() -> Self {
        Self::new(Self::NO_AUTH, Arc::new(NoAuthSigner))
    }
}
