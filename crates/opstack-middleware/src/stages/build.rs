//! Build-step middleware: fix the destination and request-wide headers.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use http::HeaderValue;
use md5::{Digest, Md5};
use opstack_core::{ClientError, SdkResult, ServiceError};
use opstack_endpoint::{EndpointParams, EndpointResolver};
use opstack_http::SdkHttpRequestBuilder;
use tracing::{debug, warn};

use crate::context::Context;
use crate::middleware::{Middleware, Next};

/// Header carrying the base64 MD5 digest of the body.
pub const CONTENT_MD5: &str = "content-md5";

/// Resolves the endpoint from the context and points the request at it.
///
/// The resolved endpoint is recorded in the context, and a credential scope
/// on it overrides the signing name and region. Resolution failures are
/// configuration defects and end the operation.
#[derive(Debug, Clone)]
pub struct EndpointResolverMiddleware {
    resolver: Arc<dyn EndpointResolver>,
}

impl EndpointResolverMiddleware {
    /// Middleware id.
    pub const ID: &str = "EndpointResolver";

    /// Create the middleware.
    #[must_use]
    pub fn new(resolver: Arc<dyn EndpointResolver>) -> Self {
        Self { resolver }
    }
}

impl<O, E> Middleware<SdkHttpRequestBuilder, O, E> for EndpointResolverMiddleware
where
    O: Send + 'static,
    E: ServiceError,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        input: SdkHttpRequestBuilder,
        next: Next<'a, SdkHttpRequestBuilder, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        let params = EndpointParams {
            service: ctx.service_name().to_owned(),
            region: ctx.region().map(str::to_owned),
            endpoint_url: ctx.endpoint_url().map(str::to_owned),
        };
        let resolved = match self.resolver.resolve(&params) {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(service = %params.service, error = %err, "endpoint resolution failed");
                return Box::pin(async move { Err(ClientError::from(err).into()) });
            }
        };

        let mut endpoint = resolved.endpoint.clone();
        if let Some(prefix) = ctx.host_prefix() {
            endpoint.host = format!("{prefix}{}", endpoint.host);
        }
        debug!(url = %endpoint.url(), "resolved operation endpoint");
        if let Some(name) = &resolved.signing_name {
            ctx.set_signing_name(name.clone());
        }
        if let Some(region) = &resolved.signing_region {
            ctx.set_signing_region(region.clone());
        }
        ctx.set_endpoint(resolved);
        next.run(ctx, input.with_endpoint(&endpoint))
    }
}

/// Sets `Content-MD5` for buffered bodies that do not carry one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentMd5Middleware;

impl ContentMd5Middleware {
    /// Middleware id.
    pub const ID: &str = "ContentMd5";
}

impl<O, E> Middleware<SdkHttpRequestBuilder, O, E> for ContentMd5Middleware
where
    O: Send + 'static,
    E: ServiceError,
{
    fn id(&self) -> &str {
        Self::ID
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        mut input: SdkHttpRequestBuilder,
        next: Next<'a, SdkHttpRequestBuilder, O, E>,
    ) -> BoxFuture<'a, SdkResult<O, E>> {
        if !input.headers().contains_key(CONTENT_MD5) {
            if let Some(data) = input.body().as_bytes() {
                let digest = STANDARD.encode(Md5::digest(data));
                match HeaderValue::from_str(&digest) {
                    Ok(value) => {
                        input.headers_mut().insert(CONTENT_MD5, value);
                    }
                    Err(err) => {
                        return Box::pin(async move { Err(ClientError::SerializationFailed(err.to_string()).into()) });
                    }
                }
            } else if input.body().is_stream() {
                debug!("skipping Content-MD5 for streaming body");
            }
        }
        next.run(ctx, input)
    }
}
