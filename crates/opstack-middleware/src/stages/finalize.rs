//! Finalize-step middleware: framing headers and signing.
//!
//! These run inside the retry middleware, so they apply again to every
//! attempt.

use futures::future::BoxFuture;
use http::HeaderValue;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use opstack_core::{ClientError, SdkResult, ServiceError};
use opstack_http::{AuthScheme, SdkHttpRequestBuilder, SigningParams};
use tracing::{debug, trace};

use crate::context::Context;
use crate::middleware::{Middleware, Next};

/// Signature version used when the resolved endpoint names none.
const DEFAULT_SIGNATURE_VERSION: &str = "v4";

/// Sets `Content-Length` for bodies of known length and chunked transfer
/// encoding for streams of unknown length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLengthMiddleware;

impl ContentLengthMiddleware {
    /// Middleware id.
    pub const ID: &str = "ContentLength";
}

impl<O, E> Middleware<SdkHttpRequestBuilder, O, E> for ContentLengthMiddleware
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
        match input.body().length() {
            Some(length) => {
                input.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(length));
            }
            None => {
                input.headers_mut().remove(CONTENT_LENGTH);
                input
                    .headers_mut()
                    .insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
        }
        next.run(ctx, input)
    }
}

/// Signs the request with the context's auth scheme.
///
/// Signing parameters come from the context, which the endpoint resolver has
/// already updated with any credential scope. The anonymous scheme passes the
/// request through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignerMiddleware;

impl SignerMiddleware {
    /// Middleware id.
    pub const ID: &str = "Signer";
}

fn signing_params(ctx: &Context, scheme: &AuthScheme) -> Result<SigningParams, ClientError> {
    let region = match ctx.signing_region() {
        Some(region) => region.to_owned(),
        None if scheme.scheme_id == AuthScheme::NO_AUTH => String::new(),
        None => {
            return Err(ClientError::Auth(format!(
                "no signing region for scheme '{}' in operation '{}'",
                scheme.scheme_id,
                ctx.operation()
            )));
        }
    };
    let signature_version = ctx
        .endpoint()
        .map_or(DEFAULT_SIGNATURE_VERSION, |endpoint| endpoint.signature_version.as_str());
    Ok(SigningParams {
        signing_name: ctx.signing_name().to_owned(),
        signing_region: region,
        signature_version: signature_version.to_owned(),
        unsigned_payload: ctx.unsigned_payload(),
        flow_type: ctx.flow_type(),
        expiration: ctx.expiration(),
    })
}

impl<O, E> Middleware<SdkHttpRequestBuilder, O, E> for SignerMiddleware
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
        Box::pin(async move {
            let scheme = ctx.auth_scheme();
            let params = signing_params(ctx, &scheme)?;
            trace!(scheme = %scheme.scheme_id, signing_name = %params.signing_name, "signing request");
            let signed = scheme.signer.sign(input, &params).await?;
            debug!(scheme = %scheme.scheme_id, attempt = ctx.attempt(), "signed request");
            next.run(ctx, signed).await
        })
    }
}
