//! The transport handler at the bottom of an operation stack.

use futures::future::BoxFuture;
use opstack_core::{SdkResult, ServiceError};
use opstack_http::{SdkHttpClient, SdkHttpRequest};

use crate::context::Context;
use crate::middleware::Handler;
use crate::stack::OperationOutput;

/// Sends the finished request through an [`SdkHttpClient`].
///
/// The response is returned once its status is final, whatever that status
/// is; turning error statuses into errors is left to the deserialize step.
#[derive(Debug, Clone)]
pub struct HttpClientHandler {
    client: SdkHttpClient,
}

impl HttpClientHandler {
    /// Create a handler over a client.
    #[must_use]
    pub fn new(client: SdkHttpClient) -> Self {
        Self { client }
    }

    /// The client.
    #[must_use]
    pub fn client(&self) -> &SdkHttpClient {
        &self.client
    }
}

impl<O, E> Handler<SdkHttpRequest, OperationOutput<O>, E> for HttpClientHandler
where
    O: Send + 'static,
    E: ServiceError,
{
    fn handle<'a>(&'a self, _ctx: &'a mut Context, input: SdkHttpRequest) -> BoxFuture<'a, SdkResult<OperationOutput<O>, E>> {
        Box::pin(async move {
            let response = self.client.send(input).await?;
            Ok(OperationOutput::new(response))
        })
    }
}
