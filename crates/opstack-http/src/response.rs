//! Observable response handle.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use opstack_core::ResponseParts;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::body::ByteStream;

fn is_final(status: StatusCode) -> bool {
    status.as_u16() >= 200
}

#[derive(Debug)]
struct Inner {
    headers: Mutex<HeaderMap>,
    body: Mutex<ByteStream>,
    status: watch::Sender<StatusCode>,
}

/// A response shared between the transport producing it and the pipeline
/// consuming it.
///
/// The status code starts provisional (`102 Processing` unless given) and
/// moves to a final (`>= 200`) value exactly once. Later updates are ignored.
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    inner: Arc<Inner>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new(HeaderMap::new(), ByteStream::NoStream, StatusCode::PROCESSING)
    }
}

impl HttpResponse {
    /// Create a response handle.
    #[must_use]
    pub fn new(headers: HeaderMap, body: ByteStream, status: StatusCode) -> Self {
        let (status, _) = watch::channel(status);
        Self {
            inner: Arc::new(Inner {
                headers: Mutex::new(headers),
                body: Mutex::new(body),
                status,
            }),
        }
    }

    /// The current status code, provisional or final.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        *self.inner.status.borrow()
    }

    /// Update the status code.
    ///
    /// Returns `false` when the update was ignored because the status is
    /// already final.
    pub fn set_status_code(&self, status: StatusCode) -> bool {
        self.inner.status.send_if_modified(|current| {
            if is_final(*current) {
                return false;
            }
            *current = status;
            true
        })
    }

    /// Wait until the status code is final and return it.
    ///
    /// Returns immediately once the status is already final.
    pub async fn wait_for_final_status_code(&self) -> StatusCode {
        let mut rx = self.inner.status.subscribe();
        match rx.wait_for(|status| is_final(*status)).await {
            Ok(status) => *status,
            // The sender lives as long as `self`, so the channel cannot close here.
            Err(_) => self.status_code(),
        }
    }

    /// A snapshot of the headers.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.inner.headers.lock().clone()
    }

    /// A single header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .headers
            .lock()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Append headers, keeping existing values.
    pub fn add_headers(&self, headers: HeaderMap) {
        let mut current = self.inner.headers.lock();
        for (name, value) in &headers {
            current.append(name.clone(), value.clone());
        }
    }

    /// The body.
    #[must_use]
    pub fn body(&self) -> ByteStream {
        self.inner.body.lock().clone()
    }

    /// Replace the body.
    pub fn set_body(&self, body: ByteStream) {
        *self.inner.body.lock() = body;
    }

    /// Status and header snapshot for error reporting.
    #[must_use]
    pub fn parts(&self) -> ResponseParts {
        ResponseParts::new(self.status_code(), self.headers())
    }
}
