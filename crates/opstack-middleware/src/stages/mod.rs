//! Built-in middleware, grouped by the step they belong to.

mod build;
mod deserialize;
mod finalize;
mod initialize;
mod retry;
mod serialize;

pub use build::{CONTENT_MD5, ContentMd5Middleware, EndpointResolverMiddleware};
pub use deserialize::{DeserializeMiddleware, LoggerMiddleware};
pub use finalize::{ContentLengthMiddleware, SignerMiddleware};
pub use initialize::{IdempotencyTokenMiddleware, UrlPathMiddleware};
pub use retry::{INVOCATION_ID_HEADER, REQUEST_HEADER, RetryMiddleware};
pub use serialize::{BodyMiddleware, HeaderMiddleware, QueryItemMiddleware};
