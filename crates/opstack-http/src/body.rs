//! Request and response body model.

use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use opstack_core::{BoxError, ClientError};
use parking_lot::Mutex;

type ChunkStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// A message body: absent, fully buffered, or a one-shot stream.
///
/// Cloning a [`ByteStream::Stream`] shares the underlying stream; whichever
/// clone reads it first consumes it for all of them.
#[derive(Clone, Default)]
pub enum ByteStream {
    /// No body.
    #[default]
    NoStream,
    /// A buffered body.
    Data(Bytes),
    /// A one-shot stream of chunks with an optional known length.
    Stream {
        /// The shared stream slot, emptied once read.
        source: Arc<Mutex<Option<ChunkStream>>>,
        /// Total length in bytes, if known up front.
        length: Option<u64>,
    },
}

impl ByteStream {
    /// Wrap a chunk stream as a one-shot body.
    pub fn from_stream<S>(stream: S, length: Option<u64>) -> Self
    where
        S: futures::Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self::Stream {
            source: Arc::new(Mutex::new(Some(stream.boxed()))),
            length,
        }
    }

    /// Known body length in bytes. `None` for streams of unknown length.
    #[must_use]
    pub fn length(&self) -> Option<u64> {
        match self {
            Self::NoStream => Some(0),
            Self::Data(data) => Some(data.len() as u64),
            Self::Stream { length, .. } => *length,
        }
    }

    /// Whether the body is known to be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length() == Some(0)
    }

    /// Whether this body is a stream.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }

    /// The buffered bytes, when the body is not a stream.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Data(data) => Some(data),
            Self::NoStream | Self::Stream { .. } => None,
        }
    }

    /// Collect the whole body.
    ///
    /// Returns `None` for [`ByteStream::NoStream`]. Streams can be read once;
    /// a second read fails with [`ClientError::StreamConsumed`].
    pub async fn read_data(&self) -> Result<Option<Bytes>, ClientError> {
        match self {
            Self::NoStream => Ok(None),
            Self::Data(data) => Ok(Some(data.clone())),
            Self::Stream { source, length } => {
                let Some(mut stream) = source.lock().take() else {
                    return Err(ClientError::StreamConsumed);
                };
                let capacity = length
                    .and_then(|len| usize::try_from(len).ok())
                    .unwrap_or_default();
                let mut buf = BytesMut::with_capacity(capacity);
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk.map_err(ClientError::Network)?);
                }
                Ok(Some(buf.freeze()))
            }
        }
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStream => f.write_str("NoStream"),
            Self::Data(data) => f.debug_tuple("Data").field(&data.len()).finish(),
            Self::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

impl From<Bytes> for ByteStream {
    fn from(data: Bytes) -> Self {
        Self::Data(data)
    }
}

impl From<Vec<u8>> for ByteStream {
    fn from(data: Vec<u8>) -> Self {
        Self::Data(Bytes::from(data))
    }
}

impl From<String> for ByteStream {
    fn from(data: String) -> Self {
        Self::Data(Bytes::from(data))
    }
}

impl From<&'static str> for ByteStream {
    fn from(data: &'static str) -> Self {
        Self::Data(Bytes::from_static(data.as_bytes()))
    }
}
