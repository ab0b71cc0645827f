//! Document-level closures.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::ReadWriteError;

/// Decodes a whole response body into a value.
pub type DocumentReadingClosure<T> = Arc<dyn Fn(&[u8]) -> Result<T, ReadWriteError> + Send + Sync>;

/// Encodes a value into a whole request body.
pub type DocumentWritingClosure<T> = Arc<dyn Fn(&T) -> Result<Bytes, ReadWriteError> + Send + Sync>;

/// Wrap a function as a [`DocumentReadingClosure`].
pub fn document_reading_closure<T, F>(f: F) -> DocumentReadingClosure<T>
where
    F: Fn(&[u8]) -> Result<T, ReadWriteError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a function as a [`DocumentWritingClosure`].
pub fn document_writing_closure<T, F>(f: F) -> DocumentWritingClosure<T>
where
    F: Fn(&T) -> Result<Bytes, ReadWriteError> + Send + Sync + 'static,
{
    Arc::new(f)
}
