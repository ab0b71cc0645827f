//! JSON document closures backed by `serde_json`.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::closure::{DocumentReadingClosure, DocumentWritingClosure, document_reading_closure, document_writing_closure};

/// Content type of JSON documents.
pub const CONTENT_TYPE: &str = "application/json";

/// Reading closure decoding a JSON body. An empty body reads as `{}`.
#[must_use]
pub fn reading_closure<T: DeserializeOwned + 'static>() -> DocumentReadingClosure<T> {
    document_reading_closure(|data: &[u8]| {
        let data = if data.iter().all(u8::is_ascii_whitespace) {
            b"{}".as_slice()
        } else {
            data
        };
        Ok(serde_json::from_slice(data)?)
    })
}

/// Writing closure encoding a value as a JSON body.
#[must_use]
pub fn writing_closure<T: Serialize + 'static>() -> DocumentWritingClosure<T> {
    document_writing_closure(|value: &T| Ok(Bytes::from(serde_json::to_vec(value)?)))
}
