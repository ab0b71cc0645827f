//! Reusable per-type reading and writing closures.
//!
//! Generated or hand-written bindings compose these: a structure's closure
//! calls the closures of its members, and collections wrap a member closure.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opstack_readwrite::{
    DocumentReadingClosure, DocumentWritingClosure, TimestampFormat, document_reading_closure, document_writing_closure,
};
use tracing::trace;

use crate::document::Document;
use crate::error::XmlError;
use crate::node::NodeInfo;
use crate::reader::Reader;
use crate::value::{Readable, Writable};
use crate::writer::Writer;

/// Content type of XML documents.
pub const CONTENT_TYPE: &str = "application/xml";

/// Reads a `T` from the reader's current node.
pub type ReadingClosure<T> = Arc<dyn Fn(&mut Reader<'_>) -> Result<T, XmlError> + Send + Sync>;

/// Writes a `T` into the writer's current node.
pub type WritingClosure<T> = Arc<dyn Fn(&T, &mut Writer<'_>) -> Result<(), XmlError> + Send + Sync>;

/// Closure reading a required scalar.
#[must_use]
pub fn value_reader<T: Readable + 'static>() -> ReadingClosure<T> {
    Arc::new(|reader: &mut Reader<'_>| reader.value::<T>())
}

/// Closure writing a scalar.
#[must_use]
pub fn value_writer<T: Writable + 'static>() -> WritingClosure<T> {
    Arc::new(|value: &T, writer: &mut Writer<'_>| writer.write_value(value))
}

/// Closure reading a required timestamp.
#[must_use]
pub fn timestamp_reader(format: TimestampFormat) -> ReadingClosure<DateTime<Utc>> {
    Arc::new(move |reader: &mut Reader<'_>| {
        reader
            .read_timestamp(format)?
            .ok_or_else(|| XmlError::missing(reader.info().to_string()))
    })
}

/// Closure writing a timestamp.
#[must_use]
pub fn timestamp_writer(format: TimestampFormat) -> WritingClosure<DateTime<Utc>> {
    Arc::new(move |value: &DateTime<Utc>, writer: &mut Writer<'_>| writer.write_timestamp(Some(value), format))
}

/// Closure reading a list whose members are read by `member`. An absent
/// list reads as empty.
#[must_use]
pub fn list_reader<T: 'static>(member: ReadingClosure<T>, member_info: NodeInfo, flattened: bool) -> ReadingClosure<Vec<T>> {
    Arc::new(move |reader: &mut Reader<'_>| {
        let values = reader.read_list(&*member, member_info.clone(), flattened)?;
        Ok(values.unwrap_or_default())
    })
}

/// Closure writing a list whose members are written by `member`.
#[must_use]
pub fn list_writer<T: 'static>(member: WritingClosure<T>, member_info: NodeInfo, flattened: bool) -> WritingClosure<Vec<T>> {
    Arc::new(move |values: &Vec<T>, writer: &mut Writer<'_>| {
        writer.write_list(Some(values.as_slice()), &*member, member_info.clone(), flattened)
    })
}

/// Closure reading a string-keyed map. An absent map reads as empty.
#[must_use]
pub fn map_reader<V: 'static>(
    value: ReadingClosure<V>,
    key_info: NodeInfo,
    value_info: NodeInfo,
    flattened: bool,
) -> ReadingClosure<HashMap<String, V>> {
    Arc::new(move |reader: &mut Reader<'_>| {
        let values = reader.read_map(&*value, key_info.clone(), value_info.clone(), flattened)?;
        Ok(values.unwrap_or_default())
    })
}

/// Closure writing a string-keyed map.
#[must_use]
pub fn map_writer<V: 'static>(
    value: WritingClosure<V>,
    key_info: NodeInfo,
    value_info: NodeInfo,
    flattened: bool,
) -> WritingClosure<HashMap<String, V>> {
    Arc::new(move |values: &HashMap<String, V>, writer: &mut Writer<'_>| {
        writer.write_map(Some(values), &*value, key_info.clone(), value_info.clone(), flattened)
    })
}

/// Document closure parsing an XML body and reading its root with `read`.
///
/// A non-empty `root` name must match the document's root element.
#[must_use]
pub fn xml_document_reading_closure<T: 'static>(root: NodeInfo, read: ReadingClosure<T>) -> DocumentReadingClosure<T> {
    document_reading_closure(move |data: &[u8]| {
        let mut doc = Document::parse(data)?;
        let found = doc.node(doc.root()).info().name.clone();
        if !root.name.is_empty() && found != root.name {
            return Err(XmlError::UnexpectedRoot {
                expected: root.name.clone(),
                found,
            }
            .into());
        }
        trace!(root = %found, bytes = data.len(), "reading XML document");
        let mut reader = Reader::new(&mut doc);
        Ok(read(&mut reader)?)
    })
}

/// Document closure writing a value under a `root` element.
#[must_use]
pub fn xml_document_writing_closure<T: 'static>(root: NodeInfo, write: WritingClosure<T>) -> DocumentWritingClosure<T> {
    document_writing_closure(move |value: &T| {
        let mut doc = Document::new(root.clone());
        write(value, &mut Writer::new(&mut doc))?;
        let body = doc.to_bytes()?;
        trace!(root = %root, bytes = body.len(), "wrote XML document");
        Ok(Bytes::from(body))
    })
}
