//! Wire document tree and XML reader/writer for the opstack runtime.
//!
//! A [`Document`] is an arena of element, attribute, and text nodes. Typed
//! values are bound to it through [`Reader`] and [`Writer`] cursors, and
//! per-type [`ReadingClosure`]/[`WritingClosure`] values compose those
//! cursors into list, map, and structure bindings. The document closures
//! adapt a root binding to the format-agnostic closures of
//! `opstack-readwrite`.
//!
//! ```
//! use opstack_xml::{Document, NodeInfo, Reader, Writer};
//!
//! let mut doc = Document::new(NodeInfo::new("Object"));
//! Writer::new(&mut doc).child("Key").write(Some("a.txt")).unwrap();
//! let bytes = doc.to_bytes().unwrap();
//!
//! let mut parsed = Document::parse(&bytes).unwrap();
//! let key: Option<String> = Reader::new(&mut parsed).child("Key").read().unwrap();
//! assert_eq!(key.as_deref(), Some("a.txt"));
//! ```

mod closure;
mod document;
mod error;
mod node;
mod reader;
mod value;
mod writer;

pub use closure::{
    CONTENT_TYPE, ReadingClosure, WritingClosure, list_reader, list_writer, map_reader, map_writer, timestamp_reader,
    timestamp_writer, value_reader, value_writer, xml_document_reading_closure, xml_document_writing_closure,
};
pub use document::Document;
pub use error::XmlError;
pub use node::{Namespace, Node, NodeId, NodeInfo, NodeLocation};
pub use reader::{MAP_ENTRY, Reader};
pub use value::{Readable, Writable};
pub use writer::Writer;
