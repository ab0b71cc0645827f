//! Format-agnostic serialization seams for the opstack runtime.
//!
//! Operations serialize their input and deserialize their output through
//! document closures: a [`DocumentWritingClosure`] turns a value into a body,
//! and a [`DocumentReadingClosure`] turns a body back into a value. Wire
//! formats (XML in `opstack-xml`, JSON in [`json`]) supply the closures, so
//! the pipeline never depends on a concrete format.

mod closure;
mod error;
pub mod json;
mod timestamp;

pub use closure::{DocumentReadingClosure, DocumentWritingClosure, document_reading_closure, document_writing_closure};
pub use error::ReadWriteError;
pub use timestamp::TimestampFormat;
