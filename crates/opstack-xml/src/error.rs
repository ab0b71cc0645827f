//! XML reading and writing errors.

use std::io;

use opstack_readwrite::ReadWriteError;

/// Errors that can occur while building, parsing, or binding a wire document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Names or text that are not valid UTF-8 or contain bad escapes.
    #[error("XML encoding error: {0}")]
    Encoding(String),

    /// The document has no root element.
    #[error("XML document has no root element")]
    MissingRoot,

    /// The document root is not the expected element.
    #[error("unexpected root element '{found}', expected '{expected}'")]
    UnexpectedRoot {
        /// The expected root name.
        expected: String,
        /// The root name found in the document.
        found: String,
    },

    /// A node cannot be moved under itself or one of its descendants.
    #[error("cannot move node under itself or its descendant")]
    CyclicMove,

    /// The document structure is invalid.
    #[error("malformed XML document: {0}")]
    Malformed(String),

    /// A value could not be bound to its type.
    #[error(transparent)]
    Value(#[from] ReadWriteError),
}

impl XmlError {
    /// A required node is absent.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Value(ReadWriteError::MissingValue(name.into()))
    }

    pub(crate) fn encoding(err: impl std::fmt::Display) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<XmlError> for ReadWriteError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Value(inner) => inner,
            XmlError::Io(inner) => Self::Write(inner.to_string()),
            other => Self::Malformed(other.to_string()),
        }
    }
}
