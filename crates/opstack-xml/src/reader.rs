//! Typed reads over a wire document.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use opstack_readwrite::{ReadWriteError, TimestampFormat};

use crate::document::Document;
use crate::error::XmlError;
use crate::node::{NodeId, NodeInfo};
use crate::value::Readable;

/// Wrapper element of a non-flattened map entry.
pub const MAP_ENTRY: &str = "entry";

/// A cursor positioned on one node of a [`Document`].
///
/// The node may be absent: descending into a missing child yields a reader
/// whose reads return `None`, so optional members need no special casing.
#[derive(Debug)]
pub struct Reader<'a> {
    doc: &'a mut Document,
    parent: Option<NodeId>,
    node: Option<NodeId>,
    info: NodeInfo,
}

impl<'a> Reader<'a> {
    /// A reader on the document root.
    pub fn new(doc: &'a mut Document) -> Self {
        let root = doc.root();
        let info = doc.node(root).info().clone();
        Self {
            doc,
            parent: None,
            node: Some(root),
            info,
        }
    }

    /// The node this reader was created for.
    #[must_use]
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// The current node, if present.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Whether the node is present in the document.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.node.is_some()
    }

    /// Descend to the first child matching `info`.
    pub fn child(&mut self, info: impl Into<NodeInfo>) -> Reader<'_> {
        let info = info.into();
        let node = self.node.and_then(|node| self.doc.first_child(node, &info));
        Reader {
            doc: &mut *self.doc,
            parent: self.node,
            node,
            info,
        }
    }

    /// Remove the current node from the document.
    pub fn detach(&mut self) {
        if let Some(node) = self.node.take() {
            self.doc.detach(node);
        }
    }

    /// Text of the current node.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.node.map(|node| self.doc.text(node))
    }

    /// Read a required scalar.
    pub fn value<T: Readable>(&self) -> Result<T, XmlError> {
        let text = self.text().ok_or_else(|| XmlError::missing(self.info.to_string()))?;
        Ok(T::from_text(&text)?)
    }

    /// Read an optional scalar.
    pub fn read<T: Readable>(&mut self) -> Result<Option<T>, XmlError> {
        let value = self.text().map(|text| T::from_text(&text)).transpose()?;
        Ok(value)
    }

    /// Read a structure or union with `read`, or `None` if absent.
    pub fn read_with<T, F>(&mut self, read: F) -> Result<Option<T>, XmlError>
    where
        F: FnOnce(&mut Reader<'_>) -> Result<T, XmlError>,
    {
        if self.node.is_none() {
            return Ok(None);
        }
        read(self).map(Some)
    }

    /// Read a list.
    ///
    /// A nested list reads every `member_info` child of the current node. A
    /// flattened list has no wrapper: every sibling named like the current
    /// node is a member.
    pub fn read_list<T, F>(
        &mut self,
        member: F,
        member_info: impl Into<NodeInfo>,
        flattened: bool,
    ) -> Result<Option<Vec<T>>, XmlError>
    where
        F: Fn(&mut Reader<'_>) -> Result<T, XmlError>,
    {
        let Some((scope, info)) = self.collection_scope(flattened, || member_info.into()) else {
            return Ok(None);
        };
        let members: Vec<NodeId> = self.doc.children_matching(scope, &info).collect();
        if flattened && members.is_empty() {
            return Ok(None);
        }

        let mut values = Vec::with_capacity(members.len());
        for id in members {
            let mut reader = Reader {
                doc: &mut *self.doc,
                parent: Some(scope),
                node: Some(id),
                info: info.clone(),
            };
            values.push(member(&mut reader)?);
        }
        Ok(Some(values))
    }

    /// Read a string-keyed map.
    ///
    /// Nested maps wrap each pair in an `entry` element; flattened maps use
    /// siblings named like the current node as entries.
    pub fn read_map<V, F>(
        &mut self,
        value: F,
        key_info: impl Into<NodeInfo>,
        value_info: impl Into<NodeInfo>,
        flattened: bool,
    ) -> Result<Option<HashMap<String, V>>, XmlError>
    where
        F: Fn(&mut Reader<'_>) -> Result<V, XmlError>,
    {
        let Some((scope, entry_info)) = self.collection_scope(flattened, || NodeInfo::new(MAP_ENTRY)) else {
            return Ok(None);
        };
        let entries: Vec<NodeId> = self.doc.children_matching(scope, &entry_info).collect();
        if flattened && entries.is_empty() {
            return Ok(None);
        }

        let key_info = key_info.into();
        let value_info = value_info.into();
        let mut map = HashMap::with_capacity(entries.len());
        for id in entries {
            let mut entry = Reader {
                doc: &mut *self.doc,
                parent: Some(scope),
                node: Some(id),
                info: entry_info.clone(),
            };
            let key: String = entry.child(key_info.clone()).value()?;
            let item = value(&mut entry.child(value_info.clone()))?;
            map.insert(key, item);
        }
        Ok(Some(map))
    }

    /// Read an optional timestamp.
    pub fn read_timestamp(&mut self, format: TimestampFormat) -> Result<Option<DateTime<Utc>>, XmlError> {
        let value = self.text().map(|text| format.parse(&text)).transpose()?;
        Ok(value)
    }

    /// Read optional base64 binary data.
    pub fn read_blob(&mut self) -> Result<Option<Vec<u8>>, XmlError> {
        let Some(text) = self.text() else {
            return Ok(None);
        };
        let data = STANDARD
            .decode(text.trim())
            .map_err(|_| ReadWriteError::invalid(text, "base64 blob"))?;
        Ok(Some(data))
    }

    /// Node whose children hold a collection, and the name of those children.
    fn collection_scope(&self, flattened: bool, nested: impl FnOnce() -> NodeInfo) -> Option<(NodeId, NodeInfo)> {
        if flattened {
            self.node?;
            self.parent.map(|parent| (parent, self.info.clone()))
        } else {
            self.node.map(|node| (node, nested()))
        }
    }
}
