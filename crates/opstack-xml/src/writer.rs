//! Typed writes into a wire document.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use opstack_readwrite::TimestampFormat;

use crate::document::Document;
use crate::error::XmlError;
use crate::node::{NodeId, NodeInfo};
use crate::reader::MAP_ENTRY;
use crate::value::Writable;

/// A cursor that creates and fills nodes of a [`Document`].
///
/// Writing an absent value detaches the node that was created for it, so the
/// output never carries empty elements for missing members.
#[derive(Debug)]
pub struct Writer<'a> {
    doc: &'a mut Document,
    parent: Option<NodeId>,
    node: Option<NodeId>,
    info: NodeInfo,
}

impl<'a> Writer<'a> {
    /// A writer on the document root.
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

    /// The node this writer was created for.
    #[must_use]
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// The current node, `None` once detached.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Create a child node and return a writer for it.
    pub fn child(&mut self, info: impl Into<NodeInfo>) -> Writer<'_> {
        let info = info.into();
        let node = self.node.map(|node| self.doc.add_child(node, info.clone()));
        Writer {
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

    /// Set the text of the current node.
    pub fn write_value<T: Writable + ?Sized>(&mut self, value: &T) -> Result<(), XmlError> {
        if let Some(node) = self.node {
            self.doc.set_text(node, value.to_text());
        }
        Ok(())
    }

    /// Write an optional scalar; `None` removes the node.
    pub fn write<T: Writable + ?Sized>(&mut self, value: Option<&T>) -> Result<(), XmlError> {
        match value {
            Some(value) => self.write_value(value),
            None => {
                self.detach();
                Ok(())
            }
        }
    }

    /// Write an optional structure or union with `write`.
    pub fn write_with<T, F>(&mut self, value: Option<&T>, write: F) -> Result<(), XmlError>
    where
        F: FnOnce(&T, &mut Writer<'_>) -> Result<(), XmlError>,
    {
        match value {
            Some(value) => write(value, self),
            None => {
                self.detach();
                Ok(())
            }
        }
    }

    /// Write a list, nested under `member_info` children or flattened into
    /// siblings named like the current node.
    pub fn write_list<T, F>(
        &mut self,
        values: Option<&[T]>,
        member: F,
        member_info: impl Into<NodeInfo>,
        flattened: bool,
    ) -> Result<(), XmlError>
    where
        F: Fn(&T, &mut Writer<'_>) -> Result<(), XmlError>,
    {
        let Some(values) = values else {
            self.detach();
            return Ok(());
        };
        let Some((scope, info)) = self.collection_scope(flattened, || member_info.into()) else {
            return Ok(());
        };
        for value in values {
            let mut writer = self.attach(scope, &info);
            member(value, &mut writer)?;
        }
        Ok(())
    }

    /// Write a string-keyed map in key order, with `entry` wrappers or
    /// flattened into siblings named like the current node.
    pub fn write_map<V, F>(
        &mut self,
        values: Option<&HashMap<String, V>>,
        value: F,
        key_info: impl Into<NodeInfo>,
        value_info: impl Into<NodeInfo>,
        flattened: bool,
    ) -> Result<(), XmlError>
    where
        F: Fn(&V, &mut Writer<'_>) -> Result<(), XmlError>,
    {
        let Some(values) = values else {
            self.detach();
            return Ok(());
        };
        let Some((scope, entry_info)) = self.collection_scope(flattened, || NodeInfo::new(MAP_ENTRY)) else {
            return Ok(());
        };
        let key_info = key_info.into();
        let value_info = value_info.into();

        let mut keys: Vec<&String> = values.keys().collect();
        keys.sort();
        for key in keys {
            let mut entry = self.attach(scope, &entry_info);
            entry.child(key_info.clone()).write_value(key.as_str())?;
            value(&values[key], &mut entry.child(value_info.clone()))?;
        }
        Ok(())
    }

    /// Write an optional timestamp.
    pub fn write_timestamp(&mut self, value: Option<&DateTime<Utc>>, format: TimestampFormat) -> Result<(), XmlError> {
        let text = value.map(|value| format.format(value));
        self.write(text.as_deref())
    }

    /// Write optional binary data as base64.
    pub fn write_blob(&mut self, value: Option<&[u8]>) -> Result<(), XmlError> {
        let text = value.map(|value| STANDARD.encode(value));
        self.write(text.as_deref())
    }

    /// Parent for collection members and their name. Flattened collections
    /// replace the current node with siblings, so it is detached here.
    fn collection_scope(&mut self, flattened: bool, nested: impl FnOnce() -> NodeInfo) -> Option<(NodeId, NodeInfo)> {
        let node = self.node?;
        if !flattened {
            return Some((node, nested()));
        }
        let parent = self.parent?;
        self.detach();
        Some((parent, self.info.clone()))
    }

    fn attach(&mut self, parent: NodeId, info: &NodeInfo) -> Writer<'_> {
        let node = self.doc.add_child(parent, info.clone());
        Writer {
            doc: &mut *self.doc,
            parent: Some(parent),
            node: Some(node),
            info: info.clone(),
        }
    }
}
