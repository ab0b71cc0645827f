//! Arena-backed wire document tree.
//!
//! Nodes live in a single `Vec` owned by the [`Document`]; parents own their
//! children through index lists and children point back with a plain index,
//! so detaching a node is a list removal plus clearing that index.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::XmlError;
use crate::node::{Namespace, Node, NodeId, NodeInfo, NodeLocation};

/// A mutable tree of named, namespaced nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document with a single root element.
    #[must_use]
    pub fn new(root: NodeInfo) -> Self {
        Self {
            nodes: vec![Node::new(root, None)],
            root: NodeId(0),
        }
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Create a detached node.
    pub fn create(&mut self, info: NodeInfo) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(info, None));
        id
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere.
    ///
    /// A namespace already declared by `parent` or any of its ancestors is
    /// dropped from the child. Fails with [`XmlError::CyclicMove`] when
    /// `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), XmlError> {
        if self.ancestors(parent).any(|id| id == child) {
            return Err(XmlError::CyclicMove);
        }
        self.link(parent, child);
        Ok(())
    }

    /// Create a node and append it to `parent`.
    pub fn add_child(&mut self, parent: NodeId, info: NodeInfo) -> NodeId {
        let id = self.create(info);
        // A fresh node has no descendants.
        self.link(parent, id);
        id
    }

    /// `id` followed by each of its ancestors up to the root.
    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |current| self.nodes[current.0].parent)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let inherited = self.nodes[child.0]
            .info
            .namespace
            .as_ref()
            .is_some_and(|ns| self.namespace_in_scope(parent, ns));
        if inherited {
            self.nodes[child.0].info.namespace = None;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Remove `id` from its parent's children and clear its parent link.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Children of `parent` that match `info`, in document order.
    pub fn children_matching<'a>(&'a self, parent: NodeId, info: &'a NodeInfo) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .filter(move |child| self.nodes[child.0].info.matches(info))
    }

    /// First child of `parent` that matches `info`.
    #[must_use]
    pub fn first_child(&self, parent: NodeId, info: &NodeInfo) -> Option<NodeId> {
        self.children_matching(parent, info).next()
    }

    /// Text of a node: the value of an attribute or text node, or the
    /// concatenated text children of an element.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.info.location {
            NodeLocation::Element => node
                .children
                .iter()
                .map(|child| self.node(*child))
                .filter(|child| child.info.location == NodeLocation::Text)
                .filter_map(Node::content)
                .collect(),
            NodeLocation::Attribute | NodeLocation::Text => node.content.clone().unwrap_or_default(),
        }
    }

    /// Replace the text of a node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let text = text.into();
        if self.nodes[id.0].info.location != NodeLocation::Element {
            self.nodes[id.0].content = Some(text);
            return;
        }
        let stale: Vec<NodeId> = self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|child| self.nodes[child.0].info.location == NodeLocation::Text)
            .collect();
        for child in stale {
            self.detach(child);
        }
        let child = self.add_child(id, NodeInfo::text());
        self.nodes[child.0].content = Some(text);
    }

    fn namespace_in_scope(&self, from: NodeId, namespace: &Namespace) -> bool {
        self.ancestors(from)
            .any(|id| self.nodes[id.0].info.namespace.as_ref() == Some(namespace))
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    /// Parse an XML document.
    ///
    /// Attributes become attribute children, character data and CDATA become
    /// text children, and whitespace between child elements is dropped. An
    /// element keeps its name prefix. The declaration binding that prefix
    /// becomes the node namespace; other declarations are kept as `xmlns`
    /// attribute children.
    pub fn parse(data: &[u8]) -> Result<Self, XmlError> {
        let mut reader = quick_xml::Reader::from_reader(data);
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let mut stack: Vec<NodeId> = Vec::new();
        let mut has_root = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = doc.open_element(&e, stack.last().copied(), &mut has_root)?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    doc.open_element(&e, stack.last().copied(), &mut has_root)?;
                }
                Event::End(_) => {
                    if let Some(id) = stack.pop() {
                        doc.drop_indentation(id);
                    }
                }
                Event::Text(e) => {
                    let decoded = e.decode().map_err(XmlError::encoding)?;
                    let text = quick_xml::escape::unescape(&decoded).map_err(XmlError::encoding)?;
                    doc.push_text(stack.last().copied(), &text)?;
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(&e).map_err(XmlError::encoding)?;
                    doc.push_text(stack.last().copied(), text)?;
                }
                Event::GeneralRef(e) => {
                    let name = e.decode().map_err(XmlError::encoding)?;
                    let resolved = resolve_entity(&name)?;
                    doc.push_text(stack.last().copied(), &resolved)?;
                }
                Event::Eof => break,
                // Declaration, comments, processing instructions, doctype.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element at end of input".to_owned()));
        }
        if !has_root {
            return Err(XmlError::MissingRoot);
        }
        Ok(doc)
    }

    fn open_element(
        &mut self,
        start: &BytesStart<'_>,
        parent: Option<NodeId>,
        has_root: &mut bool,
    ) -> Result<NodeId, XmlError> {
        let name = utf8(start.local_name().as_ref())?.to_owned();
        let prefix = match start.name().prefix() {
            Some(prefix) => utf8(prefix.as_ref())?.to_owned(),
            None => String::new(),
        };

        let mut declared = Vec::new();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = utf8(attr.key.as_ref())?;
            let raw = utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw)
                .map_err(XmlError::encoding)?
                .into_owned();
            if key == "xmlns" {
                declared.push(Namespace::default_namespace(value));
            } else if let Some(declared_prefix) = key.strip_prefix("xmlns:") {
                declared.push(Namespace::new(declared_prefix, value));
            } else {
                attributes.push((key.to_owned(), value));
            }
        }

        // Prefer the declaration that binds the element's own prefix.
        let index = declared.iter().position(|ns| ns.prefix == prefix).unwrap_or(0);
        let mut info = NodeInfo::new(name);
        info.namespace = (index < declared.len()).then(|| declared.remove(index));
        let extra = declared
            .into_iter()
            .map(|ns| (ns.attribute_name(), ns.uri));
        attributes.splice(0..0, extra);

        let id = self.create(info);
        self.nodes[id.0].prefix = (!prefix.is_empty()).then_some(prefix);
        match parent {
            Some(parent) => self.link(parent, id),
            None => {
                if *has_root {
                    return Err(XmlError::Malformed("multiple root elements".to_owned()));
                }
                *has_root = true;
                self.root = id;
            }
        }
        for (key, value) in attributes {
            let attribute = self.add_child(id, NodeInfo::attribute(key));
            self.nodes[attribute.0].content = Some(value);
        }
        Ok(id)
    }

    fn push_text(&mut self, parent: Option<NodeId>, text: &str) -> Result<(), XmlError> {
        let Some(parent) = parent else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(XmlError::Malformed("text outside the root element".to_owned()));
        };
        let last_text = self.nodes[parent.0]
            .children
            .last()
            .copied()
            .filter(|last| self.nodes[last.0].info.location == NodeLocation::Text);
        match last_text {
            Some(last) => self.nodes[last.0].content.get_or_insert_with(String::new).push_str(text),
            None => {
                let child = self.add_child(parent, NodeInfo::text());
                self.nodes[child.0].content = Some(text.to_owned());
            }
        }
        Ok(())
    }

    fn drop_indentation(&mut self, id: NodeId) {
        let children = &self.nodes[id.0].children;
        let has_elements = children
            .iter()
            .any(|child| self.nodes[child.0].info.location == NodeLocation::Element);
        if !has_elements {
            return;
        }
        let blank: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|child| {
                let node = &self.nodes[child.0];
                node.info.location == NodeLocation::Text && node.content.as_deref().is_none_or(|t| t.trim().is_empty())
            })
            .collect();
        for child in blank {
            self.detach(child);
        }
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Serialize the tree reachable from the root. No XML declaration is
    /// emitted; detached nodes are not written.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut buf = Vec::with_capacity(256);
        let mut writer = quick_xml::Writer::new(&mut buf);
        self.write_element(&mut writer, self.root)?;
        Ok(buf)
    }

    fn write_element<W: Write>(&self, writer: &mut quick_xml::Writer<W>, id: NodeId) -> Result<(), XmlError> {
        let node = self.node(id);
        let name = node.qualified_name();
        let mut start = BytesStart::new(name.as_ref());
        if let Some(ns) = &node.info.namespace {
            start.push_attribute((ns.attribute_name().as_str(), ns.uri.as_str()));
        }

        let mut has_body = false;
        for child in &node.children {
            let child = self.node(*child);
            if child.info.location == NodeLocation::Attribute {
                start.push_attribute((child.info.name.as_str(), child.content.as_deref().unwrap_or("")));
            } else {
                has_body = true;
            }
        }

        if !has_body {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &node.children {
            let child_node = self.node(*child);
            match child_node.info.location {
                NodeLocation::Element => self.write_element(writer, *child)?,
                NodeLocation::Text => {
                    let text = child_node.content.as_deref().unwrap_or("");
                    writer.write_event(Event::Text(BytesText::new(text)))?;
                }
                NodeLocation::Attribute => {}
            }
        }
        writer.write_event(Event::End(BytesEnd::new(name.as_ref())))?;
        Ok(())
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(XmlError::encoding)
}

/// Resolve a character reference or one of the predefined entities.
fn resolve_entity(name: &str) -> Result<String, XmlError> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => code.parse::<u32>(),
        };
        return value
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| XmlError::Encoding(format!("invalid character reference &{name};")));
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return Err(XmlError::Encoding(format!("unknown entity &{name};"))),
    };
    Ok(resolved.to_owned())
}
