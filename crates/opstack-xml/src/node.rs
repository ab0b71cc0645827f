//! Wire document node identity.

use std::borrow::Cow;
use std::fmt;

/// Where a node sits inside its parent element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeLocation {
    /// A child element.
    #[default]
    Element,
    /// An attribute of the parent element.
    Attribute,
    /// Character data of the parent element.
    Text,
}

/// An XML namespace declaration. An empty prefix is the default namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// The prefix, empty for `xmlns="..."`.
    pub prefix: String,
    /// The namespace URI.
    pub uri: String,
}

impl Namespace {
    /// Create a namespace declaration.
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// A default namespace (`xmlns="uri"`).
    pub fn default_namespace(uri: impl Into<String>) -> Self {
        Self::new("", uri)
    }

    /// The attribute that declares this namespace.
    #[must_use]
    pub fn attribute_name(&self) -> String {
        if self.prefix.is_empty() {
            "xmlns".to_owned()
        } else {
            format!("xmlns:{}", self.prefix)
        }
    }
}

/// Identifies a node: name, location, and optional namespace.
///
/// Lookups match on name and location only; the namespace is a write-side
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodeInfo {
    /// Element or attribute name. Empty for text nodes.
    pub name: String,
    /// Where the node sits.
    pub location: NodeLocation,
    /// Namespace declared on the node.
    pub namespace: Option<Namespace>,
}

impl NodeInfo {
    /// An element node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: NodeLocation::Element,
            namespace: None,
        }
    }

    /// An attribute node.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: NodeLocation::Attribute,
            namespace: None,
        }
    }

    /// A text node.
    #[must_use]
    pub fn text() -> Self {
        Self {
            name: String::new(),
            location: NodeLocation::Text,
            namespace: None,
        }
    }

    /// Attach a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Whether `other` names the same node.
    #[must_use]
    pub fn matches(&self, other: &NodeInfo) -> bool {
        self.location == other.location && self.name == other.name
    }
}

impl From<&str> for NodeInfo {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeInfo {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            NodeLocation::Element => f.write_str(&self.name),
            NodeLocation::Attribute => write!(f, "@{}", self.name),
            NodeLocation::Text => f.write_str("#text"),
        }
    }
}

/// Index of a node inside its [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One element, attribute, or text unit of a wire document.
///
/// Children are owned through the document arena; `parent` is a plain index
/// back to the owning element and is cleared on detach.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) info: NodeInfo,
    pub(crate) content: Option<String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prefix: Option<String>,
}

impl Node {
    pub(crate) fn new(info: NodeInfo, content: Option<String>) -> Self {
        Self {
            info,
            content,
            children: Vec::new(),
            parent: None,
            prefix: None,
        }
    }

    /// Name, location, and namespace of the node.
    #[must_use]
    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    /// Value of an attribute or text node.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Ordered children.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The owning element, `None` for the root and for detached nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The name prefix a parsed element was written with.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The element name as written, including its prefix.
    #[must_use]
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.info.name)),
            None => Cow::Borrowed(&self.info.name),
        }
    }
}
