use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use markup5ever::tendril::StrTendril;
use markup5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData};

use crate::document::XmlDocument;
use crate::error::{XmlError, XmlResult};
use crate::writer::{write_node, Quote};

/// The kind of a DOM node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    ProcessingInstruction,
    Doctype,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Element => write!(f, "element"),
            Self::Text => write!(f, "text"),
            Self::Comment => write!(f, "comment"),
            Self::ProcessingInstruction => write!(f, "processing-instruction"),
            Self::Doctype => write!(f, "doctype"),
        }
    }
}

/// Shared handle to a node in a DOM tree.
///
/// Mutations through any handle are visible through every other handle to
/// the same tree. A handle keeps the top of the tree it was taken from
/// alive: dropping a DOM node empties the child lists beneath it, so the
/// subtree would otherwise be drained once its document goes away.
#[derive(Clone)]
pub struct XmlNode {
    handle: Handle,
    _tree: Handle,
}

impl XmlNode {
    /// Wrap a raw DOM handle.
    pub fn from_handle(handle: Handle) -> Self {
        let tree = top_of(&handle);
        Self {
            handle,
            _tree: tree,
        }
    }

    /// The underlying DOM handle, for direct toolkit access.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Create a detached element with the given local name.
    pub fn element(name: &str) -> XmlResult<Self> {
        if !is_valid_name(name) {
            return Err(XmlError::InvalidName(name.to_string()));
        }
        let doc = XmlDocument::parse_str(&format!("<{name}/>"))?;
        let root = doc
            .root()
            .ok_or_else(|| XmlError::InvalidName(name.to_string()))?;
        root.detach();
        Ok(Self::from_handle(root.handle))
    }

    /// Create a detached text node.
    pub fn text_node(text: &str) -> Self {
        Self::from_handle(Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from(text)),
        }))
    }

    pub fn kind(&self) -> NodeKind {
        match &self.handle.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::Comment { .. } => NodeKind::Comment,
            NodeData::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
            NodeData::Doctype { .. } => NodeKind::Doctype,
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    pub fn is_document(&self) -> bool {
        self.kind() == NodeKind::Document
    }

    /// Local name of an element node.
    pub fn name(&self) -> Option<String> {
        match &self.handle.data {
            NodeData::Element { name, .. } => Some(name.local.to_string()),
            _ => None,
        }
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.handle.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    /// Set an unqualified attribute, replacing any existing value.
    pub fn set_attribute(&self, name: &str, value: &str) -> XmlResult<()> {
        let NodeData::Element { attrs, .. } = &self.handle.data else {
            return Err(XmlError::InvalidChild(self.kind()));
        };
        if !is_valid_name(name) {
            return Err(XmlError::InvalidName(name.to_string()));
        }
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            Some(attr) => attr.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from(value),
            }),
        }
        Ok(())
    }

    pub fn children(&self) -> Vec<XmlNode> {
        self.handle
            .children
            .borrow()
            .iter()
            .cloned()
            .map(Self::from_handle)
            .collect()
    }

    pub fn child_elements(&self) -> Vec<XmlNode> {
        self.children().into_iter().filter(Self::is_element).collect()
    }

    /// First child element with the given local name.
    pub fn first_child_element(&self, name: &str) -> Option<XmlNode> {
        self.child_elements()
            .into_iter()
            .find(|child| child.name().as_deref() == Some(name))
    }

    pub fn parent(&self) -> Option<XmlNode> {
        Self::parent_handle(&self.handle).map(Self::from_handle)
    }

    fn parent_handle(handle: &Handle) -> Option<Handle> {
        let weak = handle.parent.take();
        let parent = weak.as_ref().and_then(Weak::upgrade);
        handle.parent.set(weak);
        parent
    }

    /// Concatenated text of this node and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.handle, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&self, text: &str) -> XmlResult<()> {
        if !self.is_element() {
            return Err(XmlError::InvalidChild(self.kind()));
        }
        for child in self.children() {
            child.detach();
        }
        self.append_child(&Self::text_node(text))
    }

    /// Append `child` as the last child of this node.
    ///
    /// The child is first detached from its current parent. Appending a
    /// document node, or a node into its own subtree, is rejected.
    pub fn append_child(&self, child: &XmlNode) -> XmlResult<()> {
        if child.is_document() || child.is_ancestor_of(self) {
            return Err(XmlError::InvalidChild(child.kind()));
        }
        child.detach();
        child.handle.parent.set(Some(Rc::downgrade(&self.handle)));
        self.handle.children.borrow_mut().push(child.handle.clone());
        Ok(())
    }

    /// Create an element and append it as the last child.
    pub fn append_element(&self, name: &str) -> XmlResult<XmlNode> {
        let element = Self::element(name)?;
        self.append_child(&element)?;
        Ok(Self::from_handle(element.handle))
    }

    /// Remove this node from its parent. No-op for detached nodes.
    pub fn detach(&self) {
        let Some(parent) = self.handle.parent.take().and_then(|weak| weak.upgrade()) else {
            return;
        };
        parent
            .children
            .borrow_mut()
            .retain(|sibling| !Rc::ptr_eq(sibling, &self.handle));
    }

    /// Returns `true` if both handles point at the same node.
    pub fn same_node(&self, other: &XmlNode) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }

    fn is_ancestor_of(&self, other: &XmlNode) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.same_node(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Serialize this node. Documents serialize their children only.
    ///
    /// The output declares every namespace it uses, so a node taken from the
    /// middle of a tree serializes to a self-contained fragment.
    pub fn to_xml_string(&self) -> XmlResult<String> {
        serialize_handle(&self.handle, Quote::default())
    }
}

impl fmt::Debug for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlNode")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

pub(crate) fn serialize_handle(handle: &Handle, quote: Quote) -> XmlResult<String> {
    let mut out = Vec::new();
    write_node(handle, quote, &mut out)?;
    String::from_utf8(out).map_err(|e| XmlError::Encoding {
        offset: e.utf8_error().valid_up_to(),
        detail: "serializer produced invalid utf-8".into(),
    })
}

fn top_of(handle: &Handle) -> Handle {
    let mut top = handle.clone();
    while let Some(parent) = XmlNode::parent_handle(&top) {
        top = parent;
    }
    top
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
