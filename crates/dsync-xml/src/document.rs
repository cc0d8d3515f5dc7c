use std::fmt;
use std::rc::Rc;

use dsync_types::{normalize_text, TypeError};
use markup5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};
use tracing::debug;
use xml5ever::driver::{parse_document, XmlParseOpts};

use crate::error::{XmlError, XmlResult};
use crate::node::{serialize_handle, NodeKind, XmlNode};
use crate::writer::Quote;

/// A parsed XML document with at most one root element.
///
/// Cloning yields another handle to the same document. Serialization keeps
/// the attribute quoting of the parsed text.
#[derive(Clone)]
pub struct XmlDocument {
    document: Handle,
    quote: Quote,
}

impl XmlDocument {
    fn from_handle(document: Handle) -> Self {
        Self {
            document,
            quote: Quote::default(),
        }
    }

    /// A document with no root element.
    pub fn empty() -> Self {
        Self::from_handle(Node::new(NodeData::Document))
    }

    /// Decode and parse raw bytes.
    ///
    /// Blank input yields an empty document. A UTF-8 or UTF-16 byte order
    /// mark is honoured; anything else must be valid UTF-8.
    pub fn parse(bytes: &[u8]) -> XmlResult<Self> {
        let text = normalize_text(bytes).map_err(|e| match e {
            TypeError::Encoding { offset, detail } => XmlError::Encoding { offset, detail },
            other => XmlError::Malformed(other.to_string()),
        })?;
        Self::parse_str(&text)
    }

    /// Parse a document from text.
    pub fn parse_str(text: &str) -> XmlResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        let dom: RcDom = parse_document(RcDom::default(), XmlParseOpts::default()).one(text);
        if !dom.errors.is_empty() {
            return Err(XmlError::Malformed(dom.errors.join("; ")));
        }
        let doc = Self {
            document: dom.document,
            quote: Quote::detect(text),
        };
        doc.normalize_top_level()?;
        debug!(root = ?doc.root().and_then(|r| r.name()), "parsed xml document");
        Ok(doc)
    }

    /// Parse a template such as `<xml/>`.
    pub fn from_template(template: &str) -> XmlResult<Self> {
        Self::parse_str(template)
    }

    /// Wrap a node as a full document.
    ///
    /// A document node is adopted as-is; any other node is serialized and
    /// re-parsed, so the result does not share nodes with the source tree.
    pub fn from_fragment(node: &XmlNode) -> XmlResult<Self> {
        if node.is_document() {
            let doc = Self::from_handle(node.handle().clone());
            doc.normalize_top_level()?;
            return Ok(doc);
        }
        Self::parse_str(&node.to_xml_string()?)
    }

    // Drop the declaration and whitespace between top-level nodes, then
    // check that what remains has a single root and no stray text.
    fn normalize_top_level(&self) -> XmlResult<()> {
        let mut roots = 0;
        for child in self.document.children.borrow().iter() {
            match &child.data {
                NodeData::Element { .. } => roots += 1,
                NodeData::Text { contents } if !contents.borrow().trim().is_empty() => {
                    return Err(XmlError::Malformed(
                        "text outside the root element".into(),
                    ));
                }
                _ => {}
            }
        }
        if roots > 1 {
            return Err(XmlError::Malformed(format!(
                "expected one root element, found {roots}"
            )));
        }
        self.document
            .children
            .borrow_mut()
            .retain(|child| match &child.data {
                NodeData::ProcessingInstruction { target, .. } => &**target != "xml",
                NodeData::Text { .. } => false,
                _ => true,
            });
        Ok(())
    }

    /// The root element, if any.
    pub fn root(&self) -> Option<XmlNode> {
        self.document
            .children
            .borrow()
            .iter()
            .find(|child| matches!(child.data, NodeData::Element { .. }))
            .cloned()
            .map(XmlNode::from_handle)
    }

    pub fn has_root(&self) -> bool {
        self.root().is_some()
    }

    /// Replace the root element with `node`.
    pub fn set_root(&self, node: &XmlNode) -> XmlResult<()> {
        if !node.is_element() {
            return Err(XmlError::InvalidChild(node.kind()));
        }
        if let Some(current) = self.root() {
            if current.same_node(node) {
                return Ok(());
            }
            current.detach();
        }
        self.as_node().append_child(node)
    }

    /// The document node itself.
    pub fn as_node(&self) -> XmlNode {
        XmlNode::from_handle(self.document.clone())
    }

    /// Canonical serialization: no declaration, surrounding whitespace
    /// trimmed, childless elements self-closed.
    pub fn to_xml_string(&self) -> XmlResult<String> {
        let raw = serialize_handle(&self.document, self.quote)?;
        Ok(raw.trim().to_string())
    }

    pub fn to_bytes(&self) -> XmlResult<Vec<u8>> {
        Ok(self.to_xml_string()?.into_bytes())
    }

    /// Returns `true` if both handles refer to the same document.
    pub fn same_document(&self, other: &XmlDocument) -> bool {
        Rc::ptr_eq(&self.document, &other.document)
    }

    /// Move this document's root onto `target`.
    ///
    /// A document target receives it under its own root element, or as its
    /// root when it has none. An element target receives it as the last
    /// child. Any other node kind is rejected.
    pub fn graft_root_onto(&self, target: &XmlNode) -> XmlResult<()> {
        let Some(root) = self.root() else {
            return Ok(());
        };
        match target.kind() {
            NodeKind::Document => {
                let target_doc = XmlDocument::from_handle(target.handle().clone());
                if target_doc.same_document(self) {
                    return Ok(());
                }
                match target_doc.root() {
                    Some(target_root) => target_root.append_child(&root),
                    None => target.append_child(&root),
                }
            }
            NodeKind::Element => target.append_child(&root),
            other => Err(XmlError::UnsupportedGraftTarget(other)),
        }
    }

    /// Returns `true` if there is no root, or the root carries no
    /// attributes, no child elements and no non-whitespace text.
    pub fn is_empty(&self) -> bool {
        match self.root() {
            None => true,
            Some(root) => {
                let no_attrs = match &root.handle().data {
                    NodeData::Element { attrs, .. } => attrs.borrow().is_empty(),
                    _ => true,
                };
                no_attrs && root.child_elements().is_empty() && root.text().trim().is_empty()
            }
        }
    }

    /// An independent copy of this document.
    pub fn deep_clone(&self) -> XmlResult<Self> {
        Self::parse_str(&self.to_xml_string()?)
    }
}

impl fmt::Debug for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlDocument")
            .field("root", &self.root().and_then(|r| r.name()))
            .finish()
    }
}
