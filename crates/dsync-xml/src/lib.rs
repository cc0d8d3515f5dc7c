//! Tree-shaped datastream content.
//!
//! Wraps the `xml5ever` parser and the `markup5ever_rcdom` reference-counted
//! DOM behind two small types:
//!
//! - [`XmlDocument`] -- a parsed document with at most one root element
//! - [`XmlNode`] -- a handle to any node inside a document
//!
//! Node handles are shared references: cloning an [`XmlDocument`] or an
//! [`XmlNode`] yields another handle to the *same* tree. Identity is pointer
//! identity ([`XmlDocument::same_document`]), never deep equality.
//!
//! Serialized output is canonical: no XML declaration, surrounding
//! whitespace trimmed, childless elements self-closed. Attribute quoting
//! follows the parsed text and namespace declarations are emitted on the
//! outermost element that needs them.

pub mod document;
pub mod error;
pub mod node;
mod writer;

pub use document::XmlDocument;
pub use error::{XmlError, XmlResult};
pub use node::{NodeKind, XmlNode};
