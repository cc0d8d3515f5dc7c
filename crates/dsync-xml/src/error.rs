use thiserror::Error;

use crate::node::NodeKind;

/// Errors from XML document operations.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The input is not a well-formed single-rooted document.
    #[error("malformed xml: {0}")]
    Malformed(String),

    /// The input bytes are not decodable text.
    #[error("xml content is not valid text at byte {offset}: {detail}")]
    Encoding { offset: usize, detail: String },

    /// A root can only be grafted onto a document or an element.
    #[error("cannot graft a document root onto a {0} node")]
    UnsupportedGraftTarget(NodeKind),

    /// The node cannot be placed or modified at the requested position.
    #[error("cannot append or modify a {0} node here")]
    InvalidChild(NodeKind),

    /// The requested element name is not a valid XML name.
    #[error("invalid element name: {0:?}")]
    InvalidName(String),

    /// Writing the serialized document failed.
    #[error("xml serialization failed: {0}")]
    Serialize(#[from] std::io::Error),
}

/// Result alias for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;
