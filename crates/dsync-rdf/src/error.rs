use thiserror::Error;

/// Errors from graph parsing and serialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RdfError {
    #[error("malformed graph content: {0}")]
    Malformed(String),

    #[error("graph content is not valid text at byte {offset}: {detail}")]
    Encoding { offset: usize, detail: String },

    #[error("graph serialization failed: {0}")]
    Serialize(String),

    /// Relative or malformed IRIs cannot be written in any format.
    #[error("not an absolute IRI: {0:?}")]
    InvalidIri(String),

    #[error("invalid language tag: {0:?}")]
    InvalidLanguageTag(String),

    /// Quoted triples and variables have no place in datastream content.
    #[error("unsupported term: {0}")]
    UnsupportedTerm(String),
}

/// Result alias for graph operations.
pub type RdfResult<T> = Result<T, RdfError>;
