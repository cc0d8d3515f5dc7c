use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("datastream id must not be empty")]
    EmptyId,

    #[error("datastream id contains whitespace: {0:?}")]
    InvalidId(String),

    #[error("resource uri must not be empty")]
    EmptyUri,

    #[error("unknown serialization format: {0}")]
    UnknownFormat(String),

    #[error("content is not valid text at byte {offset}: {detail}")]
    Encoding { offset: usize, detail: String },
}
