use dsync_source::SourceError;
use dsync_types::DatastreamId;
use thiserror::Error;

/// Errors surfaced by datastream operations.
///
/// A failing operation never leaves a partially updated cache behind.
#[derive(Debug, Error)]
pub enum DatastreamError {
    #[error("datastream {dsid}: malformed content: {reason}")]
    MalformedContent { dsid: DatastreamId, reason: String },

    #[error("unsupported assignment: expected {expected}, raw bytes, a string or a fragment")]
    UnsupportedAssignment { expected: &'static str },

    #[error("unsupported graft target: {0}")]
    UnsupportedGraftTarget(String),

    #[error("datastream {dsid}: no serialization format configured")]
    FormatNotConfigured { dsid: DatastreamId },

    #[error("datastream {dsid}: content is not valid text at byte {offset}: {detail}")]
    EncodingError {
        dsid: DatastreamId,
        offset: usize,
        detail: String,
    },

    #[error("datastream {dsid} is frozen")]
    FrozenStateViolation { dsid: DatastreamId },

    #[error("datastream {dsid}: unknown field {field:?}")]
    UnknownField { dsid: DatastreamId, field: String },

    #[error("datastream {dsid}: serialization failed: {reason}")]
    Serialization { dsid: DatastreamId, reason: String },

    #[error("byte source error: {0}")]
    Source(#[from] SourceError),

    #[error("invalid profile configuration: {0}")]
    Config(String),
}

/// Result alias for datastream operations.
pub type DatastreamResult<T> = Result<T, DatastreamError>;
