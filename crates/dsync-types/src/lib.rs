//! Foundation types for datastream synchronization.
//!
//! Every other `dsync` crate depends on `dsync-types`. The types here carry no
//! behavior beyond validation and formatting; caching and synchronization
//! rules live in `dsync-core`.
//!
//! # Key Types
//!
//! - [`DatastreamId`] -- Name of one content unit on a repository object
//! - [`ResourceUri`] -- Address of a datastream, used to derive graph subjects
//! - [`ContentDigest`] -- BLAKE3 digest of canonical content bytes
//! - [`SerializationFormat`] -- Wire format of graph-shaped content
//! - [`normalize_text`] -- Decoding of stored bytes into UTF-8 text

pub mod digest;
pub mod error;
pub mod format;
pub mod id;
pub mod text;

pub use digest::ContentDigest;
pub use error::TypeError;
pub use format::SerializationFormat;
pub use id::{DatastreamId, ResourceUri};
pub use text::normalize_text;
