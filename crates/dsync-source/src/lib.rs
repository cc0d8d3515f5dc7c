//! Byte sources for datastream content.
//!
//! A byte source is the external collaborator that owns persisted datastream
//! bytes. The synchronization engine only ever asks it two questions: "what
//! are the stored bytes for this datastream?" and "has this datastream ever
//! been stored?".
//!
//! # Backends
//!
//! All backends implement the [`ByteSource`] trait:
//!
//! - [`InMemoryByteSource`] -- `HashMap`-based source for tests and embedding
//!
//! # Design Rules
//!
//! 1. A fetch is a single synchronous call. Retries belong to the backend.
//! 2. Stored-but-null content is `Ok(None)`, never an error.
//! 3. Transport errors are propagated, never silently ignored.
//! 4. The source never interprets content bytes.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{SourceError, SourceResult};
pub use memory::InMemoryByteSource;
pub use traits::ByteSource;
