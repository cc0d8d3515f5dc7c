//! Graph-shaped datastream content.
//!
//! A datastream's graph is a set of statements plus one primary subject
//! ([`RdfResource`]). Statements are held in a sophia ordered set graph, so
//! sophia's `Graph`/`MutableGraph` APIs work on it directly; parsing and
//! serialization go through [`codec`].
//!
//! # Key Types
//!
//! - [`Term`] -- owned `SimpleTerm`: IRI, blank node or literal
//! - [`Graph`] -- Deduplicated, deterministically ordered statement set
//! - [`RdfResource`] -- A graph anchored on a [`PrimarySubject`]

pub mod codec;
pub mod error;
pub mod graph;
pub mod resource;
pub mod term;

pub use error::{RdfError, RdfResult};
pub use graph::{Graph, Triple};
pub use resource::{PrimarySubject, RdfResource};
pub use term::{IntoObject, Term};
