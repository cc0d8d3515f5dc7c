//! Datastream content synchronization.
//!
//! A [`Datastream`] exposes one content unit two ways at once: as bytes
//! owned by a [`ByteSource`](dsync_source::ByteSource), and as a structured
//! value built from those bytes on first touch. This crate holds the rules
//! that keep the two in step:
//!
//! - **Loading** is lazy. Nothing is fetched until bytes or the structured
//!   value are asked for, and then only once per load.
//! - **Change detection** never fetches. Tree datastreams trust a dirty
//!   flag; graph datastreams re-serialize and compare against the digest of
//!   the bytes they were loaded from.
//! - **Writes** are compared in canonical form. Writing content equal to the
//!   current content records nothing.
//! - **Identity** is preserved: a graph's primary subject is derived from
//!   the datastream address once and never changes unless set explicitly.
//!
//! # Variants
//!
//! | Alias | Representation | Change policy |
//! |---|---|---|
//! | [`TreeDatastream`] | [`XmlDocument`](dsync_xml::XmlDocument) | dirty flag |
//! | [`GraphDatastream`] | [`RdfResource`](dsync_rdf::RdfResource) | re-serialize |
//!
//! Per-type behavior comes from a [`DatastreamProfile`], built in code or
//! from TOML via [`ProfileConfig`].

pub mod cache;
pub mod config;
pub mod datastream;
pub mod error;
pub mod graph;
pub mod representation;
pub mod state;
pub mod subject;
pub mod tree;

pub use cache::ContentCache;
pub use config::{
    DatastreamProfile, Decorator, GraphOptions, ProfileConfig, PropertyConfig, RootBuilder,
    TreeOptions,
};
pub use datastream::Datastream;
pub use error::{DatastreamError, DatastreamResult};
pub use graph::{GraphDatastream, UpdateSummary};
pub use representation::{Assignment, ChangePolicy, LoadContext, Representation};
pub use state::CacheState;
pub use subject::SubjectResolver;
pub use tree::TreeDatastream;
